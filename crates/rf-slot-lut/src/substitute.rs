//! Criteria substitution
//!
//! Swaps the economics of one criteria (typically `freegame`) in a base
//! table for those of a separately optimized bonus table. The base table
//! keeps the criteria's RTP contribution `C`: with `E` the mean win per
//! entry in the bonus table, the criteria needs entry probability
//! `H = C·cost / E`, so its rows receive a total mass of `H·W` (W the base
//! table's total weight) shaped by the bonus weights. The mass difference
//! is absorbed by the base table's remaining zero-payout rows, keeping the
//! total weight fixed.

use crate::error::{LutError, Result};
use crate::optimizer::{apportion, rtp_matches};
use crate::table::{LookupTable, SegmentedTable};

/// Outcome of a successful substitution
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub weights: Vec<u64>,
    /// Criteria RTP contribution kept from the base table
    pub contribution: f64,
    /// Mean win per criteria entry in the bonus table
    pub mean_win: f64,
    /// Entry probability needed to keep the contribution
    pub target_hit_rate: f64,
    /// Entry probability after integer rounding
    pub hit_rate: f64,
    pub rtp_before: f64,
    pub rtp_after: f64,
}

/// Row indices of `table` whose simulation ran for `criteria`, in table order
fn criteria_rows(table: &LookupTable, segments: &SegmentedTable, criteria: &str) -> Vec<usize> {
    let by_id = segments.criteria_by_id();
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| by_id.get(&row.id) == Some(&criteria))
        .map(|(index, _)| index)
        .collect()
}

pub fn substitute_criteria(
    base: &LookupTable,
    base_segments: &SegmentedTable,
    bonus: &LookupTable,
    bonus_segments: &SegmentedTable,
    criteria: &str,
    cost: f64,
) -> Result<Substitution> {
    let fault = |reason: String| LutError::Criteria {
        criteria: criteria.to_string(),
        reason,
    };

    let base_rows = criteria_rows(base, base_segments, criteria);
    let bonus_rows = criteria_rows(bonus, bonus_segments, criteria);
    if base_rows.is_empty() || bonus_rows.is_empty() {
        return Err(LutError::MissingCriteria(criteria.to_string()));
    }
    if base_rows.len() != bonus_rows.len() {
        return Err(fault(format!(
            "payout arrays differ in length: {} vs {}",
            base_rows.len(),
            bonus_rows.len()
        )));
    }
    for (&b, &o) in base_rows.iter().zip(&bonus_rows) {
        let (b, o) = (&base.rows()[b], &bonus.rows()[o]);
        if (b.payout - o.payout).abs() > 1e-9 {
            return Err(fault(format!(
                "payout arrays must be identical: id {} pays {}, id {} pays {}",
                b.id, b.payout, o.id, o.payout
            )));
        }
    }

    let total = base.total_weight();
    if total == 0 {
        return Err(LutError::ZeroWeight);
    }
    let rtp_before = base.rtp(cost)?;

    let criteria_payout: f64 = base_rows
        .iter()
        .map(|&i| base.rows()[i].weight as f64 * base.rows()[i].payout)
        .sum();
    let contribution = criteria_payout / total as f64 / cost;

    let bonus_weights: Vec<u64> = bonus_rows.iter().map(|&i| bonus.rows()[i].weight).collect();
    let bonus_mass: u64 = bonus_weights.iter().sum();
    if bonus_mass == 0 {
        return Err(fault("bonus table carries no weight".into()));
    }
    let mean_win = bonus_rows
        .iter()
        .map(|&i| bonus.rows()[i].weight as f64 * bonus.rows()[i].payout)
        .sum::<f64>()
        / bonus_mass as f64;
    if mean_win <= 0.0 {
        return Err(fault("bonus table has zero mean win".into()));
    }

    let target_hit_rate = contribution * cost / mean_win;
    let new_mass = (target_hit_rate * total as f64).round() as u64;
    let old_mass: u64 = base_rows.iter().map(|&i| base.rows()[i].weight).sum();

    let zero_rows: Vec<usize> = base
        .rows()
        .iter()
        .enumerate()
        .filter(|(index, row)| !row.is_paying() && !base_rows.contains(index))
        .map(|(index, _)| index)
        .collect();
    let zero_weights: Vec<u64> = zero_rows.iter().map(|&i| base.rows()[i].weight).collect();
    let zero_mass: u64 = zero_weights.iter().sum();

    let absorbed = zero_mass as i128 + old_mass as i128 - new_mass as i128;
    if absorbed < 0 || (zero_mass == 0 && absorbed != 0) {
        return Err(fault(format!(
            "zero-payout rows ({zero_mass}) cannot absorb a criteria mass change from {old_mass} to {new_mass}"
        )));
    }

    let mut weights = base.weights();
    for (&index, part) in base_rows.iter().zip(apportion(new_mass, &bonus_weights)) {
        weights[index] = part;
    }
    for (&index, part) in zero_rows.iter().zip(apportion(absorbed as u64, &zero_weights)) {
        weights[index] = part;
    }

    let rtp_after = base.with_weights(&weights)?.rtp(cost)?;
    if !rtp_matches(rtp_before, rtp_after) {
        return Err(LutError::RtpMismatch {
            before: rtp_before,
            after: rtp_after,
        });
    }
    log::info!(
        "substituted '{}': contribution {:.4}, mean win {:.3}x, hit rate 1 in {:.1}",
        criteria,
        contribution,
        mean_win,
        total as f64 / new_mass.max(1) as f64
    );

    Ok(Substitution {
        weights,
        contribution,
        mean_win,
        target_hit_rate,
        hit_rate: new_mass as f64 / total as f64,
        rtp_before,
        rtp_after,
    })
}
