//! Losing-weight redistribution
//!
//! Reshapes the zero-payout mass of a table without touching any paying
//! row. The total zero-payout weight is kept exactly (largest remainder
//! apportionment), so the table's total weight and therefore its RTP do
//! not move; the two-decimal RTP comparison after the fact is the guard
//! that decides whether the result may be written back.

use crate::error::{LutError, Result};
use crate::table::LookupTable;

/// Outcome of a successful optimization
#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    pub weights: Vec<u64>,
    pub rtp_before: f64,
    pub rtp_after: f64,
}

/// Split `total` into integer parts proportional to `weights`.
///
/// Parts sum to `total` exactly; leftover units go to the largest
/// fractional remainders, ties broken by lower index.
pub fn apportion(total: u64, weights: &[u64]) -> Vec<u64> {
    let sum: u128 = weights.iter().map(|&w| w as u128).sum();
    if sum == 0 {
        return vec![0; weights.len()];
    }

    let mut parts = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, &w) in weights.iter().enumerate() {
        let scaled = total as u128 * w as u128;
        parts.push((scaled / sum) as u64);
        remainders.push((scaled % sum, index));
    }

    let assigned: u64 = parts.iter().sum();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, index) in remainders.iter().take((total - assigned) as usize) {
        parts[index] += 1;
    }
    parts
}

/// Two RTP values agree at two-decimal precision
pub fn rtp_matches(before: f64, after: f64) -> bool {
    (before * 100.0).round() == (after * 100.0).round()
}

/// Both tables list the same ids in the same order and pay on exactly the
/// same rows
pub fn check_compatible(base: &LookupTable, reference: &LookupTable) -> Result<()> {
    if base.len() != reference.len() {
        return Err(LutError::LengthMismatch {
            left: base.len(),
            right: reference.len(),
        });
    }
    for (index, (b, r)) in base.rows().iter().zip(reference.rows()).enumerate() {
        if b.id != r.id {
            return Err(LutError::IdMismatch {
                index,
                left: b.id,
                right: r.id,
            });
        }
        if b.is_paying() != r.is_paying() {
            return Err(LutError::PayoutShape {
                index,
                id: b.id,
                base: b.payout,
                reference: r.payout,
            });
        }
    }
    Ok(())
}

/// New weights for `target`: its zero-payout mass, shaped like the
/// zero-payout rows of `shape`. Paying rows keep their weight.
pub fn redistribute_losing_weights(target: &LookupTable, shape: &LookupTable) -> Result<Vec<u64>> {
    check_compatible(target, shape)?;

    let losing: Vec<usize> = target
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.is_paying())
        .map(|(index, _)| index)
        .collect();
    let zero_mass: u64 = losing.iter().map(|&i| target.rows()[i].weight).sum();
    let shape_weights: Vec<u64> = losing.iter().map(|&i| shape.rows()[i].weight).collect();

    let mut weights = target.weights();
    if zero_mass == 0 {
        return Ok(weights);
    }
    if shape_weights.iter().all(|&w| w == 0) {
        return Err(LutError::NoLosingMass);
    }

    for (&index, part) in losing.iter().zip(apportion(zero_mass, &shape_weights)) {
        weights[index] = part;
    }
    Ok(weights)
}

/// Redistribute `base`'s losing weights after the shape of `reference` and
/// verify the RTP at `cost` is unchanged at two decimals.
pub fn run_optimization(base: &LookupTable, reference: &LookupTable, cost: f64) -> Result<Optimized> {
    let rtp_before = base.rtp(cost)?;
    let weights = redistribute_losing_weights(base, reference)?;
    let rtp_after = base.with_weights(&weights)?.rtp(cost)?;

    if !rtp_matches(rtp_before, rtp_after) {
        return Err(LutError::RtpMismatch {
            before: rtp_before,
            after: rtp_after,
        });
    }
    log::debug!(
        "redistributed losing weights over {} rows, rtp {:.4} -> {:.4}",
        base.len(),
        rtp_before,
        rtp_after
    );
    Ok(Optimized {
        weights,
        rtp_before,
        rtp_after,
    })
}
