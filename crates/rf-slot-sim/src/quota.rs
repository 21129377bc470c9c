//! Splitting a simulation budget across distributions

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rf_slot_math::BetMode;

use crate::error::{Result, SimError};

/// Split `total` into integer counts proportional to `quotas`.
///
/// Counts always sum to `total`. Largest remainder rounding, ties to the
/// lower index. When `total` is at least the number of positive quotas,
/// every positive quota receives at least one simulation, taken from the
/// largest count.
pub fn split_quotas(total: u64, quotas: &[f64]) -> Result<Vec<u64>> {
    if quotas.is_empty() {
        return Err(SimError::Quota("no distributions".into()));
    }
    if let Some(q) = quotas.iter().find(|q| !q.is_finite() || **q < 0.0) {
        return Err(SimError::Quota(format!("invalid quota {q}")));
    }
    let sum: f64 = quotas.iter().sum();
    if (sum - 1.0).abs() > 1e-6 {
        return Err(SimError::Quota(format!("quotas sum to {sum}, expected 1.0")));
    }

    let exact: Vec<f64> = quotas.iter().map(|q| total as f64 * q / sum).collect();
    let mut counts: Vec<u64> = exact.iter().map(|e| e.floor() as u64).collect();

    // Float error can leave the floors a unit over; trim from the largest
    while counts.iter().sum::<u64>() > total {
        let largest = largest_index(&counts);
        counts[largest] -= 1;
    }

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    let remaining = total - counts.iter().sum::<u64>();
    for &index in order.iter().cycle().take(remaining as usize) {
        counts[index] += 1;
    }

    let positive = quotas.iter().filter(|q| **q > 0.0).count() as u64;
    if total >= positive {
        for index in 0..quotas.len() {
            if quotas[index] > 0.0 && counts[index] == 0 {
                let donor = largest_index(&counts);
                counts[donor] -= 1;
                counts[index] += 1;
            }
        }
    }
    Ok(counts)
}

fn largest_index(counts: &[u64]) -> usize {
    counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(i, _)| i)
}

/// Distribution index for every simulation of a bet mode, shuffled with a
/// generator seeded from `seed` so categories interleave across workers.
pub fn assign_criteria(mode: &BetMode, total: u64, seed: u64) -> Result<Vec<usize>> {
    let quotas: Vec<f64> = mode.distributions.iter().map(|d| d.quota).collect();
    let counts = split_quotas(total, &quotas)?;

    let mut plan = Vec::with_capacity(total as usize);
    for (index, &count) in counts.iter().enumerate() {
        plan.extend(std::iter::repeat_n(index, count as usize));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    plan.shuffle(&mut rng);

    log::debug!(
        "bet mode '{}': {} simulations split {:?}",
        mode.name,
        total,
        mode.distributions
            .iter()
            .zip(&counts)
            .map(|(d, c)| (d.criteria.as_str(), *c))
            .collect::<Vec<_>>()
    );
    Ok(plan)
}
