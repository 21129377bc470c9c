//! Per-simulation seed derivation
//!
//! Worker `w` owns the id range starting at `(w + 1) · WORKER_STRIDE`.
//! Simulation indices stay below the stride, so `worker_offset + index` is
//! unique across all workers of a batch and the seed is a pure function of
//! `(base_seed, worker, index)`.

use rf_slot_math::splitmix64;

/// Spacing between worker id ranges
pub const WORKER_STRIDE: u64 = 1 << 32;

/// Largest simulation budget a batch may run
pub const MAX_SIMULATIONS: u64 = WORKER_STRIDE;

pub fn worker_offset(worker_index: usize) -> u64 {
    (worker_index as u64 + 1) * WORKER_STRIDE
}

pub fn simulation_seed(base_seed: u64, worker_offset: u64, sim_index: u64) -> u64 {
    debug_assert!(sim_index < WORKER_STRIDE);
    splitmix64(base_seed ^ worker_offset.wrapping_add(sim_index))
}
