//! # rf-slot-sim — Simulation Orchestrator
//!
//! Runs a simulation budget per bet mode across a worker pool and publishes
//! the results as books and payout lookup tables.
//!
//! ## Features
//!
//! - **Quota Split**: integer per-criteria counts that always sum to the budget
//! - **Deterministic Seeds**: every round reproducible from `(base seed, worker, index)`
//! - **Parallel Batches**: contiguous chunks per worker on a rayon pool
//! - **Order-Independent Aggregation**: results keyed by simulation id
//! - **Outputs**: lookup table, segmented table, statistics, force records, JSONL books
//!
//! ## Architecture
//!
//! ```text
//! SimulationConfig + GameConfig
//!     │
//!     v
//! ModeRunner ── assign_criteria (quotas, shuffled plan)
//!     │
//!     ├── worker 0: sims [0, n) ──┐
//!     ├── worker 1: sims [n, 2n) ─┼──► Aggregator (Mutex<BTreeMap>)
//!     └── worker k: ...         ──┘          │
//!                                            v
//!                              ModeResult ──► lookUpTable / segmented / books
//! ```

pub mod aggregate;
pub mod book;
pub mod error;
pub mod quota;
pub mod runner;
pub mod seed;

pub use aggregate::{Aggregate, Aggregator, CriteriaStats, ForceEntry, Outcome};
pub use book::{Book, read_books, write_books};
pub use error::{Result, SimError};
pub use quota::{assign_criteria, split_quotas};
pub use runner::{ModeResult, ModeRunner, SimulationConfig, simulate};
pub use seed::{MAX_SIMULATIONS, WORKER_STRIDE, simulation_seed, worker_offset};
