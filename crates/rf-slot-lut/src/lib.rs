//! # rf-slot-lut — Payout Lookup Tables
//!
//! Published simulation results and the batch steps that recalibrate them.
//!
//! ## Features
//!
//! - **Lookup Tables**: `id,weight,payout` rows, rewritten byte-for-byte except for weights
//! - **Segmented Tables**: per-simulation criteria and base/free game split
//! - **Losing-Weight Optimizer**: reshape zero-payout mass, RTP verified at two decimals
//! - **Criteria Substitution**: carry a bonus table's feature economics into the base table
//! - **Atomic Write-Back**: temporary sibling file plus rename
//!
//! ## Architecture
//!
//! ```text
//! read_table ──► LookupTable ──► run_optimization / substitute_criteria
//!                                          │
//!                                  RTP check (2 dp)
//!                                          │ ok
//!                                          v
//!                                   write_table (tmp + rename)
//! ```

pub mod error;
pub mod io;
pub mod optimizer;
pub mod substitute;
pub mod table;

pub use error::*;
pub use io::*;
pub use optimizer::*;
pub use substitute::*;
pub use table::*;
