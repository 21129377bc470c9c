//! # rf-slot-math — Slot Math Engine
//!
//! Plays individual slot rounds against a game configuration so that large
//! simulations can build payout lookup tables for a certified release.
//!
//! ## Features
//!
//! - **Weighted Sampling**: strip selection, reel stops, forced special symbol placement
//! - **Win Evaluation**: cluster pays, paylines, scatter pays, bomb prizes
//! - **Round State Machine**: base spin, free spins, retriggers, win cap, repeat
//! - **Feature Modifiers**: expanding wilds, bomb guarantee, multiplier ladder
//! - **Event Log**: typed, replayable record of every round
//! - **Force Records**: searchable descriptors of triggers, scatter pays and bombs
//!
//! ## Architecture
//!
//! ```text
//! GameConfigLoader (JSON / YAML)
//!     │
//!     v
//! GameConfig ──► RoundEngine<H: RoundHooks>
//!                    │
//!                    ├── BoardSampler (reel sets, weights, forced placement)
//!                    ├── FeatureModifier* (post-draw)
//!                    ├── WinEvaluator* (cluster / lines / scatter / bombs)
//!                    └── WinManager (phase accounting)
//!                          │
//!                          v
//!                    RoundState → EventLog, final win
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod events;
pub mod features;
pub mod paytable;
pub mod records;
pub mod rng;
pub mod round;
pub mod sampler;
pub mod symbols;
pub mod weights;
pub mod wins;

pub use board::*;
pub use config::*;
pub use error::*;
pub use evaluate::{
    EvalContext, EvaluatorSpec, WinEvaluator, WinKind, WinMeta, WinRecord, WinSummary, evaluate_all,
};
pub use events::*;
pub use features::{FeatureModifier, FeatureSpec};
pub use paytable::*;
pub use records::ForceRecord;
pub use rng::*;
pub use round::*;
pub use sampler::*;
pub use symbols::*;
pub use weights::*;
pub use wins::*;
