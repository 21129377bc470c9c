//! Error types for the slot math engine
//!
//! Two families of failure exist:
//!
//! - **Configuration faults**: the loaded game cannot be simulated as written
//!   (missing strips, bad quotas, non-monotonic anticipation). Fatal.
//! - **Exhaustion faults**: a bounded search (forced board, round repeat) hit
//!   its attempt ceiling. Also fatal, but reported separately so callers can
//!   tell "wrong data" from "data too tight to satisfy".
//!
//! Attribute assignment failures on individual symbols are not part of this
//! enum; they are absorbed where they happen (see [`AttributeError`]).

use thiserror::Error;

use crate::config::GameType;

/// Problems found while loading or resolving a game configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("limit exceeded: {0}")]
    Limit(String),

    #[error("grid: {0}")]
    Grid(String),

    #[error("unknown symbol '{symbol}' referenced by {context}")]
    UnknownSymbol { symbol: String, context: String },

    #[error("reel strip '{0}' is not defined")]
    UnknownStrip(String),

    #[error("reel strip '{strip}': {reason}")]
    InvalidStrip { strip: String, reason: String },

    #[error("paytable: {0}")]
    Paytable(String),

    #[error("free spin trigger table for {0} is empty or missing")]
    MissingTriggers(GameType),

    #[error("bet mode '{mode}': distribution quotas sum to {sum}, expected 1.0")]
    QuotaSum { mode: String, sum: f64 },

    #[error("bet mode '{mode}': {reason}")]
    BetMode { mode: String, reason: String },

    #[error("bet mode '{mode}', criteria '{criteria}': {reason}")]
    Distribution {
        mode: String,
        criteria: String,
        reason: String,
    },

    #[error("payline {index}: {reason}")]
    Payline { index: usize, reason: String },

    #[error("feature '{feature}': {reason}")]
    Feature { feature: String, reason: String },
}

/// Engine errors surfaced to the orchestrator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("configuration fault: {0}")]
    Config(#[from] ConfigError),

    #[error("anticipation decreases from reel {reel} ({previous} > {next})")]
    AnticipationNotMonotonic { reel: usize, previous: u32, next: u32 },

    #[error("criteria '{criteria}' has no reel weights for {game_type}")]
    MissingReelWeights { criteria: String, game_type: GameType },

    #[error("criteria '{criteria}' forces free spins but has no scatter trigger weights")]
    MissingScatterTriggers { criteria: String },

    #[error("weight table '{0}' is empty or has zero total weight")]
    EmptyWeights(String),

    #[error(
        "forced board exhausted: strip set cannot land {count} x '{category}' \
         for criteria '{criteria}' after {attempts} attempts"
    )]
    ForceBoardExhausted {
        criteria: String,
        category: String,
        count: usize,
        attempts: u32,
    },

    #[error("round repeat exhausted: criteria '{criteria}' not satisfied after {attempts} attempts")]
    RepeatExhausted { criteria: String, attempts: u32 },
}

impl SlotError {
    /// True for faults caused by inconsistent configuration data
    pub fn is_configuration_fault(&self) -> bool {
        !self.is_exhaustion()
    }

    /// True for faults raised when a bounded retry hits its ceiling
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            SlotError::ForceBoardExhausted { .. } | SlotError::RepeatExhausted { .. }
        )
    }
}

/// Failure of a special-symbol attribute handler.
///
/// Never escapes board construction: the symbol is created bare and the
/// failure is logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("no value table '{table}' for {game_type}")]
    MissingTable { table: String, game_type: GameType },

    #[error("no prize '{table}' for {game_type}")]
    MissingPrize { table: String, game_type: GameType },

    #[error("value table '{0}' has zero total weight")]
    ZeroWeight(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
