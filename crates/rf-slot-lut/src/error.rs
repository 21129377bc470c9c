//! Error types for lookup table handling
//!
//! Every variant except [`LutError::Io`] is a configuration fault: the tables
//! as given cannot be combined without changing the game's RTP.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LutError {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("table has no rows")]
    Empty,

    #[error("table has zero total weight")]
    ZeroWeight,

    #[error("tables differ in length: {left} vs {right} rows")]
    LengthMismatch { left: usize, right: usize },

    #[error("row {index}: id {left} does not match id {right}")]
    IdMismatch { index: usize, left: u64, right: u64 },

    #[error("row {index} (id {id}): payout {base} and {reference} are not substitution-compatible")]
    PayoutShape {
        index: usize,
        id: u64,
        base: f64,
        reference: f64,
    },

    #[error("reference table carries no weight on zero-payout rows")]
    NoLosingMass,

    #[error("RTP mismatch after alteration: {before:.4} before, {after:.4} after")]
    RtpMismatch { before: f64, after: f64 },

    #[error("criteria '{0}' has no rows")]
    MissingCriteria(String),

    #[error("criteria '{criteria}': {reason}")]
    Criteria { criteria: String, reason: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LutError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LutError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LutError>;
