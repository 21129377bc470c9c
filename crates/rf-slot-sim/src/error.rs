//! Simulation errors

use std::path::PathBuf;

use rf_slot_lut::LutError;
use rf_slot_math::{ConfigError, SlotError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Lut(#[from] LutError),

    /// A round failed; carries the simulation that failed
    #[error("bet mode '{mode}', simulation {sim}: {source}")]
    Round {
        mode: String,
        sim: u64,
        #[source]
        source: SlotError,
    },

    #[error("quota split: {0}")]
    Quota(String),

    #[error("simulation {0} recorded twice")]
    DuplicateSimulation(u64),

    #[error("worker pool: {0}")]
    Pool(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Slot(SlotError::Config(e))
    }
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration faults abort the whole batch; everything else is
    /// reported per bet mode
    pub fn is_configuration_fault(&self) -> bool {
        match self {
            SimError::Slot(e) | SimError::Round { source: e, .. } => e.is_configuration_fault(),
            SimError::Lut(e) => !matches!(e, LutError::Io { .. }),
            SimError::Quota(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
