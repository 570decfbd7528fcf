use crate::types::ProcessorId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Processor '{id}' not found")]
    UnknownProcessor { id: ProcessorId },

    #[error("Processor '{id}' is already registered")]
    DuplicateProcessor { id: ProcessorId },

    #[error("Settle loop did not reach a fixed point after {passes} passes")]
    SettleLimitExceeded { passes: usize },

    #[error("Invalid save: {reason}")]
    InvalidSave { reason: String },

    #[error("Replay diverged at stimulus {index}")]
    ReplayDiverged { index: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
