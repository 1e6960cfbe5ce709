//! Error types for the RedeSegura engine

use thiserror::Error;

/// Errors that can occur while scoring or managing the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("PsychAI engine is not initialized")]
    NotInitialized,

    #[error("Unknown lexicon category: {0}")]
    UnknownCategory(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
