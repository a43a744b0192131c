use thiserror::Error;

use crate::classifier::ClassifierError;

#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Invalid request body: {0}")]
    BadRequest(#[from] serde_json::Error),

    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Classification failed: {0}")]
    ClassificationFailed(#[from] ClassifierError),

    /// Startup misconfiguration, including an unknown classifier backend.
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
