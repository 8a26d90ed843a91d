use std::time::Duration;
use thiserror::Error;

/// Failure of a single embedding tier. Always recovered by the tier chain.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected}-dim vector, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Tier disabled: {0}")]
    Disabled(&'static str),
}

impl From<candle_core::Error> for EmbedError {
    fn from(e: candle_core::Error) -> Self { EmbedError::Inference(e.to_string()) }
}

impl From<anyhow::Error> for EmbedError {
    fn from(e: anyhow::Error) -> Self { EmbedError::Inference(e.to_string()) }
}
