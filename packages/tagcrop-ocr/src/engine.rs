use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::region::Detection;

#[derive(Debug, Clone)]
pub enum DetectionInput {
    FilePath(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
    #[error("malformed detector output: {0}")]
    MalformedOutput(String),
}

/// A text detection and recognition engine.
///
/// Engines are expensive to construct; build one per process and share it behind an `Arc`.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect(&self, input: &DetectionInput) -> Result<Vec<Detection>, DetectionError>;
}
