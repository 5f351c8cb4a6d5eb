//! Error types for the inference layer.

use thiserror::Error;

/// Errors that can occur while running an encoder model.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The model file could not be loaded or parsed.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The runtime session could not be created.
    #[error("failed to create session: {0}")]
    SessionCreate(String),

    /// Input tensor had the wrong shape or element type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model run itself failed.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// A named output was missing or had an unsupported type.
    #[error("failed to extract output: {0}")]
    OutputExtraction(String),

    /// I/O error when reading model files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
