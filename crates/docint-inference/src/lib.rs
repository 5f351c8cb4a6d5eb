//! ONNX inference abstraction layer for docint.
//!
//! The extraction engine talks to its sentence encoder through the
//! [`InferenceBackend`] trait so the encoder can be swapped for a fake in
//! tests. The `native` feature provides an ONNX Runtime backend with the
//! XNNPACK execution provider.

mod backend;
mod error;
mod tensor;

pub use backend::InferenceBackend;
pub use error::InferenceError;
pub use tensor::{InputTensor, OutputTensor, TensorType};

#[cfg(feature = "native")]
pub use backend::ort::OrtBackend;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
