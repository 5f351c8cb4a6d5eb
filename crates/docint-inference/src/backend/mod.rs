//! Inference backend implementations.

#[cfg(feature = "native")]
pub mod ort;

use crate::{InputTensor, OutputTensor, Result};

/// Trait for ONNX inference backends.
///
/// Backends are shared read-only across threads once loaded, so they must be
/// `Send + Sync`; implementations that need interior mutability guard it
/// themselves.
pub trait InferenceBackend: Send + Sync {
    /// Run the model with named inputs and return every named output.
    fn run(&self, inputs: &[(&str, InputTensor)]) -> Result<Vec<(String, OutputTensor)>>;

    /// Input names expected by the model.
    fn input_names(&self) -> &[String];

    /// Output names produced by the model.
    fn output_names(&self) -> &[String];
}
