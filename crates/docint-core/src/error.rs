//! Error types for the docint-core library.
//!
//! Field-level misses are never errors: a parameter that cannot be found is
//! an [`ExtractionResult`](crate::models::report::ExtractionResult) with no
//! value. The variants here are for run-level and document-level failures.

use thiserror::Error;

/// Main error type for the docint library.
#[derive(Error, Debug)]
pub enum DocintError {
    /// The vectorization model could not be initialized.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The parameter catalog is missing or malformed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Retrieval or vectorization failed for a document.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] docint_inference::InferenceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DocintError {
    /// Whether this error aborts the whole run rather than a single document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DocintError::ModelUnavailable(_) | DocintError::Catalog(_) | DocintError::Config(_)
        )
    }
}

/// Errors related to loading the parameter catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A required column is absent from the header row.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Two rows share the same parameter key.
    #[error("duplicate parameter key: {0}")]
    DuplicateKey(String),

    /// A row could not be decoded.
    #[error("invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    /// Underlying CSV reader error (unreadable file, ragged rows).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The file extension is not a recognized document type.
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),
}

/// Errors raised while locating fields in a document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Retrieval was invoked with zero chunks.
    #[error("no candidate chunks to rank")]
    NoCandidates,

    /// A candidate vector has a different dimension than the query.
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The vectorizer returned an unusable result.
    #[error("vectorization failed: {0}")]
    Vectorization(String),
}

/// Result type for the docint library.
pub type Result<T> = std::result::Result<T, DocintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(DocintError::ModelUnavailable("x".into()).is_fatal());
        assert!(DocintError::Catalog(CatalogError::MissingColumn("data_type".into())).is_fatal());
        assert!(!DocintError::Extraction(ExtractionError::NoCandidates).is_fatal());
        assert!(!DocintError::Pdf(PdfError::NoPages).is_fatal());
    }
}
