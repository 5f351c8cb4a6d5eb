//! Core library for financial document field extraction.
//!
//! This crate provides:
//! - Document ingestion (PDF and plain-text pages) and page chunking
//! - Text vectorization (ONNX sentence encoder or feature hashing) and
//!   cosine-similarity ranking
//! - Typed value parsing and per-parameter validation
//! - Semantic and keyword-anchored field extractors
//! - Confidence aggregation and the run coordinator producing the final report

pub mod chunking;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod models;
pub mod pdf;
pub mod pipeline;

pub use chunking::{Chunker, PageChunker};
pub use embedding::{
    build_vectorizer, rank, HashVectorizer, OnnxVectorizer, RankedMatch, TextVectorizer,
    VectorizerCell,
};
pub use error::{DocintError, Result};
pub use extract::{
    aggregate_confidence, make_extractor, overall_confidence, AnchorExtractor, Extractor,
    SemanticExtractor,
};
pub use models::catalog::{DataType, ParameterCatalog, ParameterDefinition};
pub use models::config::DocintConfig;
pub use models::document::{Chunk, Page};
pub use models::report::{
    BureauReport, DocumentFailure, DocumentKind, ExtractionResult, FieldValue, FinalReport,
    SalesRecord,
};
pub use pdf::{load_document, DocumentLoader, PdfExtractor, TextDocumentLoader};
pub use pipeline::{RunCoordinator, RunEvent};

/// Re-export inference types.
pub use docint_inference::{InferenceBackend, InputTensor, OutputTensor};

#[cfg(feature = "native")]
pub use docint_inference::OrtBackend;
