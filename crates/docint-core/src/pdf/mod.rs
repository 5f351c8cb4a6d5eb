//! Document ingestion: turning document files into ordered page texts.

mod extractor;
mod text;

pub use extractor::PdfExtractor;
pub use text::TextDocumentLoader;

use std::path::Path;

use tracing::debug;

use crate::error::{DocintError, PdfError};
use crate::models::document::Page;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self) -> Result<Vec<Page>>;
}

/// Produces the ordered pages of a document file.
pub trait DocumentLoader {
    fn load_pages(&self, path: &Path) -> std::result::Result<Vec<Page>, DocintError>;
}

/// Load a document by dispatching on its (case-insensitive) extension.
pub fn load_document(path: &Path) -> std::result::Result<Vec<Page>, DocintError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    debug!("Loading {} document {}", extension, path.display());

    match extension.as_str() {
        "pdf" => PdfExtractor::new().load_pages(path),
        "txt" => TextDocumentLoader.load_pages(path),
        _ => Err(PdfError::UnsupportedFormat(extension).into()),
    }
}
