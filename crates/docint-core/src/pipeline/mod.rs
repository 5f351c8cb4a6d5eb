//! Run coordination: documents in, one final report out.

pub mod output;

pub use output::{read_report, write_report};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use glob::{glob, Pattern};
use tracing::{debug, info, warn};

use crate::chunking::{Chunker, PageChunker};
use crate::embedding::TextVectorizer;
use crate::error::{DocintError, Result};
use crate::extract::rules::normalize_period;
use crate::extract::{make_extractor, overall_confidence, Extractor};
use crate::models::catalog::{DataType, ParameterCatalog, ParameterDefinition};
use crate::models::config::DocintConfig;
use crate::models::report::{
    BureauReport, DocumentFailure, DocumentKind, FinalReport, SalesRecord,
};
use crate::pdf::load_document;

/// Progress notifications emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Documents were discovered; `total` will be processed.
    Started { total: usize },
    /// One document finished, successfully or not.
    Document {
        kind: DocumentKind,
        document: String,
        ok: bool,
    },
}

/// Drives a full extraction run over the configured inputs.
///
/// Catalog and model failures abort the run. Any other failure is confined
/// to the document that raised it and recorded in the report.
pub struct RunCoordinator {
    config: DocintConfig,
    vectorizer: Arc<dyn TextVectorizer>,
    chunker: PageChunker,
}

impl RunCoordinator {
    pub fn new(config: DocintConfig, vectorizer: Arc<dyn TextVectorizer>) -> Self {
        Self {
            config,
            vectorizer,
            chunker: PageChunker,
        }
    }

    pub fn config(&self) -> &DocintConfig {
        &self.config
    }

    /// Load the configured parameter catalog.
    pub fn load_catalog(&self) -> Result<ParameterCatalog> {
        let path = &self.config.inputs.catalog_path;
        let catalog = ParameterCatalog::from_path(path)?;
        info!("Loaded {} parameters from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Recognized documents in `dir`, sorted by file name.
    ///
    /// A missing directory holds no documents.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            warn!("Input directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }

        // Brackets and wildcards in the directory name are literal
        let dir_str = dir
            .to_str()
            .ok_or_else(|| DocintError::Config(format!("non UTF-8 path {}", dir.display())))?;
        let pattern = Path::new(&Pattern::escape(dir_str)).join("*");
        let pattern = pattern.to_string_lossy();

        let extensions = &self.config.inputs.extensions;
        let mut files: Vec<PathBuf> = glob(&pattern)
            .map_err(|e| DocintError::Config(e.to_string()))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable entry {}: {}", e.path().display(), e.error());
                    None
                }
            })
            .filter(|path| path.is_file())
            .filter(|path| {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
            })
            .collect();

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!("Found {} documents in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Parameters read from bureau reports: the catalog minus the sales field.
    fn bureau_definitions(&self, catalog: &ParameterCatalog) -> Vec<ParameterDefinition> {
        let sales_key = &self.config.extraction.gst_field_key;
        catalog
            .definitions()
            .iter()
            .filter(|def| &def.key != sales_key)
            .cloned()
            .collect()
    }

    /// Definition of the sales field, from the catalog or its anchor rule.
    fn sales_definition(&self, catalog: &ParameterCatalog) -> ParameterDefinition {
        let extraction = &self.config.extraction;
        let key = &extraction.gst_field_key;

        if let Some(def) = catalog.get(key) {
            return def.clone();
        }
        match extraction.anchor_rule(key) {
            Some(rule) => {
                ParameterDefinition::new(key, &rule.phrase, "", &rule.source, DataType::Number)
            }
            None => ParameterDefinition::new(key, key, "", key, DataType::Number),
        }
    }

    fn extractor(&self, kind: DocumentKind) -> Box<dyn Extractor> {
        let extraction = &self.config.extraction;
        let strategy = match kind {
            DocumentKind::Bureau => extraction.bureau_strategy,
            DocumentKind::Gst => extraction.gst_strategy,
        };
        make_extractor(strategy, Arc::clone(&self.vectorizer), extraction)
    }

    fn bureau_report(
        &self,
        path: &Path,
        definitions: &[ParameterDefinition],
        extractor: &dyn Extractor,
    ) -> Result<BureauReport> {
        let pages = load_document(path)?;
        let chunks = self.chunker.chunk(&pages);
        debug!("{}: {} chunks", path.display(), chunks.len());
        extractor.extract_all(&chunks, definitions)
    }

    fn sales_record(
        &self,
        path: &Path,
        definition: &ParameterDefinition,
        extractor: &dyn Extractor,
    ) -> Result<SalesRecord> {
        let pages = load_document(path)?;
        let chunks = self.chunker.chunk(&pages);
        let result = extractor.extract(&chunks, definition)?;
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(SalesRecord::from_result(normalize_period(&label), result))
    }

    /// Extract every bureau parameter from one document.
    pub fn extract_bureau_document(
        &self,
        path: &Path,
        catalog: &ParameterCatalog,
    ) -> Result<BureauReport> {
        let extractor = self.extractor(DocumentKind::Bureau);
        self.bureau_report(path, &self.bureau_definitions(catalog), extractor.as_ref())
    }

    /// Extract the sales record from one tax filing.
    pub fn extract_gst_document(
        &self,
        path: &Path,
        catalog: &ParameterCatalog,
    ) -> Result<SalesRecord> {
        let extractor = self.extractor(DocumentKind::Gst);
        self.sales_record(path, &self.sales_definition(catalog), extractor.as_ref())
    }

    /// Run over all configured documents.
    pub fn run(&self) -> Result<FinalReport> {
        self.run_with(|_| {})
    }

    /// Run over all configured documents, reporting progress to `on_event`.
    pub fn run_with<F>(&self, mut on_event: F) -> Result<FinalReport>
    where
        F: FnMut(RunEvent),
    {
        let catalog = self.load_catalog()?;
        let bureau_docs = self.discover(&self.config.inputs.bureau_dir)?;
        let gst_docs = self.discover(&self.config.inputs.gst_dir)?;

        info!(
            "Processing {} bureau and {} GST documents with the {} vectorizer",
            bureau_docs.len(),
            gst_docs.len(),
            self.vectorizer.name()
        );
        on_event(RunEvent::Started {
            total: bureau_docs.len() + gst_docs.len(),
        });

        let mut failed_documents = Vec::new();

        let definitions = self.bureau_definitions(&catalog);
        let bureau_extractor = self.extractor(DocumentKind::Bureau);
        let mut by_document = BTreeMap::new();
        for path in &bureau_docs {
            let id = document_id(path);
            match self.bureau_report(path, &definitions, bureau_extractor.as_ref()) {
                Ok(report) => {
                    by_document.insert(id.clone(), report);
                    on_event(RunEvent::Document {
                        kind: DocumentKind::Bureau,
                        document: id,
                        ok: true,
                    });
                }
                Err(e) => {
                    let failure = self.document_failed(DocumentKind::Bureau, &id, e)?;
                    failed_documents.push(failure);
                    on_event(RunEvent::Document {
                        kind: DocumentKind::Bureau,
                        document: id,
                        ok: false,
                    });
                }
            }
        }

        let sales_definition = self.sales_definition(&catalog);
        let gst_extractor = self.extractor(DocumentKind::Gst);
        let mut gst_sales = Vec::with_capacity(gst_docs.len());
        for path in &gst_docs {
            let id = document_id(path);
            match self.sales_record(path, &sales_definition, gst_extractor.as_ref()) {
                Ok(record) => {
                    gst_sales.push(record);
                    on_event(RunEvent::Document {
                        kind: DocumentKind::Gst,
                        document: id,
                        ok: true,
                    });
                }
                Err(e) => {
                    let failure = self.document_failed(DocumentKind::Gst, &id, e)?;
                    failed_documents.push(failure);
                    on_event(RunEvent::Document {
                        kind: DocumentKind::Gst,
                        document: id,
                        ok: false,
                    });
                }
            }
        }

        let overall_confidence_score =
            overall_confidence(&by_document, &gst_sales, self.config.confidence.scope);

        let bureau_parameters = if self.config.output.flatten_single_document && by_document.len() == 1
        {
            by_document.values().next().cloned()
        } else {
            None
        };

        let run_timestamp_utc = self.config.output.include_timestamp.then(Utc::now);

        info!(
            "Run complete: {} bureau, {} GST, {} failed, overall confidence {:.2}",
            by_document.len(),
            gst_sales.len(),
            failed_documents.len(),
            overall_confidence_score
        );

        Ok(FinalReport {
            run_timestamp_utc,
            bureau_parameters_by_document: by_document,
            bureau_parameters,
            gst_sales,
            overall_confidence_score,
            failed_documents,
        })
    }

    /// Run and atomically replace the configured output file.
    ///
    /// Nothing is written when the run fails.
    pub fn run_and_persist(&self) -> Result<FinalReport> {
        let report = self.run()?;
        self.persist(&report)?;
        Ok(report)
    }

    /// Write `report` to the configured output path.
    pub fn persist(&self, report: &FinalReport) -> Result<()> {
        let output = &self.config.output;
        write_report(&output.path, report, output.pretty)?;
        info!("Report written to {}", output.path.display());
        Ok(())
    }

    /// Record a per-document failure, or escalate it when it is fatal.
    fn document_failed(
        &self,
        kind: DocumentKind,
        document: &str,
        error: DocintError,
    ) -> Result<DocumentFailure> {
        if error.is_fatal() {
            return Err(error);
        }
        warn!("Skipping {} document {}: {}", kind, document, error);
        Ok(DocumentFailure {
            document: document.to_string(),
            kind,
            error: error.to_string(),
        })
    }
}

fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashVectorizer;
    use pretty_assertions::assert_eq;

    fn coordinator(config: DocintConfig) -> RunCoordinator {
        RunCoordinator::new(config, Arc::new(HashVectorizer::new(64)))
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.PDF", "notes.md", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = coordinator(DocintConfig::default()).discover(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|p| document_id(p)).collect();
        assert_eq!(names, vec!["a.PDF", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_discover_directory_with_glob_characters() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reports[2024]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("gstr3b_april_2024.txt"), "x").unwrap();

        let files = coordinator(DocintConfig::default()).discover(&dir).unwrap();
        let names: Vec<_> = files.iter().map(|p| document_id(p)).collect();
        assert_eq!(names, vec!["gstr3b_april_2024.txt"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let files = coordinator(DocintConfig::default())
            .discover(Path::new("/nonexistent/docint-inputs"))
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_sales_definition_falls_back_to_anchor_rule() {
        let catalog = ParameterCatalog::new(Vec::new()).unwrap();
        let def = coordinator(DocintConfig::default()).sales_definition(&catalog);
        assert_eq!(def.key, "gst_sales");
        assert_eq!(def.name, "Outward taxable supplies");
        assert_eq!(def.expected_section, "GSTR-3B Table 3.1(a)");
    }

    #[test]
    fn test_fatal_error_escalates() {
        let c = coordinator(DocintConfig::default());
        let err = c
            .document_failed(
                DocumentKind::Bureau,
                "a.pdf",
                DocintError::ModelUnavailable("gone".into()),
            )
            .unwrap_err();
        assert!(matches!(err, DocintError::ModelUnavailable(_)));

        let failure = c
            .document_failed(
                DocumentKind::Gst,
                "b.pdf",
                DocintError::Extraction(crate::error::ExtractionError::NoCandidates),
            )
            .unwrap();
        assert_eq!(failure.document, "b.pdf");
        assert_eq!(failure.kind, DocumentKind::Gst);
    }
}
