//! Full runs over text documents with the hashing vectorizer.

use std::path::Path;
use std::sync::Arc;

use docint_core::embedding::cosine_similarity;
use docint_core::models::config::ConfidenceScope;
use docint_core::models::report::round_confidence;
use docint_core::{
    DocintConfig, DocintError, DocumentKind, FieldValue, HashVectorizer, RunCoordinator,
    RunEvent, SalesRecord, TextVectorizer,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const CATALOG: &str = "\
parameter_key,parameter_name,description,expected_section,data_type
bureau_score,Bureau Score,credit score of the borrower,Score Section,number
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bureau")).unwrap();
        std::fs::create_dir_all(dir.path().join("gst")).unwrap();
        std::fs::write(dir.path().join("parameters.csv"), CATALOG).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn bureau(&self, name: &str, content: &[u8]) -> &Self {
        std::fs::write(self.path().join("bureau").join(name), content).unwrap();
        self
    }

    fn gst(&self, name: &str, content: &str) -> &Self {
        std::fs::write(self.path().join("gst").join(name), content).unwrap();
        self
    }

    fn config(&self) -> DocintConfig {
        let mut config = DocintConfig::default();
        config.inputs.bureau_dir = self.path().join("bureau");
        config.inputs.gst_dir = self.path().join("gst");
        config.inputs.catalog_path = self.path().join("parameters.csv");
        config.output.path = self.path().join("outputs").join("final_output.json");
        config.output.include_timestamp = false;
        config
    }
}

fn vectorizer() -> Arc<HashVectorizer> {
    Arc::new(HashVectorizer::new(384))
}

#[test]
fn bureau_score_found_with_similarity_confidence() {
    let fixture = Fixture::new();
    fixture.bureau("crif.txt", b"Bureau Score: 742 (Excellent)");

    let hash = vectorizer();
    let report = RunCoordinator::new(fixture.config(), hash.clone())
        .run()
        .unwrap();

    let vectors = hash
        .vectorize(&[
            "Bureau Score credit score of the borrower Score Section",
            "Bureau Score: 742 (Excellent)",
        ])
        .unwrap();
    let expected = round_confidence(cosine_similarity(&vectors[0], &vectors[1]));

    let result = report.bureau_parameters_by_document["crif.txt"]
        .get("bureau_score")
        .unwrap();
    assert_eq!(result.value, FieldValue::Number(742));
    assert_eq!(result.source, "Score Section (page 1)");
    assert_eq!(result.confidence, expected);
    assert!(expected > 0.0);

    // A single bureau document is also flattened.
    assert_eq!(
        report.bureau_parameters.as_ref().unwrap().get("bureau_score"),
        Some(result)
    );
    assert_eq!(report.overall_confidence_score, expected);
}

#[test]
fn gst_sales_read_from_anchor() {
    let fixture = Fixture::new();
    fixture.gst(
        "gstr3b_april_2024.txt",
        "GSTR-3B\n3.1 (a) Outward taxable supplies (other than zero rated) 500000",
    );

    let report = RunCoordinator::new(fixture.config(), vectorizer())
        .run()
        .unwrap();

    assert_eq!(
        report.gst_sales,
        vec![SalesRecord {
            month: "April 2024".to_string(),
            sales: Some(500000),
            source: "GSTR-3B Table 3.1(a)".to_string(),
            confidence: 0.99,
        }]
    );
    assert!(report.bureau_parameters_by_document.is_empty());
    assert!(report.bureau_parameters.is_none());
    assert_eq!(report.overall_confidence_score, 0.99);
}

#[test]
fn gst_records_follow_file_name_order() {
    let fixture = Fixture::new();
    fixture
        .gst("gstr3b_may_2024.txt", "Nothing to see")
        .gst("gstr3b_april_2024.txt", "Outward taxable supplies 120000");

    let report = RunCoordinator::new(fixture.config(), vectorizer())
        .run()
        .unwrap();

    let months: Vec<_> = report.gst_sales.iter().map(|s| s.month.as_str()).collect();
    assert_eq!(months, vec!["April 2024", "May 2024"]);
    assert_eq!(report.gst_sales[1].sales, None);
    assert_eq!(report.gst_sales[1].source, "Not Found");
    // The miss does not drag the aggregate down.
    assert_eq!(report.overall_confidence_score, 0.99);
}

#[test]
fn repeated_runs_write_identical_output() {
    let fixture = Fixture::new();
    fixture
        .bureau("crif.txt", b"Bureau Score: 742 (Excellent)\x0cAccounts: 3 active")
        .gst("gstr3b_april_2024.txt", "Outward taxable supplies 500000");

    let config = fixture.config();
    let coordinator = RunCoordinator::new(config.clone(), vectorizer());

    coordinator.run_and_persist().unwrap();
    let first = std::fs::read(&config.output.path).unwrap();
    coordinator.run_and_persist().unwrap();
    let second = std::fs::read(&config.output.path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn broken_document_does_not_stop_the_run() {
    let fixture = Fixture::new();
    fixture
        .bureau("a_broken.pdf", b"not really a pdf")
        .bureau("b_good.txt", b"Bureau Score: 742")
        .gst("gstr3b_april_2024.txt", "Outward taxable supplies 500000");

    let mut events = Vec::new();
    let report = RunCoordinator::new(fixture.config(), vectorizer())
        .run_with(|event| events.push(event))
        .unwrap();

    assert_eq!(report.failed_documents.len(), 1);
    assert_eq!(report.failed_documents[0].document, "a_broken.pdf");
    assert_eq!(report.failed_documents[0].kind, DocumentKind::Bureau);
    assert!(report.bureau_parameters_by_document.contains_key("b_good.txt"));
    assert_eq!(report.gst_sales.len(), 1);

    assert_eq!(events[0], RunEvent::Started { total: 3 });
    assert_eq!(events.len(), 4);
}

#[test]
fn catalog_error_writes_nothing() {
    let fixture = Fixture::new();
    fixture.bureau("crif.txt", b"Bureau Score: 742");
    std::fs::write(
        fixture.path().join("parameters.csv"),
        "parameter_key,parameter_name,description,expected_section\nbureau_score,Bureau Score,x,y\n",
    )
    .unwrap();

    let config = fixture.config();
    let err = RunCoordinator::new(config.clone(), vectorizer())
        .run_and_persist()
        .unwrap_err();

    assert!(matches!(err, DocintError::Catalog(_)));
    assert!(!config.output.path.exists());
}

#[test]
fn failed_run_keeps_previous_output() {
    let fixture = Fixture::new();
    fixture.bureau("crif.txt", b"Bureau Score: 742");

    let config = fixture.config();
    RunCoordinator::new(config.clone(), vectorizer())
        .run_and_persist()
        .unwrap();
    let before = std::fs::read(&config.output.path).unwrap();

    std::fs::remove_file(&config.inputs.catalog_path).unwrap();
    assert!(RunCoordinator::new(config.clone(), vectorizer())
        .run_and_persist()
        .is_err());

    assert_eq!(std::fs::read(&config.output.path).unwrap(), before);
}

#[test]
fn confidence_scope_first_document() {
    let fixture = Fixture::new();
    fixture
        .bureau("a.txt", b"Bureau Score: 742")
        .bureau("b.txt", b"Unrelated page with no score at all");

    let mut config = fixture.config();
    config.confidence.scope = ConfidenceScope::FirstDocument;
    let report = RunCoordinator::new(config, vectorizer()).run().unwrap();

    let first = report.bureau_parameters_by_document["a.txt"]
        .get("bureau_score")
        .unwrap()
        .confidence;
    assert_eq!(report.overall_confidence_score, first);
    // Two documents: no flattened view.
    assert!(report.bureau_parameters.is_none());
}
