//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main configuration for a docint run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocintConfig {
    /// Input document and catalog locations.
    pub inputs: InputConfig,

    /// Output file configuration.
    pub output: OutputConfig,

    /// Vectorizer backend configuration.
    pub vectorizer: VectorizerConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Overall confidence configuration.
    pub confidence: ConfidenceConfig,
}

/// Where the run reads its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory of credit-bureau reports.
    pub bureau_dir: PathBuf,

    /// Directory of monthly tax filings; file stems carry the period label.
    pub gst_dir: PathBuf,

    /// Parameter catalog (CSV).
    pub catalog_path: PathBuf,

    /// Recognized document extensions (lowercase, without the dot).
    pub extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bureau_dir: PathBuf::from("data/crif_reports"),
            gst_dir: PathBuf::from("data/gstr3b_reports"),
            catalog_path: PathBuf::from("data/parameters.csv"),
            extensions: vec!["pdf".to_string(), "txt".to_string()],
        }
    }
}

/// Persisted report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report file, replaced atomically at the end of each run.
    pub path: PathBuf,

    /// Also emit `bureau_parameters` when exactly one bureau document was processed.
    pub flatten_single_document: bool,

    /// Emit `run_timestamp_utc`.
    pub include_timestamp: bool,

    /// Pretty-print the JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("outputs/final_output.json"),
            flatten_single_document: true,
            include_timestamp: true,
            pretty: true,
        }
    }
}

/// Vectorizer backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerBackend {
    /// ONNX sentence encoder.
    Onnx,
    /// Deterministic feature hashing, no model files required.
    Hash,
}

/// Vectorizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub backend: VectorizerBackend,

    /// Directory holding the encoder files.
    pub model_dir: PathBuf,

    /// Encoder graph file name.
    pub model_file: String,

    /// Hugging Face `tokenizer.json` of the encoder.
    pub tokenizer_file: String,

    /// Every sequence is padded or truncated to this many tokens.
    pub max_sequence_length: usize,

    /// Intra-op threads for the ONNX session.
    pub num_threads: usize,

    /// Dimension of the hashing vectorizer.
    pub hash_dimension: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            backend: VectorizerBackend::Onnx,
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            max_sequence_length: 256,
            num_threads: 4,
            hash_dimension: 384,
        }
    }
}

impl VectorizerConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(&self.tokenizer_file)
    }
}

/// Which extractor handles a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Retrieve the most similar chunk, then parse it.
    Semantic,
    /// Find a fixed label and read the number after it.
    Anchor,
}

/// Inclusive range accepted for a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRule {
    pub min: i64,
    pub max: i64,
}

/// A field located by a fixed label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRule {
    /// Parameter key this rule applies to.
    pub key: String,

    /// Label that precedes the value.
    pub phrase: String,

    /// Match the label regardless of case when locating the chunk.
    #[serde(default)]
    pub case_insensitive: bool,

    /// Longest digit run accepted as the value.
    #[serde(default = "default_max_digits")]
    pub max_digits: usize,

    /// Citation recorded when the value is found.
    pub source: String,

    /// Confidence recorded when the value is found.
    #[serde(default = "default_anchor_confidence")]
    pub confidence: f64,
}

fn default_max_digits() -> usize {
    12
}

fn default_anchor_confidence() -> f64 {
    0.99
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Strategy for credit-bureau reports.
    pub bureau_strategy: ExtractionStrategy,

    /// Strategy for tax filings.
    pub gst_strategy: ExtractionStrategy,

    /// Parameter key of the sales figure read from tax filings.
    pub gst_field_key: String,

    /// Accepted ranges per numeric parameter key.
    pub validators: BTreeMap<String, RangeRule>,

    /// Anchor rules per parameter key.
    pub anchors: Vec<AnchorRule>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let mut validators = BTreeMap::new();
        validators.insert("bureau_score".to_string(), RangeRule { min: 300, max: 900 });

        Self {
            bureau_strategy: ExtractionStrategy::Semantic,
            gst_strategy: ExtractionStrategy::Anchor,
            gst_field_key: "gst_sales".to_string(),
            validators,
            anchors: vec![AnchorRule {
                key: "gst_sales".to_string(),
                phrase: "Outward taxable supplies".to_string(),
                case_insensitive: false,
                max_digits: default_max_digits(),
                source: "GSTR-3B Table 3.1(a)".to_string(),
                confidence: default_anchor_confidence(),
            }],
        }
    }
}

impl ExtractionConfig {
    /// Anchor rule configured for a parameter key.
    pub fn anchor_rule(&self, key: &str) -> Option<&AnchorRule> {
        self.anchors.iter().find(|r| r.key == key)
    }
}

/// Which bureau documents feed the overall confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceScope {
    /// Every processed bureau document.
    #[default]
    AllDocuments,
    /// Only the first bureau document in file-name order.
    FirstDocument,
}

/// Overall confidence configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub scope: ConfidenceScope,
}

impl DocintConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Anchor rule configured for a parameter key.
    pub fn anchor_rule(&self, key: &str) -> Option<&AnchorRule> {
        self.extraction.anchor_rule(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "vectorizer": { "backend": "hash", "hash_dimension": 64 } }"#;
        let config: DocintConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.vectorizer.backend, VectorizerBackend::Hash);
        assert_eq!(config.vectorizer.hash_dimension, 64);
        assert_eq!(config.vectorizer.model_file, "model.onnx");
        assert_eq!(
            config.vectorizer.tokenizer_path(),
            PathBuf::from("models/all-MiniLM-L6-v2/tokenizer.json")
        );
        assert_eq!(config.inputs, InputConfig::default());
        assert_eq!(
            config.extraction.validators.get("bureau_score"),
            Some(&RangeRule { min: 300, max: 900 })
        );
    }

    #[test]
    fn test_default_anchor_rule() {
        let config = DocintConfig::default();
        assert_eq!(config.anchor_rule("gst_sales"), config.extraction.anchor_rule("gst_sales"));
        assert!(config.extraction.anchor_rule("bureau_score").is_none());

        let rule = config.extraction.anchor_rule("gst_sales").unwrap();
        assert_eq!(rule.phrase, "Outward taxable supplies");
        assert_eq!(rule.confidence, 0.99);
        assert_eq!(rule.max_digits, 12);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocintConfig::default();
        config.confidence.scope = ConfidenceScope::FirstDocument;
        config.save(&path).unwrap();

        let loaded = DocintConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
