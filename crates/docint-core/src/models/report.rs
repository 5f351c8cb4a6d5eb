//! Extraction results and the final run report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source recorded by the semantic strategy when nothing was found.
pub const NOT_FOUND_SOURCE: &str = "not_found";

/// Round a confidence value to two decimal places.
pub fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Typed value of an extracted field.
///
/// Serialized as the bare JSON value (`742`, `true`) or `null` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Boolean(bool),
    #[default]
    Absent,
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map(FieldValue::Number).unwrap_or(FieldValue::Absent)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(value: Option<bool>) -> Self {
        value.map(FieldValue::Boolean).unwrap_or(FieldValue::Absent)
    }
}

/// Outcome of extracting one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted value, or `null` when not found.
    pub value: FieldValue,
    /// Provenance citation, or a not-found marker.
    pub source: String,
    /// Confidence in [0, 1]; 0.0 when not found.
    pub confidence: f64,
}

impl ExtractionResult {
    /// A validated value with its citation; confidence is rounded to 2 places.
    pub fn found(value: FieldValue, source: impl Into<String>, confidence: f64) -> Self {
        if value.is_absent() {
            return Self::absent(NOT_FOUND_SOURCE);
        }
        Self {
            value,
            source: source.into(),
            confidence: round_confidence(confidence.clamp(0.0, 1.0)),
        }
    }

    /// The semantic strategy's not-found result.
    pub fn not_found() -> Self {
        Self::absent(NOT_FOUND_SOURCE)
    }

    /// A not-found result with a strategy-specific marker.
    pub fn absent(source: impl Into<String>) -> Self {
        Self {
            value: FieldValue::Absent,
            source: source.into(),
            confidence: 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.value.is_absent()
    }
}

/// Extraction results of one credit-bureau document, keyed by parameter key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BureauReport(BTreeMap<String, ExtractionResult>);

impl BureauReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, result: ExtractionResult) {
        self.0.insert(key.into(), result);
    }

    pub fn get(&self, key: &str) -> Option<&ExtractionResult> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtractionResult)> {
        self.0.iter()
    }

    /// Confidence of every result, in key order.
    pub fn confidences(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().map(|r| r.confidence)
    }
}

impl FromIterator<(String, ExtractionResult)> for BureauReport {
    fn from_iter<I: IntoIterator<Item = (String, ExtractionResult)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Monthly sales figure read from a tax filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Normalized period label, e.g. "April 2024".
    pub month: String,
    /// Outward taxable supplies, or `null` when not found.
    pub sales: Option<i64>,
    /// Provenance citation, or "Not Found".
    pub source: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl SalesRecord {
    /// Attach a normalized period label to an anchor extraction result.
    pub fn from_result(month: impl Into<String>, result: ExtractionResult) -> Self {
        Self {
            month: month.into(),
            sales: result.value.as_number(),
            source: result.source,
            confidence: result.confidence,
        }
    }
}

/// Kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Credit-bureau report.
    Bureau,
    /// Monthly tax filing.
    Gst,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Bureau => write!(f, "bureau"),
            DocumentKind::Gst => write!(f, "gst"),
        }
    }
}

/// A document that could not be processed in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document: String,
    pub kind: DocumentKind,
    pub error: String,
}

/// Structured output of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    /// When the run finished; the only field that differs between identical runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timestamp_utc: Option<DateTime<Utc>>,

    /// Bureau results per document id (file name).
    pub bureau_parameters_by_document: BTreeMap<String, BureauReport>,

    /// Flattened bureau results when exactly one bureau document was processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bureau_parameters: Option<BureauReport>,

    /// Sales records in document order.
    pub gst_sales: Vec<SalesRecord>,

    /// Mean of all non-zero confidences, rounded to 2 places.
    pub overall_confidence_score: f64,

    /// Documents skipped because of per-document errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_documents: Vec<DocumentFailure>,
}
