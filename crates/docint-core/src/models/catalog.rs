//! Parameter catalog: the externally supplied list of fields to extract.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;

/// Columns every catalog must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "parameter_key",
    "parameter_name",
    "description",
    "expected_section",
    "data_type",
];

/// Declared type of a parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Number,
    Boolean,
}

impl FromStr for DataType {
    type Err = String;

    /// Parse the catalog spelling of a data type, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "number" => Ok(DataType::Number),
            "boolean" => Ok(DataType::Boolean),
            other => Err(format!("unknown data_type '{}'", other)),
        }
    }
}

/// One parameter the engine should extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Unique key, used as the report field name.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Free-text description of the field.
    pub description: String,
    /// Document section the field is expected in; cited as the source.
    pub expected_section: String,
    /// Declared value type.
    pub data_type: DataType,
}

impl ParameterDefinition {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        expected_section: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            expected_section: expected_section.into(),
            data_type,
        }
    }

    /// Semantic query used to retrieve the chunk holding this parameter.
    pub fn query_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.expected_section)
    }
}

/// Row layout of the catalog file.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    parameter_key: String,
    parameter_name: String,
    description: String,
    expected_section: String,
    data_type: String,
}

/// Ordered, read-only set of parameter definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterCatalog {
    definitions: Vec<ParameterDefinition>,
}

impl ParameterCatalog {
    /// Build a catalog from definitions, rejecting duplicate keys.
    pub fn new(definitions: Vec<ParameterDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.key.as_str()) {
                return Err(CatalogError::DuplicateKey(def.key.clone()));
            }
        }
        Ok(Self { definitions })
    }

    /// Load a catalog from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        debug!("Loading parameter catalog from {}", path.display());
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    /// Load a catalog from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, CatalogError> {
        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column.to_string()));
            }
        }

        let mut definitions = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let row: CatalogRow = record
                .deserialize(Some(&headers))
                .map_err(|e| CatalogError::InvalidRow {
                    line,
                    reason: e.to_string(),
                })?;

            if row.parameter_key.is_empty() {
                return Err(CatalogError::InvalidRow {
                    line,
                    reason: "empty parameter_key".to_string(),
                });
            }

            let data_type = row
                .data_type
                .parse::<DataType>()
                .map_err(|reason| CatalogError::InvalidRow { line, reason })?;

            definitions.push(ParameterDefinition {
                key: row.parameter_key,
                name: row.parameter_name,
                description: row.description,
                expected_section: row.expected_section,
                data_type,
            });
        }

        debug!("Loaded {} parameter definitions", definitions.len());
        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[ParameterDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Look up a definition by key.
    pub fn get(&self, key: &str) -> Option<&ParameterDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }
}
