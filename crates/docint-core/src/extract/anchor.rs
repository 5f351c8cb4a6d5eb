//! Extraction of fields identified by a fixed label.

use regex::Regex;
use tracing::{debug, trace};

use super::Extractor;
use crate::error::{DocintError, Result};
use crate::models::catalog::ParameterDefinition;
use crate::models::config::{AnchorRule, ExtractionConfig};
use crate::models::document::Chunk;
use crate::models::report::{ExtractionResult, FieldValue};

/// Source recorded when an anchored field is missing.
pub const ANCHOR_NOT_FOUND_SOURCE: &str = "Not Found";

/// Reads the number that follows a known label.
///
/// The first chunk containing the label is the only one read. The label must
/// appear verbatim unless the rule is case-insensitive; the number after it
/// is always matched case-insensitively on the label, on the same line.
#[derive(Debug, Clone, Default)]
pub struct AnchorExtractor {
    rules: Vec<AnchorRule>,
}

impl AnchorExtractor {
    pub fn new(rules: Vec<AnchorRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.anchors.clone())
    }

    /// The configured rule for a parameter, or one anchored on its name.
    fn rule_for(&self, definition: &ParameterDefinition) -> AnchorRule {
        self.rules
            .iter()
            .find(|rule| rule.key == definition.key)
            .cloned()
            .unwrap_or_else(|| AnchorRule {
                key: definition.key.clone(),
                phrase: definition.name.clone(),
                case_insensitive: false,
                max_digits: 12,
                source: definition.expected_section.clone(),
                confidence: 0.99,
            })
    }

    fn value_pattern(rule: &AnchorRule) -> Result<Regex> {
        let pattern = format!(
            r"(?i){}.*?([0-9]{{1,{}}})",
            regex::escape(&rule.phrase),
            rule.max_digits.max(1)
        );
        Regex::new(&pattern).map_err(|e| {
            DocintError::Config(format!("invalid anchor for {}: {}", rule.key, e))
        })
    }
}

fn contains_phrase(content: &str, phrase: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        content.to_lowercase().contains(&phrase.to_lowercase())
    } else {
        content.contains(phrase)
    }
}

impl Extractor for AnchorExtractor {
    fn extract(
        &self,
        chunks: &[Chunk],
        definition: &ParameterDefinition,
    ) -> Result<ExtractionResult> {
        let rule = self.rule_for(definition);
        let pattern = Self::value_pattern(&rule)?;

        let Some(chunk) = chunks
            .iter()
            .find(|c| contains_phrase(&c.content, &rule.phrase, rule.case_insensitive))
        else {
            debug!("{}: anchor {:?} not present", rule.key, rule.phrase);
            return Ok(ExtractionResult::absent(ANCHOR_NOT_FOUND_SOURCE));
        };

        let value = pattern
            .captures(&chunk.content)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok());

        match value {
            Some(n) => {
                trace!("{}: {} on page {}", rule.key, n, chunk.page);
                Ok(ExtractionResult::found(
                    FieldValue::Number(n),
                    rule.source,
                    rule.confidence,
                ))
            }
            None => {
                debug!("{}: no number after anchor on page {}", rule.key, chunk.page);
                Ok(ExtractionResult::absent(ANCHOR_NOT_FOUND_SOURCE))
            }
        }
    }

    fn name(&self) -> &str {
        "anchor"
    }
}
