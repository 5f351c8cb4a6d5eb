//! Field extraction strategies and confidence aggregation.

mod anchor;
mod confidence;
pub mod rules;
mod semantic;

pub use anchor::{AnchorExtractor, ANCHOR_NOT_FOUND_SOURCE};
pub use confidence::{aggregate_confidence, overall_confidence};
pub use semantic::SemanticExtractor;

use std::sync::Arc;

use crate::embedding::TextVectorizer;
use crate::error::Result;
use crate::models::catalog::ParameterDefinition;
use crate::models::config::{ExtractionConfig, ExtractionStrategy};
use crate::models::document::Chunk;
use crate::models::report::{BureauReport, ExtractionResult};

use rules::ValidatorSet;

/// A strategy that locates and reads one parameter in a document.
///
/// A parameter that cannot be found is an `Ok` result with no value; `Err` is
/// reserved for failures of the whole document.
pub trait Extractor: Send + Sync {
    /// Extract a single parameter.
    fn extract(&self, chunks: &[Chunk], definition: &ParameterDefinition)
        -> Result<ExtractionResult>;

    /// Extract every parameter, keyed by parameter key.
    fn extract_all(
        &self,
        chunks: &[Chunk],
        definitions: &[ParameterDefinition],
    ) -> Result<BureauReport> {
        definitions
            .iter()
            .map(|def| -> Result<(String, ExtractionResult)> {
                Ok((def.key.clone(), self.extract(chunks, def)?))
            })
            .collect()
    }

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Build the extractor for a strategy.
pub fn make_extractor(
    strategy: ExtractionStrategy,
    vectorizer: Arc<dyn TextVectorizer>,
    config: &ExtractionConfig,
) -> Box<dyn Extractor> {
    match strategy {
        ExtractionStrategy::Semantic => Box::new(SemanticExtractor::new(
            vectorizer,
            ValidatorSet::from_config(config),
        )),
        ExtractionStrategy::Anchor => Box::new(AnchorExtractor::from_config(config)),
    }
}
