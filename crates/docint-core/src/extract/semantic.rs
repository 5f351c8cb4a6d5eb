//! Retrieval-then-parse extraction.

use std::sync::Arc;

use tracing::{debug, trace};

use super::rules::{parse_value, ValidatorSet};
use super::Extractor;
use crate::embedding::{rank, TextVectorizer};
use crate::error::{ExtractionError, Result};
use crate::models::catalog::ParameterDefinition;
use crate::models::document::Chunk;
use crate::models::report::{BureauReport, ExtractionResult};

/// Finds the chunk most similar to a parameter's description and parses it.
///
/// The confidence of a found value is the retrieval similarity of the winning
/// chunk. A parse or validation miss yields a not-found result however
/// similar the chunk was.
pub struct SemanticExtractor {
    vectorizer: Arc<dyn TextVectorizer>,
    validators: ValidatorSet,
}

impl SemanticExtractor {
    pub fn new(vectorizer: Arc<dyn TextVectorizer>, validators: ValidatorSet) -> Self {
        Self {
            vectorizer,
            validators,
        }
    }

    fn vectorize(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.vectorizer.vectorize(texts)?;
        if vectors.len() != texts.len() {
            return Err(ExtractionError::Vectorization(format!(
                "{} returned {} vectors for {} texts",
                self.vectorizer.name(),
                vectors.len(),
                texts.len()
            ))
            .into());
        }
        Ok(vectors)
    }

    fn resolve(
        &self,
        definition: &ParameterDefinition,
        query: &[f32],
        chunks: &[Chunk],
        chunk_vectors: &[Vec<f32>],
    ) -> Result<ExtractionResult> {
        let best = rank(query, chunk_vectors)?;
        let chunk = &chunks[best.index];
        trace!(
            "{}: best chunk page {} (similarity {:.4})",
            definition.key,
            chunk.page,
            best.score
        );

        let parsed = parse_value(definition.data_type, Some(&chunk.content));
        let value = self.validators.validate(&definition.key, parsed);

        if value.is_absent() {
            debug!("{}: no valid value on page {}", definition.key, chunk.page);
            return Ok(ExtractionResult::not_found());
        }

        Ok(ExtractionResult::found(
            value,
            format!("{} (page {})", definition.expected_section, chunk.page),
            best.score,
        ))
    }
}

impl Extractor for SemanticExtractor {
    fn extract(
        &self,
        chunks: &[Chunk],
        definition: &ParameterDefinition,
    ) -> Result<ExtractionResult> {
        if chunks.is_empty() {
            return Err(ExtractionError::NoCandidates.into());
        }

        let query = definition.query_text();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let query_vector = self.vectorize(&[query.as_str()])?;
        let chunk_vectors = self.vectorize(&contents)?;

        self.resolve(definition, &query_vector[0], chunks, &chunk_vectors)
    }

    /// Vectorizes all queries in one batch and all chunks in another.
    fn extract_all(
        &self,
        chunks: &[Chunk],
        definitions: &[ParameterDefinition],
    ) -> Result<BureauReport> {
        if chunks.is_empty() {
            return Err(ExtractionError::NoCandidates.into());
        }

        let queries: Vec<String> = definitions.iter().map(|d| d.query_text()).collect();
        let query_refs: Vec<&str> = queries.iter().map(String::as_str).collect();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();

        let query_vectors = self.vectorize(&query_refs)?;
        let chunk_vectors = self.vectorize(&contents)?;

        definitions
            .iter()
            .zip(&query_vectors)
            .map(|(def, query)| -> Result<(String, ExtractionResult)> {
                let result = self.resolve(def, query, chunks, &chunk_vectors)?;
                Ok((def.key.clone(), result))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "semantic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashVectorizer;
    use crate::error::DocintError;
    use crate::models::catalog::DataType;
    use crate::models::report::FieldValue;
    use pretty_assertions::assert_eq;

    fn extractor() -> SemanticExtractor {
        SemanticExtractor::new(Arc::new(HashVectorizer::new(384)), ValidatorSet::with_defaults())
    }

    fn score_definition() -> ParameterDefinition {
        ParameterDefinition::new(
            "bureau_score",
            "Bureau Score",
            "credit score",
            "Score Section",
            DataType::Number,
        )
    }

    #[test]
    fn test_finds_score_with_citation() {
        let chunks = vec![
            Chunk::new(1, "Personal information and addresses"),
            Chunk::new(2, "Bureau Score: 742 (Excellent)"),
        ];
        let result = extractor().extract(&chunks, &score_definition()).unwrap();
        assert_eq!(result.value, FieldValue::Number(742));
        assert_eq!(result.source, "Score Section (page 2)");
        assert!(result.confidence > 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn test_out_of_range_is_not_found() {
        let chunks = vec![Chunk::new(1, "Bureau Score: 250")];
        let result = extractor().extract(&chunks, &score_definition()).unwrap();
        assert_eq!(result, ExtractionResult::not_found());
    }

    #[test]
    fn test_no_chunks() {
        let err = extractor().extract(&[], &score_definition()).unwrap_err();
        assert!(matches!(
            err,
            DocintError::Extraction(ExtractionError::NoCandidates)
        ));
    }

    #[test]
    fn test_batch_matches_single() {
        let chunks = vec![
            Chunk::new(1, "Bureau Score: 742 (Excellent)"),
            Chunk::new(2, "Wilful default: No"),
        ];
        let definitions = vec![
            score_definition(),
            ParameterDefinition::new(
                "wilful_default",
                "Wilful Default",
                "wilful defaulter flag",
                "Default Summary",
                DataType::Boolean,
            ),
        ];

        let extractor = extractor();
        let report = extractor.extract_all(&chunks, &definitions).unwrap();
        assert_eq!(report.len(), 2);
        for def in &definitions {
            let single = extractor.extract(&chunks, def).unwrap();
            assert_eq!(report.get(&def.key), Some(&single));
        }
    }
}
