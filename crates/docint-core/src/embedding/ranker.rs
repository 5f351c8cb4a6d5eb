//! Cosine-similarity ranking of candidate vectors.

use crate::error::ExtractionError;

/// Best candidate for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch {
    /// Index into the candidate list.
    pub index: usize,
    /// Cosine similarity clamped into [0, 1].
    pub score: f64,
}

/// Cosine similarity of two vectors, 0.0 if either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Find the candidate most similar to `query`.
///
/// Candidates are compared on raw similarity; on an exact tie the lowest
/// index wins.
pub fn rank(query: &[f32], candidates: &[Vec<f32>]) -> Result<RankedMatch, ExtractionError> {
    if candidates.is_empty() {
        return Err(ExtractionError::NoCandidates);
    }

    let mut best_index = 0;
    let mut best_similarity = f64::NEG_INFINITY;

    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.len() != query.len() {
            return Err(ExtractionError::DimensionMismatch {
                expected: query.len(),
                actual: candidate.len(),
            });
        }

        let similarity = cosine_similarity(query, candidate);
        if similarity > best_similarity {
            best_similarity = similarity;
            best_index = index;
        }
    }

    Ok(RankedMatch {
        index: best_index,
        score: best_similarity.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_picks_most_similar() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![0.9, 0.1], vec![0.5, 0.5]];
        let best = rank(&query, &candidates).unwrap();
        assert_eq!(best.index, 1);
        assert!(best.score > 0.9);
    }

    #[test]
    fn test_rank_tie_keeps_first() {
        let query = vec![1.0, 1.0];
        let candidates = vec![vec![2.0, 2.0], vec![1.0, 1.0]];
        assert_eq!(rank(&query, &candidates).unwrap().index, 0);
    }

    #[test]
    fn test_rank_single_candidate() {
        let best = rank(&[1.0, 0.0], &[vec![0.0, 1.0]]).unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(best.score, 0.0);
    }

    #[test]
    fn test_negative_similarity_reports_zero() {
        let best = rank(&[1.0, 0.0], &[vec![-1.0, 0.0]]).unwrap();
        assert_eq!(best.score, 0.0);
    }

    #[test]
    fn test_rank_empty() {
        assert!(matches!(rank(&[1.0], &[]), Err(ExtractionError::NoCandidates)));
    }

    #[test]
    fn test_rank_dimension_mismatch() {
        let err = rank(&[1.0, 0.0], &[vec![1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::DimensionMismatch { expected: 2, actual: 3 }
        ));
    }
}
