//! Overall confidence of a run.

use std::collections::BTreeMap;

use crate::models::config::ConfidenceScope;
use crate::models::report::{round_confidence, BureauReport, SalesRecord};

/// Mean of the strictly positive confidences, rounded to two places.
///
/// Not-found results (confidence 0.0) are left out rather than counted as
/// zero. With nothing found the aggregate is 0.0.
pub fn aggregate_confidence<I>(confidences: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = confidences
        .into_iter()
        .filter(|&c| c > 0.0)
        .fold((0.0, 0usize), |(sum, count), c| (sum + c, count + 1));

    if count == 0 {
        0.0
    } else {
        round_confidence(sum / count as f64)
    }
}

/// Overall confidence over bureau results and sales records.
///
/// Bureau documents are taken in document-id order; `FirstDocument` keeps
/// only the first of them.
pub fn overall_confidence(
    bureau: &BTreeMap<String, BureauReport>,
    sales: &[SalesRecord],
    scope: ConfidenceScope,
) -> f64 {
    let take = match scope {
        ConfidenceScope::AllDocuments => bureau.len(),
        ConfidenceScope::FirstDocument => 1,
    };

    let bureau_scores = bureau
        .values()
        .take(take)
        .flat_map(BureauReport::confidences);
    let sales_scores = sales.iter().map(|s| s.confidence);

    aggregate_confidence(bureau_scores.chain(sales_scores))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{ExtractionResult, FieldValue};

    #[test]
    fn test_excludes_not_found() {
        assert_eq!(aggregate_confidence([0.8, 0.0, 0.6]), 0.7);
    }

    #[test]
    fn test_all_zero() {
        assert_eq!(aggregate_confidence([0.0, 0.0]), 0.0);
        assert_eq!(aggregate_confidence(Vec::new()), 0.0);
    }

    fn report(confidence: f64) -> BureauReport {
        let mut report = BureauReport::new();
        report.insert(
            "bureau_score",
            ExtractionResult::found(FieldValue::Number(742), "Score (page 1)", confidence),
        );
        report.insert("wilful_default", ExtractionResult::not_found());
        report
    }

    #[test]
    fn test_scope() {
        let mut bureau = BTreeMap::new();
        bureau.insert("a.pdf".to_string(), report(0.61));
        bureau.insert("b.pdf".to_string(), report(0.9));
        let sales = vec![SalesRecord {
            month: "April 2024".into(),
            sales: Some(500000),
            source: "GSTR-3B Table 3.1(a)".into(),
            confidence: 0.99,
        }];

        // (0.61 + 0.9 + 0.99) / 3
        assert_eq!(
            overall_confidence(&bureau, &sales, ConfidenceScope::AllDocuments),
            0.83
        );
        // (0.61 + 0.99) / 2
        assert_eq!(
            overall_confidence(&bureau, &sales, ConfidenceScope::FirstDocument),
            0.8
        );
    }
}
