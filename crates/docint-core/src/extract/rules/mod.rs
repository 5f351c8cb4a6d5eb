//! Typed value parsing, period labels and per-parameter validation.

pub mod booleans;
pub mod numbers;
pub mod patterns;
pub mod periods;
pub mod validators;

pub use booleans::parse_boolean;
pub use numbers::parse_number;
pub use periods::normalize_period;
pub use validators::{FieldValidator, RangeValidator, ValidatorSet};

use crate::models::catalog::DataType;
use crate::models::report::FieldValue;

/// Parse a raw value of the given type from free text.
pub fn parse_value(data_type: DataType, text: Option<&str>) -> FieldValue {
    match data_type {
        DataType::Number => parse_number(text).into(),
        DataType::Boolean => parse_boolean(text).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_dispatch() {
        assert_eq!(
            parse_value(DataType::Number, Some("Score 742")),
            FieldValue::Number(742)
        );
        assert_eq!(
            parse_value(DataType::Boolean, Some("Suit filed: Yes")),
            FieldValue::Boolean(true)
        );
        assert_eq!(parse_value(DataType::Boolean, Some("n/a")), FieldValue::Absent);
    }
}
