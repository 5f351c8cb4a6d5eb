//! Per-parameter validation of parsed values.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::config::{ExtractionConfig, RangeRule};
use crate::models::report::FieldValue;

/// Domain check applied to a parsed value.
///
/// Returns the value unchanged when plausible and [`FieldValue::Absent`]
/// otherwise; implementations never correct a value.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: FieldValue) -> FieldValue;
}

/// Accepts integers inside an inclusive range. Booleans pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValidator {
    pub min: i64,
    pub max: i64,
}

impl RangeValidator {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl From<RangeRule> for RangeValidator {
    fn from(rule: RangeRule) -> Self {
        Self::new(rule.min, rule.max)
    }
}

impl FieldValidator for RangeValidator {
    fn validate(&self, value: FieldValue) -> FieldValue {
        match value {
            FieldValue::Number(n) if !(self.min..=self.max).contains(&n) => {
                debug!("Discarding {} outside [{}, {}]", n, self.min, self.max);
                FieldValue::Absent
            }
            other => other,
        }
    }
}

/// Validators keyed by parameter key; unknown keys pass through.
#[derive(Default)]
pub struct ValidatorSet {
    validators: BTreeMap<String, Box<dyn FieldValidator>>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Range validators from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let mut set = Self::new();
        for (key, rule) in &config.validators {
            set.register(key.clone(), RangeValidator::from(*rule));
        }
        set
    }

    /// The built-in rules (credit score in 300..=900).
    pub fn with_defaults() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Add or replace the validator for `key`.
    pub fn register(&mut self, key: impl Into<String>, validator: impl FieldValidator + 'static) {
        self.validators.insert(key.into(), Box::new(validator));
    }

    pub fn validate(&self, key: &str, value: FieldValue) -> FieldValue {
        match self.validators.get(key) {
            Some(validator) if !value.is_absent() => validator.validate(value),
            _ => value,
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bureau_score_range() {
        let validators = ValidatorSet::with_defaults();
        assert_eq!(
            validators.validate("bureau_score", FieldValue::Number(250)),
            FieldValue::Absent
        );
        assert_eq!(
            validators.validate("bureau_score", FieldValue::Number(750)),
            FieldValue::Number(750)
        );
        assert_eq!(
            validators.validate("bureau_score", FieldValue::Number(300)),
            FieldValue::Number(300)
        );
        assert_eq!(
            validators.validate("bureau_score", FieldValue::Number(901)),
            FieldValue::Absent
        );
    }

    #[test]
    fn test_unknown_key_passes_through() {
        let validators = ValidatorSet::with_defaults();
        assert_eq!(
            validators.validate("other_key", FieldValue::Number(250)),
            FieldValue::Number(250)
        );
    }

    #[test]
    fn test_booleans_pass_range_check() {
        let validators = ValidatorSet::with_defaults();
        assert_eq!(
            validators.validate("bureau_score", FieldValue::Boolean(true)),
            FieldValue::Boolean(true)
        );
    }

    struct NonNegative;

    impl FieldValidator for NonNegative {
        fn validate(&self, value: FieldValue) -> FieldValue {
            match value {
                FieldValue::Number(n) if n < 0 => FieldValue::Absent,
                other => other,
            }
        }
    }

    #[test]
    fn test_register_custom_validator() {
        let mut validators = ValidatorSet::new();
        validators.register("dpd_days", NonNegative);
        assert_eq!(validators.len(), 1);
        assert_eq!(
            validators.validate("dpd_days", FieldValue::Number(-3)),
            FieldValue::Absent
        );
    }
}
