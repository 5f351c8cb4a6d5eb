//! Yes/no parsing.

/// Parse a yes/no flag from free text, case-insensitively.
///
/// "yes" or "default" anywhere means `true`; otherwise "no" or a "0" anywhere
/// means `false`. The `true` triggers are checked first, so text containing
/// both reads as `true`.
pub fn parse_boolean(text: Option<&str>) -> Option<bool> {
    let text = text?.to_lowercase();

    if text.contains("yes") || text.contains("default") {
        Some(true)
    } else if text.contains("no") || text.contains('0') {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_priority() {
        assert_eq!(
            parse_boolean(Some("Status: Default reported, not current")),
            Some(true)
        );
    }

    #[test]
    fn test_false_triggers() {
        assert_eq!(parse_boolean(Some("Suit Filed: NO")), Some(false));
        assert_eq!(parse_boolean(Some("Overdue accounts: 0")), Some(false));
    }

    #[test]
    fn test_no_trigger() {
        assert_eq!(parse_boolean(Some("Active")), None);
        assert_eq!(parse_boolean(None), None);
    }
}
