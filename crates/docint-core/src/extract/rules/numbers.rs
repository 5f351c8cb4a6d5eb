//! Integer parsing.

use super::patterns::NUMBER_TOKEN;

/// Parse the first plausible integer in `text`.
///
/// Thousands separators (`,`) are removed first, so both "1,234,567" and the
/// lakh grouping "12,34,567" read as one number. Only a standalone token of
/// one to nine digits counts; longer runs such as account numbers never match,
/// not even in part.
pub fn parse_number(text: Option<&str>) -> Option<i64> {
    let cleaned = text?.replace(',', "");
    NUMBER_TOKEN
        .find(cleaned.trim())
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indian_grouping() {
        assert_eq!(parse_number(Some("Rs. 1,23,456")), Some(123456));
    }

    #[test]
    fn test_none_input() {
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(parse_number(Some("Bureau Score: 742 (Excellent) as of 2024")), Some(742));
    }

    #[test]
    fn test_digit_cap_boundary() {
        assert_eq!(parse_number(Some("ID 123456789")), Some(123456789));
        assert_eq!(parse_number(Some("ID 1234567890")), None);
        assert_eq!(parse_number(Some("ID 123456789012")), None);
    }

    #[test]
    fn test_long_id_skipped_for_later_token() {
        assert_eq!(parse_number(Some("Account 123456789012 overdue 45 days")), Some(45));
    }

    #[test]
    fn test_non_ascii_digits_skipped() {
        assert_eq!(
            parse_number(Some("Score \u{0667}\u{0664}\u{0662} then 742")),
            Some(742)
        );
    }

    #[test]
    fn test_digits_inside_words_do_not_match() {
        assert_eq!(parse_number(Some("GSTR3B filing")), None);
        assert_eq!(parse_number(Some("no figures here")), None);
    }
}
