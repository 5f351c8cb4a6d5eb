//! Period label normalization.

use super::patterns::YEAR;

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Turn a file-name style label into "<Month> <year>".
///
/// The first month abbreviation (in calendar order) found in the lowercased
/// label decides the month; the first four-digit run is the year. A label
/// with no month is returned unchanged.
pub fn normalize_period(label: &str) -> String {
    let lower = label.to_lowercase();
    let year = YEAR.find(&lower).map(|m| m.as_str()).unwrap_or("");

    MONTHS
        .iter()
        .find(|(abbrev, _)| lower.contains(abbrev))
        .map(|(_, month)| format!("{} {}", month, year).trim().to_string())
        .unwrap_or_else(|| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(normalize_period("gstr3b_april_2024"), "April 2024");
        assert_eq!(normalize_period("GSTR3B_MAY_2024"), "May 2024");
    }

    #[test]
    fn test_abbreviated_month() {
        assert_eq!(normalize_period("gstr3b-sep-2023"), "September 2023");
    }

    #[test]
    fn test_missing_year() {
        assert_eq!(normalize_period("june"), "June");
    }

    #[test]
    fn test_year_ignores_non_ascii_digits() {
        assert_eq!(
            normalize_period("april_\u{0968}\u{0966}\u{0968}\u{096a}_2024"),
            "April 2024"
        );
    }

    #[test]
    fn test_unrecognized_passes_through() {
        assert_eq!(normalize_period("Q1_FY2024"), "Q1_FY2024");
    }
}
