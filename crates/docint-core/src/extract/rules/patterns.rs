//! Common regex patterns for value parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A standalone run of at most nine ASCII digits
    pub static ref NUMBER_TOKEN: Regex = Regex::new(r"\b[0-9]{1,9}\b").unwrap();

    // First four-digit run in a period label
    pub static ref YEAR: Regex = Regex::new(r"[0-9]{4}").unwrap();
}
