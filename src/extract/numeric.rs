//! Digit-only numeric coercion and price token parsing

use regex::Regex;
use std::sync::OnceLock;

/// Currency-suffixed amount: a digit, then digits, dots or spaces on the
/// same line, then the euro sign.
fn price_regex() -> &'static Regex {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    PRICE.get_or_init(|| Regex::new(r"(\d[\d. \u{00A0}]*)\s*€").expect("static regex"))
}

/// Strips every non-digit character and parses what remains
///
/// Returns `None` for empty input, input without digits, or digit runs
/// that overflow a `u64`.
///
/// # Example
///
/// ```
/// use listing_harvester::extract::to_int;
///
/// assert_eq!(to_int(Some("123.456 km")), Some(123456));
/// assert_eq!(to_int(Some("")), None);
/// assert_eq!(to_int(None), None);
/// ```
pub fn to_int(raw: Option<&str>) -> Option<u64> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Finds the first euro amount in the page text, e.g. `"19.900 €"` → 19900
pub fn extract_price(text: &str) -> Option<u64> {
    let captures = price_regex().captures(text)?;
    to_int(captures.get(1).map(|m| m.as_str()))
}
