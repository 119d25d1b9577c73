// src/process/utils.rs

use once_cell::sync::Lazy;
use regex::Regex;

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.]").expect("non-numeric pattern should compile"));

/// 1) Drop every character that is not an ASCII digit or `.`.
///
/// A leading `-` goes too, so refunds show up as positive magnitudes.
pub fn strip_amount(raw: &str) -> String {
    NON_NUMERIC.replace_all(raw, "").into_owned()
}

/// 2) Parse the longest numeric prefix (`digits[.digits]`), ignoring
/// anything after a second `.`. Returns `None` when no digit is present.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Strip and parse an amount cell in one go. Digit runs too long for an
/// `f64` count as unparsed rather than infinity.
pub fn coerce_amount(raw: &str) -> Option<f64> {
    parse_leading_float(&strip_amount(raw)).filter(|v| v.is_finite())
}

/// 3) Trim a name cell; blank names become `None`.
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_noise_is_stripped() {
        assert_eq!(coerce_amount("$1,250.75"), Some(1250.75));
        assert_eq!(coerce_amount(" 75.50 USD"), Some(75.5));
    }

    #[test]
    fn minus_sign_is_dropped() {
        assert_eq!(strip_amount("-40"), "40");
        assert_eq!(coerce_amount("-40"), Some(40.0));
    }

    #[test]
    fn extra_dots_truncate() {
        assert_eq!(parse_leading_float("1.2.3"), Some(1.2));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
    }

    #[test]
    fn no_digits_is_none() {
        assert_eq!(coerce_amount(""), None);
        assert_eq!(coerce_amount("n/a"), None);
        assert_eq!(coerce_amount("."), None);
        assert_eq!(coerce_amount("..5"), None);
    }

    #[test]
    fn overflowing_amount_is_unparsed() {
        let huge = "9".repeat(400);
        assert_eq!(parse_leading_float(&huge), Some(f64::INFINITY));
        assert_eq!(coerce_amount(&huge), None);
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(clean_name("  Al \r"), Some("Al".to_string()));
        assert_eq!(clean_name("   "), None);
    }
}
