// Utility helpers for parsing and number formatting.
//
// This module centralizes the "dirty" CSV/number handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips currency signs and thousands separators (`$1,234` -> `1234`).
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace([',', '$'], "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimal places plus locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Rounding can turn a tiny negative into zero; never print "-0".
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Dollar amount with separators, e.g. `-$1,234.50`.
pub fn format_currency(n: f64, decimals: usize) -> String {
    let body = format_number(n.abs(), decimals);
    if n < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
