// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" number handling of the exports so the
// aggregation code can work with clean `f64` values.
use num_format::{Locale, ToFormattedString};

const GROUP_SEPARATORS: [char; 3] = [' ', '\u{a0}', '\u{202f}'];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace and drops space-like group separators (`1\u{a0}234`).
/// - Rejects values that contain alphabetic characters.
/// - A single comma with no dot is a decimal comma (`3,5`) unless exactly
///   three digits follow it (`1,234`); other commas are thousands separators.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let s: String = s.chars().filter(|c| !GROUP_SEPARATORS.contains(c)).collect();
    let s = match s.split_once(',') {
        Some((_, frac)) if !frac.contains(',') && !s.contains('.') && !is_digit_group(frac) => {
            s.replace(',', ".")
        }
        _ => s.replace(',', ""),
    };
    s.parse::<f64>().ok()
}

fn is_digit_group(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an operator-entered integer. Blank input yields `None`.
pub fn parse_u64_safe(s: &str) -> Option<Result<u64, std::num::ParseIntError>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.parse::<u64>())
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn median(mut v: Vec<f64>) -> f64 {
    // Takes `Vec<f64>` by value so it can sort in place.
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    }
}

/// Round to `decimals` places, ties to even. NaN stays NaN.
pub fn round_to(n: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (n * factor).round_ties_even() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators
    // (e.g. `1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `9,855 rows`.
    n.to_formatted_string(&Locale::en)
}
