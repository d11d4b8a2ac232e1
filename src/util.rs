// Utility helpers for cell coercion and display formatting.
//
// This module centralizes the "dirty" CSV cell handling so the rest of the
// code can assume typed values, plus the unit formatting used on screen.
use num_format::{Locale, ToFormattedString};

pub const EOK: f64 = 100_000_000.0;
pub const MAN: f64 = 10_000.0;

/// Parse a cell into `f64`, forgiving about formatting that is common in
/// spreadsheet exports.
///
/// - Trims whitespace.
/// - Accepts exponent form (`1e8`, `3.5E9`).
/// - Rejects any other letters, so words like `nan`, `inf` or `infinity`
///   never parse.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that does not parse to a finite value.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trimmed text, or `None` for a blank cell.
pub fn parse_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Part of a total as a percentage; 0 when the total is 0.
pub fn pct(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators, e.g. `1,234.5`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        // Beyond u128 the digits are printed without separators.
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
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
    n.to_formatted_string(&Locale::en)
}

/// Currency in hundred-millions of won: `4.5 억원`.
pub fn format_eok(amount: f64) -> String {
    format!("{} 억원", format_number(amount / EOK, 1))
}

/// Counts in units of ten thousand: `8.0 만 건`.
pub fn format_man_count(count: f64) -> String {
    format!("{} 만 건", format_number(count / MAN, 1))
}

pub fn format_count(n: usize) -> String {
    format!("{} 개", format_int(n))
}

/// Plain cell rendering used by the CSV exporter. `f64`'s `Display` is
/// shortest round-trip, so re-parsing yields the same value.
pub fn render_number(v: Option<f64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}
