//! Canonical text form of entity values.
//!
//! Entity values travel and persist as text. Anything that looks like a
//! number is re-rendered with the entity's decimal precision so that the
//! stored form is always canonical.

use core::fmt::Write;

use super::{VALUE_LEN, Value};

/// Number of digits after the decimal point in a resolution string.
///
/// `"0.01"` gives 2, `"1"` gives 0. The count is capped at 9.
pub fn decimals_for(resolution: &str) -> u8 {
    match resolution.find('.') {
        Some(dot) => resolution[dot + 1..].chars().count().min(9) as u8,
        None => 0,
    }
}

/// Returns `true` for an optional leading minus, at most one decimal point,
/// and at least one digit, with nothing else.
pub fn is_float_like(s: &str) -> bool {
    let mut point_seen = false;
    let mut digit_seen = false;
    for (i, c) in s.chars().enumerate() {
        match c {
            '-' if i == 0 => {}
            '.' if !point_seen => point_seen = true,
            '0'..='9' => digit_seen = true,
            _ => return false,
        }
    }
    digit_seen
}

/// Re-renders float-like text with `decimals` fractional digits.
///
/// Text that is not float-like, or that cannot be rendered within
/// [`VALUE_LEN`], is returned unchanged (truncated to capacity).
pub fn normalize(raw: &str, decimals: u8) -> Value {
    if is_float_like(raw) {
        if let Ok(number) = raw.parse::<f64>() {
            let mut out = Value::new();
            if write!(out, "{:.*}", decimals as usize, number).is_ok() {
                return out;
            }
        }
    }
    truncated(raw)
}

/// Renders a float with `decimals` fractional digits.
pub fn format_float(number: f32, decimals: u8) -> Value {
    let mut out = Value::new();
    if write!(out, "{:.*}", decimals as usize, number).is_err() {
        out.clear();
    }
    out
}

/// Copies `raw` into a [`Value`], cutting at the last char boundary that fits.
pub fn truncated(raw: &str) -> Value {
    let mut end = raw.len().min(VALUE_LEN);
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = Value::new();
    // Cannot fail: `end` never exceeds capacity.
    let _ = out.push_str(&raw[..end]);
    out
}

/// Parses a leading integer the way `atoi` does: optional sign, then digits,
/// stopping at the first other character. Returns 0 when there are no digits.
pub fn parse_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut acc: i64 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        acc = (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let signed = if negative { -acc } else { acc };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Parses a float, returning 0.0 for anything unparseable.
pub fn parse_float(s: &str) -> f32 {
    s.trim().parse::<f32>().unwrap_or(0.0)
}

/// `"true"` and `"on"` (any case) and `"1"` are true; everything else is false.
pub fn parse_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("on") || s == "1"
}
