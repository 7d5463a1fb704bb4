//! Per-kind value parsing.

use crate::model::{Kind, Value};

/// `1/t/true` (case-insensitive) mean `true`; everything else, including an
/// absent value, means... well, absence is handled by the caller — this
/// only covers a value that was actually given. There is no failure mode
/// for bool: an unrecognized value is simply `false`.
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "t" | "true")
}

/// Decimal or `0x`/`0X`-prefixed hex, optional leading sign, overflow
/// checked by comparing against the max *before* each multiply-add step
/// rather than multiplying first and checking after.
pub fn parse_int(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    let (neg, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16u32, hex),
        None => (10u32, unsigned),
    };
    if digits.is_empty() {
        return Err(format!("{raw:?} is not a valid integer"));
    }
    let mut value: i64 = 0;
    for c in digits.chars() {
        let digit = i64::from(
            c.to_digit(radix)
                .ok_or_else(|| format!("{raw:?} is not a valid integer"))?,
        );
        if value > (i64::MAX - digit) / i64::from(radix) {
            return Err(format!("{raw:?} overflows a 64-bit integer"));
        }
        value = value * i64::from(radix) + digit;
    }
    Ok(if neg { -value } else { value })
}

/// Decimal, at most one `.`, optional sign — deliberately narrower than
/// `f64::from_str`, which also accepts exponent notation and `inf`/`nan`.
pub fn parse_float(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| matches!(c, 'e' | 'E')) {
        return Err(format!("{raw:?} is not a valid float (exponents are not accepted)"));
    }
    if trimmed.matches('.').count() > 1 {
        return Err(format!("{raw:?} has more than one decimal point"));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("{raw:?} is not a valid float"))
}

pub fn parse_enum(raw: &str, values: &[String]) -> Result<String, String> {
    if values.iter().any(|v| v == raw) {
        Ok(raw.to_string())
    } else {
        Err(format!(
            "{raw:?} is not one of: {}",
            values.join(", ")
        ))
    }
}

/// Comma-separated, whitespace-trimmed; empty segments dropped.
pub fn parse_string_seq(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_int_seq(raw: &str) -> Result<Vec<i64>, String> {
    parse_string_seq(raw).iter().map(|s| parse_int(s)).collect()
}

pub fn parse_for_kind(kind: Kind, raw: &str, enum_values: &[String]) -> Result<Value, String> {
    match kind {
        Kind::String => Ok(Value::Str(raw.to_string())),
        Kind::Int => parse_int(raw).map(Value::Int),
        Kind::Bool => Ok(Value::Bool(parse_bool(raw))),
        Kind::Float => parse_float(raw).map(Value::Float),
        Kind::Duration => super::duration::parse(raw).map(Value::Duration),
        Kind::Enum => parse_enum(raw, enum_values).map(Value::Enum),
        Kind::StringSeq => Ok(Value::StrSeq(parse_string_seq(raw))),
        Kind::IntSeq => parse_int_seq(raw).map(Value::IntSeq),
    }
}
