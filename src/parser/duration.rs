//! Duration grammar.
//!
//! Three tiers, tried in priority order: colon-separated (`MM:SS`,
//! `HH:MM:SS`), single extended units (`d`, `w`, `M` for month, `Y`, `m` for
//! minute), then composed multi-unit strings (`1h30m15s`, whitespace
//! tolerated) built from the usual sub-second/second/minute/hour suffixes.
//!
//! Lowercase `m` is resolved as minute: bare `m`, `min`, `minute`, `minutes`
//! all mean minute, uppercase `M` always means month, and nothing else is
//! accepted — recorded as a decision in DESIGN.md rather than left
//! ambiguous.

use std::time::Duration;

const SECOND: u64 = 1;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

pub fn parse(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if let Some(d) = parse_colon(trimmed) {
        return d;
    }
    if let Some(d) = parse_extended_unit(trimmed) {
        return d;
    }
    parse_composed(trimmed)
}

fn parse_colon(s: &str) -> Option<Result<Duration, String>> {
    if !s.contains(':') {
        return None;
    }
    let parts: Vec<&str> = s.split(':').collect();
    let nums: Option<Vec<u64>> = parts.iter().map(|p| p.parse::<u64>().ok()).collect();
    let nums = match nums {
        Some(n) => n,
        None => return Some(Err(format!("invalid colon-separated duration {s:?}"))),
    };
    let seconds = match nums.as_slice() {
        [mm, ss] => mm * MINUTE + ss,
        [hh, mm, ss] => hh * HOUR + mm * MINUTE + ss,
        _ => return Some(Err(format!("invalid colon-separated duration {s:?}"))),
    };
    Some(Ok(Duration::from_secs(seconds)))
}

fn parse_extended_unit(s: &str) -> Option<Result<Duration, String>> {
    let mut chars = s.chars();
    let last = chars.next_back()?;
    let digits: &str = &s[..s.len() - last.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let unit = match last {
        'd' => DAY,
        'w' => WEEK,
        'M' => MONTH,
        'Y' => YEAR,
        'm' => MINUTE,
        _ => return None,
    };
    let n: u64 = match digits.parse() {
        Ok(n) => n,
        Err(_) => return Some(Err(format!("invalid duration {s:?}"))),
    };
    Some(Ok(Duration::from_secs(n * unit)))
}

struct Chunk<'a> {
    digits: &'a str,
    unit: &'a str,
}

fn split_composed(s: &str) -> Result<Vec<Chunk<'_>>, String> {
    let mut chunks = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return Err(format!("expected a number at byte {i} in duration {s:?}"));
        }
        let digits = &s[start..i];
        let unit_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_digit() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == unit_start {
            return Err(format!("duration {s:?} is missing a unit suffix"));
        }
        chunks.push(Chunk {
            digits,
            unit: &s[unit_start..i],
        });
    }
    if chunks.is_empty() {
        return Err(format!("empty duration {s:?}"));
    }
    Ok(chunks)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" => Some(SECOND),
        "m" | "min" | "minute" | "minutes" => Some(MINUTE),
        "h" | "hour" | "hours" => Some(HOUR),
        _ => None,
    }
}

fn parse_composed(s: &str) -> Result<Duration, String> {
    let chunks = split_composed(s)?;
    let mut nanos: u128 = 0;
    for chunk in chunks {
        let n: u128 = chunk
            .digits
            .parse()
            .map_err(|_| format!("invalid number {:?} in duration {s:?}", chunk.digits))?;
        let unit_nanos: u128 = match chunk.unit {
            "ns" => 1,
            "us" | "\u{3bc}s" => 1_000,
            "ms" => 1_000_000,
            other => match unit_seconds(other) {
                Some(secs) => u128::from(secs) * 1_000_000_000,
                None => return Err(format!("unknown duration unit {other:?} in {s:?}")),
            },
        };
        nanos += n * unit_nanos;
    }
    let secs = (nanos / 1_000_000_000) as u64;
    let subsec_nanos = (nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec_nanos))
}
