//! Human-friendly interval parsing.
//!
//! Supports formats like `30m`, `2h`, `1d`. A single value plus unit only,
//! matching the persisted `intervalValue`/`intervalUnit` pair.

use crate::schedule::IntervalUnit;

/// Parse an interval spec into a value and unit.
///
/// Supported unit suffixes:
/// - `m` — minutes
/// - `h` — hours
/// - `d` — days
pub fn parse_interval(s: &str) -> Result<(i64, IntervalUnit), String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty interval string".into());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing unit in {s:?}, expected m/h/d"))?;
    let (digits, suffix) = s.split_at(split);

    if digits.is_empty() {
        return Err(format!("missing number in {s:?}"));
    }
    let value: i64 = digits
        .parse()
        .map_err(|_| format!("number too large: {digits}"))?;

    let unit = match suffix {
        "m" => IntervalUnit::Minutes,
        "h" => IntervalUnit::Hours,
        "d" => IntervalUnit::Days,
        other => return Err(format!("unknown unit {other:?}, expected m/h/d")),
    };

    if value == 0 {
        return Err("interval must be greater than zero".into());
    }

    Ok((value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_interval("30m").unwrap(), (30, IntervalUnit::Minutes));
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_interval("2h").unwrap(), (2, IntervalUnit::Hours));
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_interval("1d").unwrap(), (1, IntervalUnit::Days));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(parse_interval("").is_err());
    }

    #[test]
    fn test_parse_no_suffix_fails() {
        let err = parse_interval("30").unwrap_err();
        assert!(err.contains("missing unit"), "got: {err}");
    }

    #[test]
    fn test_parse_bad_suffix_fails() {
        let err = parse_interval("30x").unwrap_err();
        assert!(err.contains("unknown unit"), "got: {err}");
    }

    #[test]
    fn test_parse_compound_fails() {
        assert!(parse_interval("1h30m").is_err());
    }

    #[test]
    fn test_parse_zero_fails() {
        let err = parse_interval("0m").unwrap_err();
        assert!(err.contains("greater than zero"), "got: {err}");
    }

    #[test]
    fn test_parse_leading_suffix_fails() {
        assert!(parse_interval("m30").is_err());
    }

    #[test]
    fn test_parse_with_whitespace_trimmed() {
        assert_eq!(parse_interval("  30m  ").unwrap(), (30, IntervalUnit::Minutes));
    }
}
