use anyhow::{Context, Result, bail};
use time::UtcOffset;

/// Parses a fixed UTC offset such as `+09:00`, `-05:30` or `UTC`.
///
/// Named zones are rejected on purpose: builds must not depend on the host's
/// tz database.
pub fn parse_timezone(value: &str) -> Result<UtcOffset> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("UTC") || trimmed.eq_ignore_ascii_case("Z") {
        return Ok(UtcOffset::UTC);
    }

    let mut chars = trimmed.chars();
    let sign_char = chars
        .next()
        .with_context(|| format!("timezone '{}' is empty", value))?;
    let sign = match sign_char {
        '+' => 1,
        '-' => -1,
        _ => bail!("timezone must start with '+' or '-'"),
    };

    let remainder = chars.as_str();
    let (hours_str, minutes_str) = match remainder.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if remainder.len() == 4 => remainder.split_at(2),
        None => (remainder, "0"),
    };

    if minutes_str.contains(':') {
        bail!("timezone '{}' has too many components", value);
    }

    let hours: i8 = hours_str
        .parse()
        .with_context(|| format!("timezone '{}' hour component invalid", value))?;
    let minutes: i8 = minutes_str
        .parse()
        .with_context(|| format!("timezone '{}' minute component invalid", value))?;

    UtcOffset::from_hms(sign * hours, sign * minutes, 0)
        .with_context(|| format!("timezone '{}' out of range", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_utc_variants() {
        assert_eq!(parse_timezone("UTC").unwrap(), UtcOffset::UTC);
        assert_eq!(parse_timezone("Z").unwrap(), UtcOffset::UTC);
        assert_eq!(parse_timezone(" utc ").unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn parse_positive_offset() {
        let offset = parse_timezone("+09:00").unwrap();
        assert_eq!(offset.whole_hours(), 9);
    }

    #[test]
    fn parse_compact_offset() {
        let offset = parse_timezone("+0530").unwrap();
        assert_eq!(offset.whole_hours(), 5);
        assert_eq!(offset.minutes_past_hour(), 30);
    }

    #[test]
    fn parse_negative_offset() {
        let offset = parse_timezone("-08:00").unwrap();
        assert_eq!(offset.whole_hours(), -8);
    }

    #[test]
    fn reject_invalid_format() {
        assert!(parse_timezone("Asia/Tokyo").is_err());
        assert!(parse_timezone("+09:00:00").is_err());
        assert!(parse_timezone("").is_err());
    }
}
