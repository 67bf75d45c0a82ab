use anyhow::{Context, Result};
use time::format_description::{self, OwnedFormatItem};
use time::macros::format_description as fd;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::config::Config;

/// Renders article dates in one fixed offset so output never depends on the
/// build host's locale or zone.
#[derive(Debug, Clone)]
pub struct DateCanon {
    offset: UtcOffset,
    display: OwnedFormatItem,
}

impl DateCanon {
    pub fn new(offset: UtcOffset, display_format: &str) -> Result<Self> {
        let display = format_description::parse_owned::<1>(display_format)
            .with_context(|| format!("invalid date format '{display_format}'"))?;
        Ok(Self { offset, display })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.offset()?, &config.date_format)
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn local_date(&self, instant: OffsetDateTime) -> Date {
        instant.to_offset(self.offset).date()
    }

    pub fn display_date(&self, instant: OffsetDateTime) -> Result<String> {
        instant
            .to_offset(self.offset)
            .format(&self.display)
            .context("failed to format display date")
    }

    /// `YYYY-MM-DD` in the fixed offset; lexical order is chronological order.
    pub fn sort_key(&self, instant: OffsetDateTime) -> Result<String> {
        format_day(self.local_date(instant))
    }
}

pub fn format_day(date: Date) -> Result<String> {
    date.format(fd!("[year]-[month]-[day]"))
        .context("failed to format date key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    fn canon() -> DateCanon {
        DateCanon::new(UtcOffset::from_hms(9, 0, 0).unwrap(), "[year]/[month]/[day]").unwrap()
    }

    fn instant(value: &str) -> OffsetDateTime {
        OffsetDateTime::parse(value, &Rfc3339).unwrap()
    }

    #[test]
    fn display_date_is_zero_padded_in_fixed_offset() {
        let canon = canon();
        let date = instant("2024-03-04T20:30:00Z");
        assert_eq!(canon.display_date(date).unwrap(), "2024/03/05");
        assert_eq!(canon.sort_key(date).unwrap(), "2024-03-05");
    }

    #[test]
    fn host_offset_of_input_is_ignored() {
        let canon = canon();
        let a = instant("2024-01-01T00:30:00-05:00");
        let b = instant("2024-01-01T05:30:00Z");
        assert_eq!(canon.sort_key(a).unwrap(), canon.sort_key(b).unwrap());
    }

    #[test]
    fn sort_key_order_matches_chronology() {
        let canon = canon();
        let samples = [
            "2023-12-31T14:59:59Z",
            "2023-12-31T15:00:00Z",
            "2024-02-29T12:00:00Z",
            "2024-10-01T00:00:00Z",
            "2025-01-09T00:00:00Z",
        ];
        let keys: Vec<String> = samples
            .iter()
            .map(|value| canon.sort_key(instant(value)).unwrap())
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn invalid_display_format_is_rejected() {
        assert!(DateCanon::new(UtcOffset::UTC, "[year").is_err());
    }
}
