//! Timestamp parsing and formatting for the formats archives are known to use

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::format_description::{self, BorrowedFormatItem};
use time::macros::format_description;

/// Error type for timestamp handling
#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("Timestamp '{0}' matches none of the known formats")]
    Unparseable(String),
    #[error("Invalid output pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("Failed to format timestamp: {0}")]
    Format(String),
}

/// `Mon Jun 29 15:46:31 +0000 2009` (API and early archives)
const TWITTER_CLASSIC: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
);

/// `2017-08-17 12:57:51 +0000` (archives downloaded after mid-2013)
const ARCHIVE_SPACED: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

/// `2017-08-17T12:57:51+0000`
const ISO_COMPACT_OFFSET: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
);

/// `2017-08-17T12:57:51+00:00`
const ISO_COLON_OFFSET: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// Parse a raw timestamp, trying each known format in order
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, TimestampError> {
    let raw = raw.trim();
    [TWITTER_CLASSIC, ARCHIVE_SPACED, ISO_COMPACT_OFFSET, ISO_COLON_OFFSET]
        .into_iter()
        .find_map(|format| OffsetDateTime::parse(raw, format).ok())
        // Mastodon: `2022-11-05T12:34:56.000Z`
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok())
        .ok_or_else(|| TimestampError::Unparseable(raw.to_string()))
}

/// Reformat a raw timestamp with a `time` format description
/// (e.g. `[year]-[month]-[day] [hour]:[minute]`)
pub fn format_timestamp(raw: &str, pattern: &str) -> Result<String, TimestampError> {
    let items = format_description::parse_owned::<2>(pattern).map_err(|e| {
        TimestampError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }
    })?;
    let parsed = parse_timestamp(raw)?;
    parsed
        .format(&items)
        .map_err(|e| TimestampError::Format(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

    #[test]
    fn test_classic_format() {
        assert_eq!(
            format_timestamp("Mon Jun 29 15:46:31 +0000 2009", PATTERN).unwrap(),
            "2009-06-29 15:46:31"
        );
    }

    #[test]
    fn test_archive_spaced_format() {
        assert_eq!(
            format_timestamp("2017-08-17 12:57:51 +0000", PATTERN).unwrap(),
            "2017-08-17 12:57:51"
        );
    }

    #[test]
    fn test_iso_formats() {
        assert_eq!(
            format_timestamp("2017-08-17T12:57:51+0000", PATTERN).unwrap(),
            "2017-08-17 12:57:51"
        );
        assert_eq!(
            format_timestamp("2017-08-17T12:57:51+08:00", PATTERN).unwrap(),
            "2017-08-17 12:57:51"
        );
        assert_eq!(
            format_timestamp("2022-11-05T12:34:56.000Z", PATTERN).unwrap(),
            "2022-11-05 12:34:56"
        );
    }

    #[test]
    fn test_offset_is_kept() {
        let parsed = parse_timestamp("2017-08-17 12:57:51 +0800").unwrap();
        assert_eq!(parsed.offset().whole_hours(), 8);
    }

    #[test]
    fn test_unknown_format_fails() {
        assert!(matches!(
            format_timestamp("yesterday", PATTERN),
            Err(TimestampError::Unparseable(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_fails() {
        assert!(matches!(
            format_timestamp("2017-08-17 12:57:51 +0000", "[nonsense]"),
            Err(TimestampError::InvalidPattern { .. })
        ));
    }
}
