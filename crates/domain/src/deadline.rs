//! Marketplace wall-clock timestamps.
//!
//! The marketplace writes timestamps as `DD.MM.YYYY HH:MM:SS` with no zone.
//! They are its own local time, so they are kept naive and only pinned to an
//! instant with an explicit [`FixedOffset`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Format of every timestamp the marketplace sends or accepts.
pub const MARKET_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// A timestamp could not be read in marketplace format.
#[derive(Debug, Error)]
#[error("Invalid marketplace timestamp '{input}': {source}")]
pub struct TimestampError {
    input: String,
    #[source]
    source: chrono::ParseError,
}

/// A wall-clock time in the marketplace's local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketTimestamp(NaiveDateTime);

impl MarketTimestamp {
    /// Parses `DD.MM.YYYY HH:MM:SS`.
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        NaiveDateTime::parse_from_str(input.trim(), MARKET_DATETIME_FORMAT)
            .map(Self)
            .map_err(|source| TimestampError {
                input: input.to_string(),
                source,
            })
    }

    /// Wall-clock reading of `instant` in a zone with the given offset.
    pub fn from_instant(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(instant.with_timezone(&offset).naive_local())
    }

    /// Pins the wall-clock time to an instant using the marketplace offset.
    ///
    /// Returns `None` when the instant falls outside the representable range.
    pub fn at_offset(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        let utc = self
            .0
            .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))?;
        Some(DateTime::from_naive_utc_and_offset(utc, offset))
    }

    /// Returns the naive wall-clock value.
    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for MarketTimestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Self(naive)
    }
}

impl std::fmt::Display for MarketTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(MARKET_DATETIME_FORMAT))
    }
}

impl Serialize for MarketTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MarketTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Offset for a whole number of hours east of UTC, if in range.
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}
