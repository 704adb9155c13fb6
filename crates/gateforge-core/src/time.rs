// crates/gateforge-core/src/time.rs
// ============================================================================
// Module: GateForge Time Model
// Description: Canonical UTC timestamp representation for ledgers and audit logs.
// Purpose: Provide a single RFC 3339 timestamp type used across every artifact.
// Dependencies: time
// ============================================================================

//! ## Overview
//! GateForge artifacts are produced by single-shot commands, so unlike a
//! long-lived run state machine the engine does read wall-clock time
//! directly (via [`Timestamp::now`]) when stamping ledger records and audit
//! log rows. Callers that need deterministic output for tests can still
//! construct a [`Timestamp`] explicitly via [`Timestamp::from_unix_seconds`]
//! or [`Timestamp::parse`].

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Canonical UTC timestamp serialized as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i128);

impl Timestamp {
    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp_nanos())
    }

    /// Builds a timestamp from unix seconds (for deterministic test fixtures).
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(i128::from(seconds) * 1_000_000_000)
    }

    /// Parses an RFC 3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is not a valid RFC 3339 timestamp.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimestampError::Invalid(err.to_string()))?;
        Ok(Self(parsed.unix_timestamp_nanos()))
    }

    /// Formats the timestamp as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal value cannot be represented as a
    /// valid offset date-time (only possible for out-of-range constructed
    /// values).
    pub fn to_rfc3339(self) -> Result<String, TimestampError> {
        let dt = self.to_offset_date_time()?;
        dt.format(&Rfc3339).map_err(|err| TimestampError::Invalid(err.to_string()))
    }

    /// Returns the whole-second difference `self - other`, saturating at zero
    /// when `other` is later than `self`.
    #[must_use]
    pub fn saturating_diff_seconds(self, other: Self) -> u64 {
        let delta_nanos = self.0.saturating_sub(other.0);
        if delta_nanos <= 0 {
            0
        } else {
            u64::try_from(delta_nanos / 1_000_000_000).unwrap_or(u64::MAX)
        }
    }

    fn to_offset_date_time(self) -> Result<OffsetDateTime, TimestampError> {
        OffsetDateTime::from_unix_timestamp_nanos(self.0)
            .map_err(|err| TimestampError::Invalid(err.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str("<invalid-timestamp>"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let text = self.to_rfc3339().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Errors raised while parsing or formatting timestamps.
#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    /// The timestamp string or value is not a valid RFC 3339 instant.
    #[error("invalid timestamp: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn round_trips_through_rfc3339() {
        let original = Timestamp::from_unix_seconds(1_700_000_000);
        let text = original.to_rfc3339().unwrap_or_default();
        let parsed = Timestamp::parse(&text).unwrap_or(original);
        assert_eq!(original, parsed);
    }

    #[test]
    fn diff_saturates_at_zero() {
        let earlier = Timestamp::from_unix_seconds(100);
        let later = Timestamp::from_unix_seconds(150);
        assert_eq!(later.saturating_diff_seconds(earlier), 50);
        assert_eq!(earlier.saturating_diff_seconds(later), 0);
    }
}
