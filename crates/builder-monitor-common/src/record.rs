//! Tracking records
//!
//! One record exists per builder that has been seen active and not yet seen
//! inactive. It anchors the active-duration computation and remembers when
//! the last "active" notification went out.

use crate::defaults::{never_notified, record_ttl};
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors decoding a persisted tracking record
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required attribute is absent or has the wrong type
    #[error("tracking record for {name} is missing attribute '{attribute}'")]
    MissingAttribute {
        name: String,
        attribute: &'static str,
    },

    /// A timestamp attribute could not be parsed
    #[error("tracking record for {name} has invalid {attribute}: {value}")]
    InvalidTimestamp {
        name: String,
        attribute: &'static str,
        value: String,
    },
}

/// Composite key of a tracking record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub region: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(region: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            name: name.into(),
        }
    }
}

/// Persisted tracking state for one builder
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    pub key: RecordKey,
    /// First time the builder was observed active. Never updated.
    pub earliest_active: DateTime<Utc>,
    /// Last time an "active" notification was sent
    pub last_notification: DateTime<Utc>,
    /// Epoch seconds after which the store may drop the record
    pub expiration: i64,
}

impl TrackingRecord {
    /// Record for a builder observed active for the first time
    pub fn first_seen(key: RecordKey, observed_at: DateTime<Utc>) -> Self {
        Self {
            key,
            earliest_active: observed_at,
            last_notification: never_notified(),
            expiration: expiration_for(observed_at),
        }
    }
}

/// Expiration (epoch seconds) for a record refreshed at `observed_at`
pub fn expiration_for(observed_at: DateTime<Utc>) -> i64 {
    (observed_at + record_ttl()).timestamp()
}

/// Format a timestamp for storage (RFC 3339, UTC)
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and, for records written without an offset, naive
/// ISO-8601 interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
