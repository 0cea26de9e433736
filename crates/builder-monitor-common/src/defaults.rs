//! Default values shared by the monitor and its tests

use chrono::{DateTime, Duration, TimeZone, Utc};

/// How long a tracking record outlives its last refresh before the table's
/// TTL reclaims it
pub fn record_ttl() -> Duration {
    Duration::days(1)
}

/// `last_notification` value of a record that has never been notified on
///
/// Far enough in the past that the first eligible notification always fires.
pub fn never_notified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_never_notified_is_year_one() {
        let ts = never_notified();
        assert_eq!(ts.year(), 1);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 1);
    }

    #[test]
    fn test_record_ttl() {
        assert_eq!(record_ttl(), Duration::hours(24));
    }
}
