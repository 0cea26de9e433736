//! Stop/notify decision table
//!
//! Given how long a tracked builder has been active and when it was last
//! notified on, decide whether to stop it, announce the stop, or send an
//! "active" reminder. The functions here are pure; fetching tags, sending
//! notifications and issuing stops is the caller's job.
//!
//! A builder is stopped when all of the following hold:
//! - `stop_after_hours > 0`
//! - active hours `> stop_after_hours`
//! - no `Skip_Stop` tag
//!
//! A "stop" notification is sent when:
//! - the builder will be stopped
//! - stop notifications are enabled
//! - no `Skip_Stop_Notification` tag
//!
//! An "active" notification is sent when:
//! - the builder will not be stopped
//! - `notify_after_hours > 0`
//! - active hours `> notify_after_hours`
//! - at least `notify_interval_hours` passed since the last one
//! - no `Skip_Active_Notification` tag

use crate::notification::NotificationKind;
use crate::record::{TrackingRecord, expiration_for};
use crate::tags::{TAG_SKIP_ACTIVE_NOTIFICATION, TAG_SKIP_STOP, TAG_SKIP_STOP_NOTIFICATION, Tags};
use crate::duration_hours;
use chrono::{DateTime, Utc};

/// Per-kind thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Active hours after which the builder is stopped (<= 0 disables)
    pub stop_after_hours: f64,
    /// Active hours after which "active" notifications start (<= 0 disables)
    pub notify_after_hours: f64,
    /// Minimum hours between two "active" notifications for one builder
    pub notify_interval_hours: f64,
    /// Whether stopping a builder also sends a notification
    pub stop_notify: bool,
}

impl Thresholds {
    pub fn stop_enabled(&self) -> bool {
        self.stop_after_hours > 0.0
    }

    pub fn notify_enabled(&self) -> bool {
        self.notify_after_hours > 0.0
    }
}

/// Hours between the first active observation and this one.
///
/// Negative when the provider clock runs behind the stored anchor; the
/// strict threshold comparisons make that harmless.
pub fn active_hours(earliest_active: DateTime<Utc>, observed_at: DateTime<Utc>) -> f64 {
    duration_hours(observed_at - earliest_active)
}

/// Actions to take for one builder in one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision {
    pub stop: bool,
    pub notify_stop: bool,
    pub notify_active: bool,
}

impl Decision {
    /// Tentative decision before tag overrides
    pub fn evaluate(
        record: &TrackingRecord,
        observed_at: DateTime<Utc>,
        now: DateTime<Utc>,
        thresholds: &Thresholds,
    ) -> Self {
        let hours = active_hours(record.earliest_active, observed_at);
        let since_last_notification = duration_hours(now - record.last_notification);
        Self::from_hours(hours, since_last_notification, thresholds)
    }

    /// Tentative decision from precomputed durations (in hours)
    pub fn from_hours(
        active_hours: f64,
        since_last_notification_hours: f64,
        thresholds: &Thresholds,
    ) -> Self {
        let stop = thresholds.stop_enabled() && active_hours > thresholds.stop_after_hours;
        let notify_stop = stop && thresholds.stop_notify;

        // A builder being stopped never also gets an "active" reminder
        let notify_active = !stop
            && thresholds.notify_enabled()
            && active_hours > thresholds.notify_after_hours
            && since_last_notification_hours >= thresholds.notify_interval_hours;

        Self {
            stop,
            notify_stop,
            notify_active,
        }
    }

    /// Whether any action is pending, i.e. the builder's tags are needed
    pub fn needs_tags(&self) -> bool {
        self.stop || self.notify_stop || self.notify_active
    }

    /// Apply opt-out tags. Tags only ever clear flags.
    pub fn apply_tags(self, tags: &Tags) -> Self {
        let mut decision = self;
        if tags.contains_key(TAG_SKIP_STOP) {
            decision.stop = false;
            decision.notify_stop = false;
        }
        if tags.contains_key(TAG_SKIP_STOP_NOTIFICATION) {
            decision.notify_stop = false;
        }
        if tags.contains_key(TAG_SKIP_ACTIVE_NOTIFICATION) {
            decision.notify_active = false;
        }
        decision
    }

    /// The single notification to send this cycle, if any
    pub fn notification(&self) -> Option<NotificationKind> {
        if self.notify_stop {
            Some(NotificationKind::Stop)
        } else if self.notify_active {
            Some(NotificationKind::Active)
        } else {
            None
        }
    }

    /// Record mutation once the notification (if any) went out
    pub fn record_update(
        sent: Option<NotificationKind>,
        now: DateTime<Utc>,
        observed_at: DateTime<Utc>,
    ) -> RecordUpdate {
        let expiration = expiration_for(observed_at);
        match sent {
            Some(NotificationKind::Active) => RecordUpdate::NotificationSent {
                notified_at: now,
                expiration,
            },
            Some(NotificationKind::Stop) | None => RecordUpdate::ExtendExpiration { expiration },
        }
    }
}

/// Change to apply to an existing tracking record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordUpdate {
    /// An "active" notification went out: advance `last_notification`
    NotificationSent {
        notified_at: DateTime<Utc>,
        expiration: i64,
    },
    /// Keep the record alive, nothing else changes
    ExtendExpiration { expiration: i64 },
}

impl RecordUpdate {
    pub fn expiration(&self) -> i64 {
        match self {
            RecordUpdate::NotificationSent { expiration, .. }
            | RecordUpdate::ExtendExpiration { expiration } => *expiration,
        }
    }
}
