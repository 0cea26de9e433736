//! builder-monitor-common - Shared types and decision logic
//!
//! This crate holds everything the monitor needs to decide what to do with a
//! builder, without any AWS SDK dependencies so the rules can be tested in
//! isolation.
//!
//! ## Modules
//!
//! - [`decision`]: Stop/notify decision table and tag overrides
//! - [`defaults`]: Record lifetime and sentinel timestamps
//! - [`notification`]: Notification subject/body formatting
//! - [`record`]: Tracking record and its timestamp codec
//! - [`resource_kind`]: Builder kinds and their active lifecycle states
//! - [`tags`]: Opt-out tag keys

pub mod decision;
pub mod defaults;
pub mod notification;
pub mod record;
pub mod resource_kind;
pub mod tags;

// Re-export commonly used types
pub use decision::{Decision, RecordUpdate, Thresholds};
pub use notification::{AccountId, BuilderArn, BuilderSummary, Notification, NotificationKind};
pub use record::{RecordError, RecordKey, TrackingRecord};
pub use resource_kind::BuilderKind;
pub use tags::Tags;

/// Convert a signed duration into fractional hours.
///
/// Millisecond precision is plenty for thresholds expressed in hours.
#[inline]
pub fn duration_hours(duration: chrono::Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}
