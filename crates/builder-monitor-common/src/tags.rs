//! Builder tag keys recognized by the monitor
//!
//! Operators opt a builder out of individual actions by tagging it. Only the
//! presence of a key matters; values are ignored.
//!
//! ## Tag Schema
//!
//! | Tag Key | Effect |
//! |---------|--------|
//! | `Skip_Stop` | Never stop the builder (also suppresses the stop notification) |
//! | `Skip_Stop_Notification` | Stop silently |
//! | `Skip_Active_Notification` | Never send "active" notifications |

use std::collections::BTreeMap;

/// Tag key that prevents automatic stops
pub const TAG_SKIP_STOP: &str = "Skip_Stop";

/// Tag key that suppresses the notification sent when stopping
pub const TAG_SKIP_STOP_NOTIFICATION: &str = "Skip_Stop_Notification";

/// Tag key that suppresses "active" notifications
pub const TAG_SKIP_ACTIVE_NOTIFICATION: &str = "Skip_Active_Notification";

/// Builder tags, ordered by key so rendered output is stable
pub type Tags = BTreeMap<String, String>;

/// Render tags the way notifications show them (pretty JSON, 2-space indent)
pub fn tags_json(tags: &Tags) -> String {
    serde_json::to_string_pretty(tags).unwrap_or_else(|_| "{}".to_string())
}
