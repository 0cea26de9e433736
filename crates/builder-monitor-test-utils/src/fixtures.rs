//! Builders, thresholds and a ready-wired monitor for tests

use crate::fakes::{FixedClock, InMemoryTrackingStore, RecordingNotifier};
use builder_monitor::aws::Builder;
use builder_monitor::monitor::{KindMonitor, Monitor};
use builder_monitor_common::{BuilderKind, Thresholds};
use chrono::{DateTime, TimeZone, Utc};

pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "us-east-1";

/// Monitor wired to in-memory collaborators
pub type TestMonitor = Monitor<InMemoryTrackingStore, RecordingNotifier, FixedClock>;

/// A fixed, arbitrary starting instant
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

/// Stop after 4 h, notify after 2 h, at most hourly, announce stops
pub fn standard_thresholds() -> Thresholds {
    Thresholds {
        stop_after_hours: 4.0,
        notify_after_hours: 2.0,
        notify_interval_hours: 1.0,
        stop_notify: true,
    }
}

pub fn builder_arn(kind: BuilderKind, region: &str, name: &str) -> String {
    let resource_type = match kind {
        BuilderKind::AppBlockBuilder => "app-block-builder",
        BuilderKind::ImageBuilder => "image-builder",
    };
    format!("arn:aws:appstream:{region}:{TEST_ACCOUNT}:{resource_type}/{name}")
}

pub fn builder(kind: BuilderKind, name: &str, state: &str) -> Builder {
    Builder {
        name: name.to_string(),
        arn: builder_arn(kind, TEST_REGION, name),
        instance_type: "stream.standard.medium".to_string(),
        state: state.to_string(),
    }
}

pub fn image_builder(name: &str, state: &str) -> Builder {
    builder(BuilderKind::ImageBuilder, name, state)
}

pub fn app_block_builder(name: &str, state: &str) -> Builder {
    builder(BuilderKind::AppBlockBuilder, name, state)
}

/// Monitor with the same thresholds for both kinds, clock at `now`
pub fn test_monitor(thresholds: Thresholds, now: DateTime<Utc>) -> TestMonitor {
    let kinds = BuilderKind::ALL
        .into_iter()
        .map(|kind| KindMonitor {
            kind,
            thresholds,
            store: InMemoryTrackingStore::new(),
        })
        .collect();
    Monitor::new(kinds, RecordingNotifier::new(), FixedClock::new(now))
}
