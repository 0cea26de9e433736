//! Per-kind and per-cycle counters

use builder_monitor_common::{BuilderKind, NotificationKind};
use tracing::{info, warn};

/// What happened to one active builder in one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuilderOutcome {
    /// First active observation; a record was created and nothing else done
    pub newly_tracked: bool,
    pub notification: Option<NotificationKind>,
    pub stopped: bool,
}

impl BuilderOutcome {
    pub fn newly_tracked() -> Self {
        Self {
            newly_tracked: true,
            ..Default::default()
        }
    }
}

/// Counters for one builder kind in one region
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct KindReport {
    pub region: String,
    pub kind: BuilderKind,
    pub found: usize,
    pub active: usize,
    pub newly_tracked: usize,
    pub active_notifications: usize,
    pub stop_notifications: usize,
    pub stops: usize,
    /// Inactive builders whose tracking record was cleared
    pub untracked: usize,
    /// Builders whose processing failed
    pub failures: usize,
    /// The listing itself failed and nothing was processed
    pub listing_failed: bool,
}

impl KindReport {
    pub fn new(region: &str, kind: BuilderKind) -> Self {
        Self {
            region: region.to_string(),
            kind,
            found: 0,
            active: 0,
            newly_tracked: 0,
            active_notifications: 0,
            stop_notifications: 0,
            stops: 0,
            untracked: 0,
            failures: 0,
            listing_failed: false,
        }
    }

    pub fn record(&mut self, outcome: &BuilderOutcome) {
        if outcome.newly_tracked {
            self.newly_tracked += 1;
        }
        match outcome.notification {
            Some(NotificationKind::Active) => self.active_notifications += 1,
            Some(NotificationKind::Stop) => self.stop_notifications += 1,
            None => {}
        }
        if outcome.stopped {
            self.stops += 1;
        }
    }

    pub fn log_summary(&self) {
        if self.listing_failed {
            warn!(region = %self.region, kind = %self.kind, "Skipped after listing failure");
            return;
        }
        info!(
            region = %self.region,
            kind = %self.kind,
            found = self.found,
            active = self.active,
            newly_tracked = self.newly_tracked,
            active_notifications = self.active_notifications,
            stop_notifications = self.stop_notifications,
            stops = self.stops,
            untracked = self.untracked,
            failures = self.failures,
            "Finished processing"
        );
    }
}

/// Counters for a whole monitoring pass
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    pub kinds: Vec<KindReport>,
}

impl CycleReport {
    pub fn regions(&self) -> usize {
        let mut regions: Vec<&str> = self.kinds.iter().map(|k| k.region.as_str()).collect();
        regions.dedup();
        regions.len()
    }

    pub fn stops(&self) -> usize {
        self.kinds.iter().map(|k| k.stops).sum()
    }

    pub fn notifications(&self) -> usize {
        self.kinds
            .iter()
            .map(|k| k.active_notifications + k.stop_notifications)
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.kinds.iter().map(|k| k.failures).sum()
    }

    pub fn listing_failures(&self) -> usize {
        self.kinds.iter().filter(|k| k.listing_failed).count()
    }

    pub fn log_summary(&self) {
        info!(
            regions = self.regions(),
            active = self.kinds.iter().map(|k| k.active).sum::<usize>(),
            notifications = self.notifications(),
            stops = self.stops(),
            failures = self.failures(),
            listing_failures = self.listing_failures(),
            "Monitoring pass complete"
        );
    }
}
