//! Reconciliation of builders against their tracking records
//!
//! Regions, kinds and builders are processed strictly one at a time. Errors
//! are contained: a failed listing skips that region and kind, a failed
//! builder is logged and counted, and the pass always runs to the end.

use super::report::{BuilderOutcome, CycleReport, KindReport};
use crate::aws::appstream::{Builder, BuilderOperations};
use crate::aws::dynamodb::TrackingStore;
use crate::aws::error::classify_anyhow_error;
use crate::aws::sns::Notifier;
use crate::clock::Clock;
use anyhow::Result;
use builder_monitor_common::decision::active_hours;
use builder_monitor_common::{
    BuilderKind, Decision, Notification, RecordKey, Tags, Thresholds, TrackingRecord,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// One builder kind: its thresholds and its tracking table
pub struct KindMonitor<S> {
    pub kind: BuilderKind,
    pub thresholds: Thresholds,
    pub store: S,
}

/// The monitoring engine.
///
/// Tracking stores and the notifier are shared by all regions; builder
/// operations are regional and passed in per call.
pub struct Monitor<S, N, C> {
    kinds: Vec<KindMonitor<S>>,
    notifier: N,
    clock: C,
}

impl<S, N, C> Monitor<S, N, C>
where
    S: TrackingStore,
    N: Notifier,
    C: Clock,
{
    /// Kinds are processed in the order given
    pub fn new(kinds: Vec<KindMonitor<S>>, notifier: N, clock: C) -> Self {
        Self {
            kinds,
            notifier,
            clock,
        }
    }

    pub fn kinds(&self) -> &[KindMonitor<S>] {
        &self.kinds
    }

    pub fn kind(&self, kind: BuilderKind) -> Option<&KindMonitor<S>> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Handle one active builder.
    ///
    /// A builder without a record starts being tracked and nothing else
    /// happens. Otherwise the decision is evaluated, tags are fetched if any
    /// action is pending, then the notification is sent, the record updated
    /// and finally the builder stopped.
    pub async fn process_builder<B: BuilderOperations>(
        &self,
        builders: &B,
        region: &str,
        kind: &KindMonitor<S>,
        builder: &Builder,
        observed_at: DateTime<Utc>,
    ) -> Result<BuilderOutcome> {
        let key = RecordKey::new(region, &builder.name);

        let Some(record) = kind.store.get(&key).await? else {
            kind.store
                .put(&TrackingRecord::first_seen(key, observed_at))
                .await?;
            info!(region, kind = %kind.kind, name = %builder.name, "Newly active, tracking started");
            return Ok(BuilderOutcome::newly_tracked());
        };

        let now = self.clock.now();
        let hours = active_hours(record.earliest_active, observed_at);
        let mut decision = Decision::evaluate(&record, observed_at, now, &kind.thresholds);
        debug!(
            region,
            kind = %kind.kind,
            name = %builder.name,
            active_hours = hours,
            ?decision,
            "Evaluated"
        );

        let mut tags = Tags::new();
        if decision.needs_tags() {
            tags = builders.list_tags(&builder.arn).await?;
            decision = decision.apply_tags(&tags);
        }

        let sent = decision.notification();
        if let Some(notification_kind) = sent {
            let notification = Notification::new(
                kind.kind,
                notification_kind,
                &builder.summary(region),
                hours,
                &tags,
            );
            self.notifier.publish(&notification).await?;
        }

        let update = Decision::record_update(sent, now, observed_at);
        kind.store.update(&key, &update).await?;

        if decision.stop {
            builders.stop_builder(kind.kind, &builder.name).await?;
            info!(
                region,
                kind = %kind.kind,
                name = %builder.name,
                active_hours = hours,
                "Stopped"
            );
        }

        Ok(BuilderOutcome {
            newly_tracked: false,
            notification: sent,
            stopped: decision.stop,
        })
    }

    /// Reconcile every builder of one kind in one region
    pub async fn reconcile_kind<B: BuilderOperations>(
        &self,
        builders: &B,
        region: &str,
        kind: &KindMonitor<S>,
    ) -> KindReport {
        let mut report = KindReport::new(region, kind.kind);
        info!(region, kind = %kind.kind, "Started processing");

        let snapshot = match builders.list_builders(kind.kind).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let classified = classify_anyhow_error(&e);
                error!(
                    region,
                    kind = %kind.kind,
                    error = %format!("{e:#}"),
                    category = %classified,
                    "Failed to list builders"
                );
                report.listing_failed = true;
                report.log_summary();
                return report;
            }
        };
        report.found = snapshot.builders.len();

        for builder in &snapshot.builders {
            if kind.kind.is_active(&builder.state) {
                report.active += 1;
                match self
                    .process_builder(builders, region, kind, builder, snapshot.observed_at)
                    .await
                {
                    Ok(outcome) => report.record(&outcome),
                    Err(e) => {
                        report.failures += 1;
                        log_builder_failure(region, kind.kind, &builder.name, &e);
                    }
                }
            } else {
                debug!(region, kind = %kind.kind, name = %builder.name, state = %builder.state, "Not active");
                let key = RecordKey::new(region, &builder.name);
                match kind.store.delete(&key).await {
                    Ok(true) => report.untracked += 1,
                    Ok(false) => {}
                    Err(e) => {
                        report.failures += 1;
                        log_builder_failure(region, kind.kind, &builder.name, &e);
                    }
                }
            }
        }

        report.log_summary();
        report
    }

    /// Reconcile all kinds in one region
    pub async fn run_region<B: BuilderOperations>(
        &self,
        builders: &B,
        region: &str,
    ) -> Vec<KindReport> {
        let mut reports = Vec::with_capacity(self.kinds.len());
        for kind in &self.kinds {
            reports.push(self.reconcile_kind(builders, region, kind).await);
        }
        reports
    }

    /// Reconcile every region in turn, building its builder client on demand
    pub async fn run_cycle<B, F>(&self, regions: &[String], mut builders_for: F) -> CycleReport
    where
        B: BuilderOperations,
        F: FnMut(&str) -> B,
    {
        let mut report = CycleReport::default();
        for region in regions {
            let builders = builders_for(region);
            report.kinds.extend(self.run_region(&builders, region).await);
        }
        report.log_summary();
        report
    }
}

fn log_builder_failure(region: &str, kind: BuilderKind, name: &str, e: &anyhow::Error) {
    let classified = classify_anyhow_error(e);
    error!(
        region,
        kind = %kind,
        name,
        error = %format!("{e:#}"),
        category = %classified,
        retryable = classified.is_retryable(),
        "Failed to process builder"
    );
    if let Some(suggestion) = classified.suggestion() {
        warn!("{suggestion}");
    }
}
