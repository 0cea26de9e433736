//! Builder monitoring
//!
//! [`engine`] holds the reconciliation logic, written against the
//! collaborator traits; [`run`] wires it to the real AWS clients.

pub mod engine;
pub mod report;

pub use engine::{KindMonitor, Monitor};
pub use report::{BuilderOutcome, CycleReport, KindReport};

use crate::aws::{AppStreamClient, AwsContext, FromAwsContext, SnsNotifier, TrackingTable};
use crate::clock::SystemClock;
use crate::config::MonitorConfig;
use builder_monitor_common::BuilderKind;
use tracing::info;

/// Run one monitoring pass over `regions`.
///
/// Tracking tables and the SNS topic live in the home region; AppStream is
/// queried region by region.
pub async fn run(config: &MonitorConfig, regions: &[String]) -> CycleReport {
    let home = AwsContext::new(&config.home_region).await;
    info!(home_region = %home.region(), regions = regions.len(), "Starting monitoring pass");

    let kinds = BuilderKind::ALL
        .into_iter()
        .map(|kind| {
            let settings = config.kind(kind);
            KindMonitor {
                kind,
                thresholds: settings.thresholds,
                store: TrackingTable::from_context(&home, &settings.table_name),
            }
        })
        .collect();
    let notifier = SnsNotifier::from_context(&home, &config.sns_topic_arn);
    let monitor = Monitor::new(kinds, notifier, SystemClock);

    monitor
        .run_cycle(regions, |region| {
            AppStreamClient::from_context(&home.for_region(region))
        })
        .await
}
