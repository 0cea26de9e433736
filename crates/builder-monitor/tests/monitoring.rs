//! End-to-end monitoring passes against in-memory collaborators

use builder_monitor::monitor::KindReport;
use builder_monitor_common::{BuilderKind, NotificationKind};
use builder_monitor_common::defaults::never_notified;
use builder_monitor_common::record::expiration_for;
use builder_monitor_common::tags::{
    TAG_SKIP_ACTIVE_NOTIFICATION, TAG_SKIP_STOP, TAG_SKIP_STOP_NOTIFICATION,
};
use builder_monitor_test_utils::fixtures::{TEST_REGION, builder_arn};
use builder_monitor_test_utils::{
    FakeAppStream, TestMonitor, app_block_builder, image_builder, standard_thresholds, t0,
    test_monitor,
};
use chrono::{DateTime, Duration, Utc};

const IB: BuilderKind = BuilderKind::ImageBuilder;
const ABB: BuilderKind = BuilderKind::AppBlockBuilder;

/// Run one pass over the test region at `at` (server and local time agree)
async fn pass_at(monitor: &TestMonitor, appstream: &FakeAppStream, at: DateTime<Utc>) -> Vec<KindReport> {
    appstream.set_observed_at(at);
    monitor.clock().set(at);
    monitor.run_region(appstream, TEST_REGION).await
}

fn report(reports: &[KindReport], kind: BuilderKind) -> &KindReport {
    reports
        .iter()
        .find(|r| r.kind == kind)
        .expect("report for kind")
}

fn setup(builders: Vec<builder_monitor::aws::Builder>) -> (TestMonitor, FakeAppStream) {
    let monitor = test_monitor(standard_thresholds(), t0());
    let appstream = FakeAppStream::new(t0());
    appstream.set_builders(IB, builders);
    (monitor, appstream)
}

#[tokio::test]
async fn test_threshold_scenario() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    let store = &monitor.kind(IB).unwrap().store;

    // T+0: tracking starts, nothing else
    let reports = pass_at(&monitor, &appstream, t0()).await;
    assert_eq!(report(&reports, IB).newly_tracked, 1);
    let record = store.record(TEST_REGION, "ib-1").unwrap();
    assert_eq!(record.earliest_active, t0());
    assert_eq!(record.last_notification, never_notified());
    assert!(monitor.notifier().sent().is_empty());
    assert!(appstream.tag_lookups().is_empty());

    // T+3h: past the notify threshold, first reminder goes out
    let at = t0() + Duration::hours(3);
    let reports = pass_at(&monitor, &appstream, at).await;
    assert_eq!(report(&reports, IB).active_notifications, 1);
    let sent = monitor.notifier().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::Active);
    assert_eq!(sent[0].subject, "Image builder ib-1 active for 3 hours");
    assert!(sent[0].message.contains("AWS account: 123456789012"));
    assert!(sent[0].message.contains("Time active: 3 hours"));
    let record = store.record(TEST_REGION, "ib-1").unwrap();
    assert_eq!(record.last_notification, at);
    assert_eq!(record.expiration, expiration_for(at));

    // T+3h40m: within the notify interval
    let at = t0() + Duration::minutes(220);
    pass_at(&monitor, &appstream, at).await;
    assert_eq!(monitor.notifier().sent().len(), 1);
    let record = store.record(TEST_REGION, "ib-1").unwrap();
    assert_eq!(record.last_notification, t0() + Duration::hours(3));
    assert_eq!(record.expiration, expiration_for(at));

    // T+5h10m: past the stop threshold
    let at = t0() + Duration::minutes(310);
    let reports = pass_at(&monitor, &appstream, at).await;
    let kind_report = report(&reports, IB);
    assert_eq!(kind_report.stops, 1);
    assert_eq!(kind_report.stop_notifications, 1);
    assert_eq!(kind_report.active_notifications, 0);
    assert_eq!(appstream.stops(), vec![(IB, "ib-1".to_string())]);

    let sent = monitor.notifier().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].kind, NotificationKind::Stop);
    assert_eq!(sent[1].subject, "Stopping image builder ib-1");
    assert!(sent[1].message.contains("Time active: 5 hours"));

    let record = store.record(TEST_REGION, "ib-1").unwrap();
    assert_eq!(record.earliest_active, t0());
    assert_eq!(record.last_notification, t0() + Duration::hours(3));
    assert_eq!(record.expiration, expiration_for(at));
}

#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    pass_at(&monitor, &appstream, t0()).await;

    let at = t0() + Duration::hours(3);
    pass_at(&monitor, &appstream, at).await;
    let reports = pass_at(&monitor, &appstream, at).await;

    let kind_report = report(&reports, IB);
    assert_eq!(kind_report.active_notifications, 0);
    assert_eq!(kind_report.stops, 0);
    assert_eq!(monitor.notifier().sent().len(), 1);
    assert!(appstream.stops().is_empty());
}

#[tokio::test]
async fn test_reminders_one_interval_apart_both_sent() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    let store = &monitor.kind(IB).unwrap().store;
    pass_at(&monitor, &appstream, t0()).await;

    let first = t0() + Duration::minutes(121);
    let reports = pass_at(&monitor, &appstream, first).await;
    assert_eq!(report(&reports, IB).active_notifications, 1);

    // Exactly notify_interval_hours after the first reminder
    let second = first + Duration::hours(1);
    let reports = pass_at(&monitor, &appstream, second).await;
    assert_eq!(report(&reports, IB).active_notifications, 1);
    assert_eq!(report(&reports, IB).stops, 0);

    let sent = monitor.notifier().sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|n| n.kind == NotificationKind::Active));
    assert_eq!(
        store.record(TEST_REGION, "ib-1").unwrap().last_notification,
        second
    );
    assert!(appstream.stops().is_empty());
}

#[tokio::test]
async fn test_first_pass_twice_does_nothing() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "PENDING")]);
    pass_at(&monitor, &appstream, t0()).await;
    let reports = pass_at(&monitor, &appstream, t0()).await;

    assert_eq!(report(&reports, IB).newly_tracked, 0);
    assert!(monitor.notifier().sent().is_empty());
    assert!(appstream.tag_lookups().is_empty());
}

#[tokio::test]
async fn test_inactive_builder_is_untracked_and_restarts() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    let store = &monitor.kind(IB).unwrap().store;
    pass_at(&monitor, &appstream, t0()).await;

    appstream.set_state(IB, "ib-1", "STOPPED");
    let reports = pass_at(&monitor, &appstream, t0() + Duration::hours(1)).await;
    assert_eq!(report(&reports, IB).untracked, 1);
    assert!(store.record(TEST_REGION, "ib-1").is_none());

    appstream.set_state(IB, "ib-1", "RUNNING");
    let restart = t0() + Duration::hours(6);
    let reports = pass_at(&monitor, &appstream, restart).await;
    assert_eq!(report(&reports, IB).newly_tracked, 1);
    assert_eq!(
        store.record(TEST_REGION, "ib-1").unwrap().earliest_active,
        restart
    );
    assert!(appstream.stops().is_empty());
}

#[tokio::test]
async fn test_untracked_builder_delete_is_harmless() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "STOPPED")]);
    let reports = pass_at(&monitor, &appstream, t0()).await;
    let kind_report = report(&reports, IB);
    assert_eq!(kind_report.failures, 0);
    assert_eq!(kind_report.active, 0);
    assert_eq!(kind_report.untracked, 0);
    assert!(monitor.kind(IB).unwrap().store.is_empty());
}

#[tokio::test]
async fn test_listing_failure_isolated_to_kind() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    appstream.set_builders(ABB, vec![app_block_builder("abb-1", "RUNNING")]);
    appstream.fail_listing(ABB);

    let reports = pass_at(&monitor, &appstream, t0()).await;
    assert!(report(&reports, ABB).listing_failed);
    assert!(!report(&reports, IB).listing_failed);
    assert!(monitor.kind(ABB).unwrap().store.is_empty());
    assert!(
        monitor
            .kind(IB)
            .unwrap()
            .store
            .record(TEST_REGION, "ib-1")
            .is_some()
    );
}

#[tokio::test]
async fn test_skip_stop_tag() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    appstream.set_tags(&builder_arn(IB, TEST_REGION, "ib-1"), &[(TAG_SKIP_STOP, "")]);

    pass_at(&monitor, &appstream, t0()).await;
    pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;

    // Stop and its notification are suppressed; the active reminder was
    // never due because a stop was pending
    assert!(appstream.stops().is_empty());
    assert!(monitor.notifier().sent().is_empty());
    assert_eq!(appstream.tag_lookups().len(), 1);
}

#[tokio::test]
async fn test_skip_stop_notification_tag() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    appstream.set_tags(
        &builder_arn(IB, TEST_REGION, "ib-1"),
        &[(TAG_SKIP_STOP_NOTIFICATION, "true")],
    );

    pass_at(&monitor, &appstream, t0()).await;
    pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;

    assert_eq!(appstream.stops(), vec![(IB, "ib-1".to_string())]);
    assert!(monitor.notifier().sent().is_empty());
}

#[tokio::test]
async fn test_skip_active_notification_tag() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    appstream.set_tags(
        &builder_arn(IB, TEST_REGION, "ib-1"),
        &[(TAG_SKIP_ACTIVE_NOTIFICATION, "yes")],
    );

    pass_at(&monitor, &appstream, t0()).await;
    pass_at(&monitor, &appstream, t0() + Duration::hours(3)).await;
    assert!(monitor.notifier().sent().is_empty());
    let record = monitor
        .kind(IB)
        .unwrap()
        .store
        .record(TEST_REGION, "ib-1")
        .unwrap();
    assert_eq!(record.last_notification, never_notified());

    // The tag never prevents a stop
    pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;
    assert_eq!(appstream.stops().len(), 1);
    let sent = monitor.notifier().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::Stop);
    assert!(sent[0].message.contains(TAG_SKIP_ACTIVE_NOTIFICATION));
}

#[tokio::test]
async fn test_stop_without_notification_when_disabled() {
    let mut thresholds = standard_thresholds();
    thresholds.stop_notify = false;
    let monitor = test_monitor(thresholds, t0());
    let appstream = FakeAppStream::new(t0());
    appstream.set_builders(ABB, vec![app_block_builder("abb-1", "STARTING")]);

    pass_at(&monitor, &appstream, t0()).await;
    let reports = pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;

    assert_eq!(report(&reports, ABB).stops, 1);
    assert_eq!(appstream.stops(), vec![(ABB, "abb-1".to_string())]);
    assert!(monitor.notifier().sent().is_empty());
}

#[tokio::test]
async fn test_disabled_thresholds_never_act() {
    let monitor = test_monitor(
        builder_monitor_common::Thresholds {
            stop_after_hours: 0.0,
            notify_after_hours: -1.0,
            notify_interval_hours: 1.0,
            stop_notify: true,
        },
        t0(),
    );
    let appstream = FakeAppStream::new(t0());
    appstream.set_builders(IB, vec![image_builder("ib-1", "RUNNING")]);

    pass_at(&monitor, &appstream, t0()).await;
    pass_at(&monitor, &appstream, t0() + Duration::days(3)).await;

    assert!(appstream.stops().is_empty());
    assert!(monitor.notifier().sent().is_empty());
    assert!(appstream.tag_lookups().is_empty());
}

#[tokio::test]
async fn test_failing_builder_does_not_block_siblings() {
    let (monitor, appstream) = setup(vec![
        image_builder("ib-bad", "RUNNING"),
        image_builder("ib-good", "RUNNING"),
    ]);
    pass_at(&monitor, &appstream, t0()).await;
    monitor.kind(IB).unwrap().store.fail_reads_for("ib-bad");

    let reports = pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;
    let kind_report = report(&reports, IB);
    assert_eq!(kind_report.failures, 1);
    assert_eq!(kind_report.stops, 1);
    assert_eq!(appstream.stops(), vec![(IB, "ib-good".to_string())]);
}

#[tokio::test]
async fn test_failed_stop_happens_after_notification() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    appstream.fail_stop("ib-1");
    pass_at(&monitor, &appstream, t0()).await;

    let at = t0() + Duration::hours(5);
    let reports = pass_at(&monitor, &appstream, at).await;
    assert_eq!(report(&reports, IB).failures, 1);
    assert_eq!(monitor.notifier().sent().len(), 1);
    let record = monitor
        .kind(IB)
        .unwrap()
        .store
        .record(TEST_REGION, "ib-1")
        .unwrap();
    assert_eq!(record.expiration, expiration_for(at));
}

#[tokio::test]
async fn test_notification_failure_skips_stop() {
    let (monitor, appstream) = setup(vec![image_builder("ib-1", "RUNNING")]);
    pass_at(&monitor, &appstream, t0()).await;
    monitor.notifier().set_failing(true);

    let reports = pass_at(&monitor, &appstream, t0() + Duration::hours(5)).await;
    assert_eq!(report(&reports, IB).failures, 1);
    assert!(appstream.stops().is_empty());
}

#[tokio::test]
async fn test_cycle_covers_every_region() {
    let monitor = test_monitor(standard_thresholds(), t0());
    let regions = vec!["us-east-1".to_string(), "eu-west-1".to_string()];

    let report = monitor
        .run_cycle(&regions, |_region| {
            let appstream = FakeAppStream::new(t0());
            appstream.set_builders(IB, vec![image_builder("ib-1", "RUNNING")]);
            appstream
        })
        .await;

    assert_eq!(report.regions(), 2);
    assert_eq!(report.kinds.len(), 4);
    let store = &monitor.kind(IB).unwrap().store;
    assert!(store.record("us-east-1", "ib-1").is_some());
    assert!(store.record("eu-west-1", "ib-1").is_some());
    assert_eq!(store.len(), 2);
}
