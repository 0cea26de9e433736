//! In-memory collaborators
//!
//! Each fake records what was done to it so tests can assert on the side
//! effects of a monitoring pass.

use anyhow::{Result, anyhow};
use builder_monitor::aws::{Builder, BuilderOperations, BuilderSnapshot, Notifier, TrackingStore};
use builder_monitor::clock::Clock;
use builder_monitor_common::{
    BuilderKind, Notification, RecordKey, RecordUpdate, Tags, TrackingRecord,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// AppStream stand-in for one region
#[derive(Debug, Default)]
pub struct FakeAppStream {
    builders: Mutex<HashMap<BuilderKind, Vec<Builder>>>,
    tags: Mutex<HashMap<String, Tags>>,
    observed_at: Mutex<Option<DateTime<Utc>>>,
    failing_listings: Mutex<HashSet<BuilderKind>>,
    failing_stops: Mutex<HashSet<String>>,
    stops: Mutex<Vec<(BuilderKind, String)>>,
    tag_lookups: Mutex<Vec<String>>,
}

impl FakeAppStream {
    pub fn new(observed_at: DateTime<Utc>) -> Self {
        let fake = Self::default();
        fake.set_observed_at(observed_at);
        fake
    }

    /// Server time reported by the next listings
    pub fn set_observed_at(&self, at: DateTime<Utc>) {
        *self.observed_at.lock().unwrap() = Some(at);
    }

    pub fn advance(&self, by: Duration) {
        let mut at = self.observed_at.lock().unwrap();
        *at = at.map(|t| t + by);
    }

    /// Replace the builders of a kind
    pub fn set_builders(&self, kind: BuilderKind, builders: Vec<Builder>) {
        self.builders.lock().unwrap().insert(kind, builders);
    }

    /// Change the state of a listed builder
    pub fn set_state(&self, kind: BuilderKind, name: &str, state: &str) {
        if let Some(builders) = self.builders.lock().unwrap().get_mut(&kind) {
            for builder in builders.iter_mut().filter(|b| b.name == name) {
                builder.state = state.to_string();
            }
        }
    }

    pub fn set_tags(&self, arn: &str, tags: &[(&str, &str)]) {
        let tags: Tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.tags.lock().unwrap().insert(arn.to_string(), tags);
    }

    pub fn fail_listing(&self, kind: BuilderKind) {
        self.failing_listings.lock().unwrap().insert(kind);
    }

    pub fn fail_stop(&self, name: &str) {
        self.failing_stops.lock().unwrap().insert(name.to_string());
    }

    /// Stop calls made so far
    pub fn stops(&self) -> Vec<(BuilderKind, String)> {
        self.stops.lock().unwrap().clone()
    }

    /// ARNs whose tags were fetched so far
    pub fn tag_lookups(&self) -> Vec<String> {
        self.tag_lookups.lock().unwrap().clone()
    }
}

impl BuilderOperations for FakeAppStream {
    async fn list_builders(&self, kind: BuilderKind) -> Result<BuilderSnapshot> {
        if self.failing_listings.lock().unwrap().contains(&kind) {
            return Err(anyhow!("ThrottlingException: Rate exceeded"));
        }
        let observed_at = (*self.observed_at.lock().unwrap()).unwrap_or_else(Utc::now);
        Ok(BuilderSnapshot {
            builders: self
                .builders
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .unwrap_or_default(),
            observed_at,
        })
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags> {
        self.tag_lookups.lock().unwrap().push(arn.to_string());
        Ok(self
            .tags
            .lock()
            .unwrap()
            .get(arn)
            .cloned()
            .unwrap_or_default())
    }

    async fn stop_builder(&self, kind: BuilderKind, name: &str) -> Result<()> {
        if self.failing_stops.lock().unwrap().contains(name) {
            return Err(anyhow!(
                "OperationNotPermittedException: builder {name} cannot be stopped"
            ));
        }
        self.stops.lock().unwrap().push((kind, name.to_string()));
        Ok(())
    }
}

/// Tracking table kept in a map
#[derive(Debug, Default)]
pub struct InMemoryTrackingStore {
    records: Mutex<BTreeMap<RecordKey, TrackingRecord>>,
    failing_reads: Mutex<HashSet<String>>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, region: &str, name: &str) -> Option<TrackingRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&RecordKey::new(region, name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, record: TrackingRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
    }

    /// Make reads of a builder's record fail
    pub fn fail_reads_for(&self, name: &str) {
        self.failing_reads.lock().unwrap().insert(name.to_string());
    }
}

impl TrackingStore for InMemoryTrackingStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<TrackingRecord>> {
        if self.failing_reads.lock().unwrap().contains(&key.name) {
            return Err(anyhow!("ProvisionedThroughputExceededException: slow down"));
        }
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, record: &TrackingRecord) -> Result<()> {
        self.insert(record.clone());
        Ok(())
    }

    async fn update(&self, key: &RecordKey, update: &RecordUpdate) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        // DynamoDB UpdateItem creates missing items; mirror that
        let record = records.entry(key.clone()).or_insert_with(|| TrackingRecord {
            key: key.clone(),
            earliest_active: DateTime::<Utc>::MIN_UTC,
            last_notification: DateTime::<Utc>::MIN_UTC,
            expiration: 0,
        });
        match update {
            RecordUpdate::NotificationSent {
                notified_at,
                expiration,
            } => {
                record.last_notification = *notified_at;
                record.expiration = *expiration;
            }
            RecordUpdate::ExtendExpiration { expiration } => record.expiration = *expiration,
        }
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        Ok(self.records.lock().unwrap().remove(key).is_some())
    }
}

/// Notifier that keeps every published notification
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl Notifier for RecordingNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(anyhow!("AuthorizationError: not authorized to publish"));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Settable wall clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
