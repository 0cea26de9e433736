//! Shared test utilities for builder-monitor
//!
//! ## Modules
//!
//! - [`fakes`]: In-memory AppStream, tracking store, notifier and clock
//! - [`fixtures`]: Builders, thresholds and a pre-wired monitor

pub mod fakes;
pub mod fixtures;

// Re-export commonly used items
pub use fakes::{FakeAppStream, FixedClock, InMemoryTrackingStore, RecordingNotifier};
pub use fixtures::{TestMonitor, app_block_builder, image_builder, standard_thresholds, t0, test_monitor};
