//! AWS SDK integration
//!
//! Everything that talks to AppStream 2.0, DynamoDB or SNS lives here,
//! behind the [`BuilderOperations`], [`TrackingStore`] and [`Notifier`]
//! traits the monitor is written against.

pub mod appstream;
pub mod context;
pub mod dynamodb;
pub mod error;
pub mod regions;
pub mod response_date;
pub mod sns;

pub use appstream::{AppStreamClient, Builder, BuilderOperations, BuilderSnapshot};
pub use context::{AwsContext, FromAwsContext};
pub use dynamodb::{TrackingStore, TrackingTable};
pub use error::{AwsError, classify_anyhow_error};
pub use regions::{select_regions, supported_regions};
pub use sns::{Notifier, SnsNotifier};
