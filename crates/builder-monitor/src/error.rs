//! Configuration errors
//!
//! These are the only failures that abort an invocation; everything that
//! goes wrong while talking to AWS is contained to one builder or one
//! listing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// LOG_LEVEL is not a known severity
    #[error("LOG_LEVEL must be one of DEBUG, INFO, WARNING, ERROR, CRITICAL, got: {0}")]
    InvalidLogLevel(String),

    /// A required string setting is empty
    #[error("{0} cannot be empty")]
    Empty(String),

    /// An hour threshold is not a finite number
    #[error("{name} must be a finite number of hours, got {value}")]
    InvalidHours { name: String, value: f64 },

    /// A requested region is outside the home region's partition
    #[error("region {region} is not an AppStream 2.0 region of the {partition} partition")]
    UnsupportedRegion { region: String, partition: String },
}
