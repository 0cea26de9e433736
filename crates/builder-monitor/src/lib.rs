//! builder-monitor - AppStream 2.0 builder monitor
//!
//! Tracks how long app block builders and image builders have been active,
//! notifies an SNS topic about long-running ones and stops those that exceed
//! their limit. Meant to be invoked periodically by a scheduler.

pub mod aws;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
