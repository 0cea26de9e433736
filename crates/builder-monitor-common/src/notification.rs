//! Operator notifications
//!
//! Builds the subject and body published when a builder has been active for
//! too long or is about to be stopped.

use crate::resource_kind::BuilderKind;
use crate::tags::{Tags, tags_json};

/// Which notification is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum NotificationKind {
    #[display("active")]
    Active,
    #[display("stop")]
    Stop,
}

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        AccountId(s.into())
    }
}

/// Region and account of an AppStream builder ARN
///
/// `arn:<partition>:appstream:<region>:<account>:<resource-type>/<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderArn {
    pub region: String,
    pub account_id: AccountId,
}

impl BuilderArn {
    pub fn parse(arn: &str) -> Option<Self> {
        let mut parts = arn.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }
        let _partition = parts.next()?;
        let _service = parts.next()?;
        let region = parts.next()?;
        let account = parts.next()?;
        // Resource part must be present
        parts.next()?;

        Some(Self {
            region: region.to_string(),
            account_id: AccountId::new(account),
        })
    }
}

/// The builder facts a notification reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSummary {
    pub name: String,
    pub arn: String,
    pub instance_type: String,
    /// Region being processed, used when the ARN can't be parsed
    pub region: String,
}

/// Format whole active hours as "1 hour" / "N hours"
pub fn format_active_duration(active_hours: f64) -> String {
    let hours = if active_hours.is_finite() && active_hours > 0.0 {
        active_hours.floor() as u64
    } else {
        0
    };
    if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}

/// A ready-to-publish notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        builder_kind: BuilderKind,
        kind: NotificationKind,
        builder: &BuilderSummary,
        active_hours: f64,
        tags: &Tags,
    ) -> Self {
        let duration = format_active_duration(active_hours);

        let subject = match kind {
            NotificationKind::Active => format!(
                "{} {} active for {}",
                builder_kind.title(),
                builder.name,
                duration
            ),
            NotificationKind::Stop => format!("Stopping {} {}", builder_kind, builder.name),
        };

        let arn = BuilderArn::parse(&builder.arn);
        let account = arn
            .as_ref()
            .map(|a| a.account_id.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let region = arn
            .as_ref()
            .map(|a| a.region.as_str())
            .unwrap_or(builder.region.as_str());

        let message = [
            format!("AWS account: {account}"),
            format!("Region: {region}"),
            format!("Name: {}", builder.name),
            format!("Instance type: {}", builder.instance_type),
            format!("Time active: {duration}"),
            format!("Tags: {}", tags_json(tags)),
        ]
        .join("\r\n");

        Self {
            kind,
            subject,
            message,
        }
    }
}
