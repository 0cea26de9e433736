//! SNS notification delivery

use super::context::AwsContext;
use anyhow::{Context, Result};
use builder_monitor_common::Notification;
use tracing::info;

/// SNS subjects are limited to 100 characters
const MAX_SUBJECT_LEN: usize = 100;

/// Delivery of notifications, so tests can capture them instead.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<()>;
}

/// Publishes notifications to one SNS topic
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn from_context(ctx: &AwsContext, topic_arn: impl Into<String>) -> Self {
        Self {
            client: ctx.sns_client(),
            topic_arn: topic_arn.into(),
        }
    }
}

/// Cut a subject down to what SNS accepts, on a character boundary
pub fn truncate_subject(subject: &str) -> &str {
    match subject.char_indices().nth(MAX_SUBJECT_LEN) {
        Some((idx, _)) => &subject[..idx],
        None => subject,
    }
}

impl Notifier for SnsNotifier {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(truncate_subject(&notification.subject))
            .message(&notification.message)
            .send()
            .await
            .with_context(|| format!("Failed to publish '{}'", notification.subject))?;

        info!(
            kind = %notification.kind,
            subject = %notification.subject,
            message_id = response.message_id().unwrap_or_default(),
            "Notification published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_subject() {
        assert_eq!(truncate_subject("Stopping image builder ib-1"), "Stopping image builder ib-1");
    }

    #[test]
    fn test_truncate_long_subject() {
        let subject = format!("Image builder {} active for 5 hours", "x".repeat(120));
        assert_eq!(truncate_subject(&subject).chars().count(), MAX_SUBJECT_LEN);
        assert!(subject.starts_with(truncate_subject(&subject)));
    }

    #[test]
    fn test_truncate_multibyte() {
        let subject = "é".repeat(150);
        assert_eq!(truncate_subject(&subject).chars().count(), MAX_SUBJECT_LEN);
    }
}
