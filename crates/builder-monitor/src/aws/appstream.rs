//! AppStream 2.0 builder operations
//!
//! Lists app block builders and image builders, reads their tags and stops
//! them. The monitor only sees these operations through
//! [`BuilderOperations`], so the decision logic can run against fakes.

use super::context::{AwsContext, FromAwsContext};
use super::error::ignore_not_found;
use super::response_date::ResponseDateRecorder;
use anyhow::{Context, Result};
use aws_sdk_appstream::types::{AppBlockBuilder, ImageBuilder};
use builder_monitor_common::{BuilderKind, BuilderSummary, Tags};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Builder as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    pub name: String,
    pub arn: String,
    pub instance_type: String,
    /// Lifecycle state as reported by AppStream (e.g. `RUNNING`)
    pub state: String,
}

impl Builder {
    /// Facts reported in notifications about this builder
    pub fn summary(&self, region: &str) -> BuilderSummary {
        BuilderSummary {
            name: self.name.clone(),
            arn: self.arn.clone(),
            instance_type: self.instance_type.clone(),
            region: region.to_string(),
        }
    }
}

// Missing fields decode as empty strings; an empty state is never active
impl From<&AppBlockBuilder> for Builder {
    fn from(b: &AppBlockBuilder) -> Self {
        Self {
            name: b.name().unwrap_or_default().to_string(),
            arn: b.arn().unwrap_or_default().to_string(),
            instance_type: b.instance_type().unwrap_or_default().to_string(),
            state: b.state().map(|s| s.as_str()).unwrap_or_default().to_string(),
        }
    }
}

impl From<&ImageBuilder> for Builder {
    fn from(b: &ImageBuilder) -> Self {
        Self {
            name: b.name().unwrap_or_default().to_string(),
            arn: b.arn().unwrap_or_default().to_string(),
            instance_type: b.instance_type().unwrap_or_default().to_string(),
            state: b.state().map(|s| s.as_str()).unwrap_or_default().to_string(),
        }
    }
}

/// All builders of one kind in one region, and when the service saw them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSnapshot {
    pub builders: Vec<Builder>,
    /// Server time of the listing; every builder in the batch is compared
    /// against this one instant
    pub observed_at: DateTime<Utc>,
}

/// Trait for the builder operations the monitor needs, so they can be
/// mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait BuilderOperations: Send + Sync {
    /// List every builder of a kind (all pages)
    async fn list_builders(&self, kind: BuilderKind) -> Result<BuilderSnapshot>;

    /// Fetch the tags of a builder
    async fn list_tags(&self, arn: &str) -> Result<Tags>;

    /// Stop a builder
    async fn stop_builder(&self, kind: BuilderKind, name: &str) -> Result<()>;
}

/// AppStream 2.0 client bound to one region
pub struct AppStreamClient {
    client: aws_sdk_appstream::Client,
    region: String,
}

impl FromAwsContext for AppStreamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.appstream_client(),
            region: ctx.region().to_string(),
        }
    }
}

impl AppStreamClient {
    /// Region this client talks to
    pub fn region(&self) -> &str {
        &self.region
    }

    /// List all app block builders, following `NextToken`
    pub async fn describe_app_block_builders(&self) -> Result<BuilderSnapshot> {
        let recorder = ResponseDateRecorder::new();
        let mut builders = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.describe_app_block_builders();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            // Only the first page's Date header matters
            let sent = if next_token.is_none() {
                request.customize().interceptor(recorder.clone()).send().await
            } else {
                request.send().await
            };
            let response = sent.with_context(|| {
                format!("Failed to describe app block builders in {}", self.region())
            })?;

            builders.extend(response.app_block_builders().iter().map(Builder::from));

            // Handle pagination
            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        let observed_at = observed_at(&recorder);
        info!(region = %self.region(), count = builders.len(), "Found app block builder(s)");
        Ok(BuilderSnapshot {
            builders,
            observed_at,
        })
    }

    /// List all image builders, following `NextToken`
    pub async fn describe_image_builders(&self) -> Result<BuilderSnapshot> {
        let recorder = ResponseDateRecorder::new();
        let mut builders = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.client.describe_image_builders();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }

            // Only the first page's Date header matters
            let sent = if next_token.is_none() {
                request.customize().interceptor(recorder.clone()).send().await
            } else {
                request.send().await
            };
            let response = sent.with_context(|| {
                format!("Failed to describe image builders in {}", self.region())
            })?;

            builders.extend(response.image_builders().iter().map(Builder::from));

            // Handle pagination
            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        let observed_at = observed_at(&recorder);
        info!(region = %self.region(), count = builders.len(), "Found image builder(s)");
        Ok(BuilderSnapshot {
            builders,
            observed_at,
        })
    }
}

/// Server time captured by the recorder, or local time if none was seen
fn observed_at(recorder: &ResponseDateRecorder) -> DateTime<Utc> {
    recorder.get().unwrap_or_else(|| {
        debug!("No Date header on listing response, using local clock");
        Utc::now()
    })
}

impl BuilderOperations for AppStreamClient {
    async fn list_builders(&self, kind: BuilderKind) -> Result<BuilderSnapshot> {
        match kind {
            BuilderKind::AppBlockBuilder => self.describe_app_block_builders().await,
            BuilderKind::ImageBuilder => self.describe_image_builders().await,
        }
    }

    async fn list_tags(&self, arn: &str) -> Result<Tags> {
        let response = self
            .client
            .list_tags_for_resource()
            .resource_arn(arn)
            .send()
            .await
            .with_context(|| format!("Failed to list tags for {arn}"))?;

        Ok(response
            .tags()
            .map(|tags| {
                tags.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Tags>()
            })
            .unwrap_or_default())
    }

    async fn stop_builder(&self, kind: BuilderKind, name: &str) -> Result<()> {
        let result = match kind {
            BuilderKind::AppBlockBuilder => self
                .client
                .stop_app_block_builder()
                .name(name)
                .send()
                .await
                .map(|_| ())
                .with_context(|| format!("Failed to stop app block builder {name}")),
            BuilderKind::ImageBuilder => self
                .client
                .stop_image_builder()
                .name(name)
                .send()
                .await
                .map(|_| ())
                .with_context(|| format!("Failed to stop image builder {name}")),
        };

        // A builder deleted since the listing needs no stopping
        ignore_not_found(result)?;
        debug!(region = %self.region(), %kind, name, "Stop requested");
        Ok(())
    }
}
