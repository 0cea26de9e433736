//! Server-side timestamp capture
//!
//! Active durations are measured against the AppStream service's clock, not
//! the monitor's, so the `Date` header of the listing response is recorded
//! with an SDK interceptor.

use aws_smithy_runtime_api::box_error::BoxError;
use aws_smithy_runtime_api::client::interceptors::Intercept;
use aws_smithy_runtime_api::client::interceptors::context::BeforeDeserializationInterceptorContextRef;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_types::config_bag::ConfigBag;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Interceptor that remembers the `Date` header of the last response
#[derive(Debug, Clone, Default)]
pub struct ResponseDateRecorder {
    date: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl ResponseDateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded server time, if a parseable `Date` header was seen
    pub fn get(&self) -> Option<DateTime<Utc>> {
        self.date.lock().ok().and_then(|d| *d)
    }
}

impl Intercept for ResponseDateRecorder {
    fn name(&self) -> &'static str {
        "ResponseDateRecorder"
    }

    fn read_before_deserialization(
        &self,
        context: &BeforeDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let parsed = context
            .response()
            .headers()
            .get("date")
            .and_then(parse_http_date);
        if let (Some(parsed), Ok(mut slot)) = (parsed, self.date.lock()) {
            *slot = Some(parsed);
        }
        Ok(())
    }
}

/// Parse an HTTP `Date` header (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
