//! DynamoDB tracking table
//!
//! One table per builder kind, keyed by `region` (partition key) and `name`
//! (sort key). `exp_date` is the table's TTL attribute.

use super::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use builder_monitor_common::record::{format_timestamp, parse_timestamp};
use builder_monitor_common::{RecordError, RecordKey, RecordUpdate, TrackingRecord};
use std::collections::HashMap;
use tracing::debug;

pub const ATTR_REGION: &str = "region";
pub const ATTR_NAME: &str = "name";
pub const ATTR_EARLIEST_ACTIVE: &str = "earliest_active";
pub const ATTR_LAST_NOTIFICATION: &str = "last_active_notification";
pub const ATTR_EXPIRATION: &str = "exp_date";

/// Persistence of tracking records, so the monitor can run against an
/// in-memory store in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait TrackingStore: Send + Sync {
    /// Fetch the record for a builder, if one exists
    async fn get(&self, key: &RecordKey) -> Result<Option<TrackingRecord>>;

    /// Create (or overwrite) a record
    async fn put(&self, record: &TrackingRecord) -> Result<()>;

    /// Apply a mutation to an existing record
    async fn update(&self, key: &RecordKey, update: &RecordUpdate) -> Result<()>;

    /// Remove a record, returning whether one existed. Removing an absent
    /// record succeeds.
    async fn delete(&self, key: &RecordKey) -> Result<bool>;
}

/// Tracking table backed by DynamoDB
pub struct TrackingTable {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl TrackingTable {
    pub fn from_context(ctx: &AwsContext, table_name: impl Into<String>) -> Self {
        Self {
            client: ctx.dynamodb_client(),
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Key attributes of a record
fn key_attributes(key: &RecordKey) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_REGION.to_string(), AttributeValue::S(key.region.clone())),
        (ATTR_NAME.to_string(), AttributeValue::S(key.name.clone())),
    ])
}

/// Encode a record as a DynamoDB item
pub fn record_to_item(record: &TrackingRecord) -> HashMap<String, AttributeValue> {
    let mut item = key_attributes(&record.key);
    item.insert(
        ATTR_EARLIEST_ACTIVE.to_string(),
        AttributeValue::S(format_timestamp(record.earliest_active)),
    );
    item.insert(
        ATTR_LAST_NOTIFICATION.to_string(),
        AttributeValue::S(format_timestamp(record.last_notification)),
    );
    item.insert(
        ATTR_EXPIRATION.to_string(),
        AttributeValue::N(record.expiration.to_string()),
    );
    item
}

/// Decode a DynamoDB item into a record
pub fn item_to_record(
    key: &RecordKey,
    item: &HashMap<String, AttributeValue>,
) -> Result<TrackingRecord, RecordError> {
    let string_attr = |attribute: &'static str| {
        item.get(attribute)
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RecordError::MissingAttribute {
                name: key.name.clone(),
                attribute,
            })
    };
    let timestamp_attr = |attribute: &'static str| {
        let value = string_attr(attribute)?;
        parse_timestamp(value).ok_or_else(|| RecordError::InvalidTimestamp {
            name: key.name.clone(),
            attribute,
            value: value.clone(),
        })
    };

    let earliest_active = timestamp_attr(ATTR_EARLIEST_ACTIVE)?;
    let last_notification = timestamp_attr(ATTR_LAST_NOTIFICATION)?;
    let expiration = item
        .get(ATTR_EXPIRATION)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| RecordError::MissingAttribute {
            name: key.name.clone(),
            attribute: ATTR_EXPIRATION,
        })?;

    Ok(TrackingRecord {
        key: key.clone(),
        earliest_active,
        last_notification,
        expiration,
    })
}

impl TrackingStore for TrackingTable {
    async fn get(&self, key: &RecordKey) -> Result<Option<TrackingRecord>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .with_context(|| format!("Failed to read tracking record for {}", key.name))?;

        match response.item() {
            Some(item) => Ok(Some(item_to_record(key, item)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &TrackingRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .with_context(|| format!("Failed to create tracking record for {}", record.key.name))?;

        debug!(table = %self.table_name(), region = %record.key.region, name = %record.key.name, "Tracking record created");
        Ok(())
    }

    async fn update(&self, key: &RecordKey, update: &RecordUpdate) -> Result<()> {
        let request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .expression_attribute_values(":e", AttributeValue::N(update.expiration().to_string()));

        let request = match update {
            RecordUpdate::NotificationSent { notified_at, .. } => request
                .update_expression(format!("SET {ATTR_LAST_NOTIFICATION} = :l, {ATTR_EXPIRATION} = :e"))
                .expression_attribute_values(":l", AttributeValue::S(format_timestamp(*notified_at))),
            RecordUpdate::ExtendExpiration { .. } => {
                request.update_expression(format!("SET {ATTR_EXPIRATION} = :e"))
            }
        };

        request
            .send()
            .await
            .with_context(|| format!("Failed to update tracking record for {}", key.name))?;
        Ok(())
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool> {
        // DeleteItem on a missing key is not an error; the old item tells us
        // whether anything was removed
        let response = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_attributes(key)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .with_context(|| format!("Failed to delete tracking record for {}", key.name))?;

        let existed = response.attributes().is_some_and(|item| !item.is_empty());
        if existed {
            debug!(table = %self.table_name(), region = %key.region, name = %key.name, "Tracking record removed");
        }
        Ok(existed)
    }
}
