// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Queue Adapter
//!
//! Unwraps each record of a queue trigger into a domain message and
//! dispatches it. Records are processed sequentially.
//!
//! A record whose payload cannot be resolved, or whose handler fails, is
//! negatively acknowledged and the batch continues. So is a record with no
//! body or an envelope without a `Message` field. A `Message` that decodes
//! to null ends the batch without any acknowledgment. Otherwise exactly one handshake
//! completion is issued at the end: per record for a single-record batch,
//! batch-level for anything larger.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::application::message_bus::MessageBus;
use crate::domain::api_error::DispatchError;
use crate::domain::message::Message;
use crate::domain::queue::{QueueAcknowledger, QueueRecord, QUEUE_EVENT_SOURCE};
use crate::domain::storage::ObjectStore;

/// Whether `event` is a queue trigger
pub fn is_queue_trigger(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .and_then(|record| record.get("eventSource"))
        .and_then(Value::as_str)
        == Some(QUEUE_EVENT_SOURCE)
}

pub struct QueueAdapter {
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    acknowledger: Arc<dyn QueueAcknowledger>,
}

impl QueueAdapter {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        acknowledger: Arc<dyn QueueAcknowledger>,
    ) -> Self {
        Self {
            bus,
            store,
            bucket: bucket.into(),
            acknowledger,
        }
    }

    /// Process a batch. Returns the ids of negatively acknowledged records
    /// as `batchItemFailures`, or `None` when a null message ended the batch.
    pub async fn handle(&self, event: &Value) -> Result<Option<Value>, DispatchError> {
        let records: Vec<QueueRecord> = event
            .get("Records")
            .and_then(Value::as_array)
            .ok_or_else(|| DispatchError::Malformed("queue trigger carries no Records".into()))?
            .iter()
            .map(QueueRecord::from_value)
            .collect();
        let mut failures = Vec::new();

        for record in &records {
            let mut message = match self.resolve(record).await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!(message_id = %record.message_id, "Got a null message");
                    return Ok(None);
                }
                Err(e) => {
                    error!(message_id = %record.message_id, error = %e, "Failed to resolve message");
                    self.reject(record, &mut failures).await;
                    continue;
                }
            };

            message.mark_external();
            debug!(message_id = %record.message_id, name = %message.name, "Dispatching message");
            if let Err(e) = self.bus.dispatch(message).await {
                error!(message_id = %record.message_id, error = %e, "Message handler failed");
                self.reject(record, &mut failures).await;
            }
        }

        match records.as_slice() {
            [single] => self.acknowledger.complete_handshake(single).await?,
            batch => self.acknowledger.complete_batch_handshake(batch).await?,
        }

        let failures: Vec<Value> = failures
            .into_iter()
            .map(|id| json!({ "itemIdentifier": id }))
            .collect();
        Ok(Some(json!({ "batchItemFailures": failures })))
    }

    /// Decode the transport envelope and its embedded message, fetching
    /// offloaded payloads from storage
    async fn resolve(&self, record: &QueueRecord) -> Result<Option<Message>, DispatchError> {
        let body = record
            .body
            .as_deref()
            .ok_or_else(|| DispatchError::Malformed(format!("record {} has no body", record.message_id)))?;
        let envelope: Value = serde_json::from_str(body)?;
        let embedded = envelope.get("Message").ok_or_else(|| {
            DispatchError::Malformed(format!("record {} envelope has no Message", record.message_id))
        })?;
        let mut content = match embedded {
            Value::String(embedded) => serde_json::from_str(embedded)?,
            other => other.clone(),
        };

        if let Some(key) = Message::payload_reference(&content).map(str::to_string) {
            debug!(message_id = %record.message_id, key = %key, "Loading offloaded payload");
            let bytes = self.store.get(&self.bucket, &key).await?;
            content = serde_json::from_slice(&bytes)?;
        }

        if content.is_null() {
            return Ok(None);
        }
        Message::from_value(&content)
            .map(Some)
            .ok_or_else(|| DispatchError::Malformed(format!("record {} carries no tagged message", record.message_id)))
    }

    async fn reject(&self, record: &QueueRecord, failures: &mut Vec<String>) {
        if let Err(e) = self.acknowledger.nack(record).await {
            error!(message_id = %record.message_id, error = %e, "Failed to nack record");
        }
        failures.push(record.message_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_queue_trigger() {
        assert!(is_queue_trigger(&json!({"Records": [{"eventSource": "aws:sqs", "body": "{}"}]})));
        assert!(!is_queue_trigger(&json!({"Records": [{"eventSource": "aws:s3"}]})));
        assert!(!is_queue_trigger(&json!({"Records": []})));
        assert!(!is_queue_trigger(&json!({"_kind": "command"})));
    }
}
