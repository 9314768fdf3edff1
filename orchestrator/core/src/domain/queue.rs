// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Queue trigger records and the acknowledgment port.
//!
//! Retry and dead-lettering belong to the provisioned queue (visibility
//! timeout, max receive count). The runtime only reports which records
//! failed and when a delivery has been fully handled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::api_error::DispatchError;

/// Event source tag carried by every record of a queue trigger
pub const QUEUE_EVENT_SOURCE: &str = "aws:sqs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub receipt_handle: String,
    #[serde(default)]
    pub event_source: String,
    /// Transport envelope; its `Message` field holds the domain message
    #[serde(default)]
    pub body: Option<String>,
}

impl QueueRecord {
    /// Read a raw record. A record that does not match the expected shape
    /// keeps whatever identifiers it carries and no body, so it can still
    /// be rejected on its own.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| {
            let field = |name: &str| {
                value
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Self {
                message_id: field("messageId"),
                receipt_handle: field("receiptHandle"),
                event_source: field("eventSource"),
                body: None,
            }
        })
    }
}

#[async_trait]
pub trait QueueAcknowledger: Send + Sync {
    /// Negatively acknowledge one record so the queue redelivers it
    async fn nack(&self, record: &QueueRecord) -> Result<(), DispatchError>;

    /// Single-record delivery handled
    async fn complete_handshake(&self, record: &QueueRecord) -> Result<(), DispatchError>;

    /// Multi-record delivery handled; called once per batch
    async fn complete_batch_handshake(&self, records: &[QueueRecord]) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let record = QueueRecord::from_value(&json!({
            "messageId": "m-1",
            "receiptHandle": "h-1",
            "eventSource": "aws:sqs",
            "body": "{}",
        }));
        assert_eq!(record.message_id, "m-1");
        assert_eq!(record.body.as_deref(), Some("{}"));

        let missing_body = QueueRecord::from_value(&json!({"messageId": "m-2", "eventSource": "aws:sqs"}));
        assert_eq!(missing_body.message_id, "m-2");
        assert!(missing_body.body.is_none());

        let wrong_body = QueueRecord::from_value(&json!({"messageId": "m-3", "body": {"Message": "{}"}}));
        assert_eq!(wrong_body.message_id, "m-3");
        assert!(wrong_body.body.is_none());
    }
}
