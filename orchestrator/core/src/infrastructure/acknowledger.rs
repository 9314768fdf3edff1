// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Queue acknowledger for the function runtime.
//!
//! The function runtime deletes successfully processed records itself and
//! redelivers the ones reported in `batchItemFailures`, so acknowledgment
//! here only records what happened.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::api_error::DispatchError;
use crate::domain::queue::{QueueAcknowledger, QueueRecord};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAcknowledger;

#[async_trait]
impl QueueAcknowledger for LoggingAcknowledger {
    async fn nack(&self, record: &QueueRecord) -> Result<(), DispatchError> {
        warn!(message_id = %record.message_id, "Record will be redelivered");
        Ok(())
    }

    async fn complete_handshake(&self, record: &QueueRecord) -> Result<(), DispatchError> {
        debug!(message_id = %record.message_id, "Delivery handled");
        Ok(())
    }

    async fn complete_batch_handshake(&self, records: &[QueueRecord]) -> Result<(), DispatchError> {
        debug!(records = records.len(), "Batch delivery handled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acknowledgments_succeed() {
        let record = QueueRecord {
            message_id: "m-1".into(),
            receipt_handle: "r-1".into(),
            event_source: "aws:sqs".into(),
            body: Some("{}".into()),
        };
        let ack = LoggingAcknowledger;
        ack.nack(&record).await.unwrap();
        ack.complete_handshake(&record).await.unwrap();
        ack.complete_batch_handshake(&[record.clone(), record]).await.unwrap();
    }
}
