// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event Dispatcher
//!
//! Entry point of a deployed function. Classifies the raw trigger payload
//! and hands it to the matching adapter:
//!
//! 1. HTTP request context present → [`HttpAdapter`]
//! 2. Records whose first entry comes from the queue → [`QueueAdapter`]
//! 3. Otherwise the payload is read as a message: commands are invoked,
//!    queries executed, and their results returned
//!
//! Any other payload produces no result.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::message_bus::MessageBus;
use crate::domain::api_error::DispatchError;
use crate::domain::message::{Message, MessageKind};
use crate::domain::project_config::{ConfigError, ProjectConfig};
use crate::domain::queue::QueueAcknowledger;
use crate::domain::route::RestRouter;
use crate::domain::storage::ObjectStore;
use crate::presentation::http::{is_http_trigger, HttpAdapter};
use crate::presentation::queue::{is_queue_trigger, QueueAdapter};
use crate::presentation::runtime_settings::RuntimeSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Http,
    Queue,
    Direct,
}

pub struct EventDispatcher {
    http: HttpAdapter,
    queue: QueueAdapter,
    bus: Arc<dyn MessageBus>,
}

impl EventDispatcher {
    pub fn new(http: HttpAdapter, queue: QueueAdapter, bus: Arc<dyn MessageBus>) -> Self {
        Self { http, queue, bus }
    }

    /// Wire the adapters for the context named in `settings`
    pub fn from_settings(
        settings: &RuntimeSettings,
        config: &ProjectConfig,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn ObjectStore>,
        acknowledger: Arc<dyn QueueAcknowledger>,
    ) -> Result<Self, ConfigError> {
        let context = config
            .contexts
            .get(&settings.context)
            .ok_or_else(|| ConfigError::UnknownContext(settings.context.clone()))?;

        let router = RestRouter::from_endpoints(&context.endpoints);
        info!(context = %settings.context, routes = router.len(), "Dispatcher ready");

        Ok(Self::new(
            HttpAdapter::new(router, bus.clone()),
            QueueAdapter::new(bus.clone(), store, settings.bucket.clone(), acknowledger),
            bus,
        ))
    }

    pub fn classify(event: &Value) -> TriggerKind {
        if is_http_trigger(event) {
            TriggerKind::Http
        } else if is_queue_trigger(event) {
            TriggerKind::Queue
        } else {
            TriggerKind::Direct
        }
    }

    pub async fn handle(&self, event: Value) -> Result<Option<Value>, DispatchError> {
        match Self::classify(&event) {
            TriggerKind::Http => {
                info!("HTTP request");
                self.http.handle(&event).await
            }
            TriggerKind::Queue => {
                info!("Queue message");
                self.queue.handle(&event).await
            }
            TriggerKind::Direct => self.handle_direct(&event).await,
        }
    }

    async fn handle_direct(&self, event: &Value) -> Result<Option<Value>, DispatchError> {
        let Some(message) = Message::from_value(event) else {
            warn!("Unrecognized trigger payload, no response");
            return Ok(None);
        };
        match message.kind {
            MessageKind::Command => self.bus.invoke(message).await.map(Some),
            MessageKind::Query => self.bus.request(message).await.map(Some),
            MessageKind::Event => {
                warn!(event = %message.name, "Direct event payloads are not handled, no response");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(
            EventDispatcher::classify(&json!({"requestContext": {"http": {"method": "GET"}}, "rawPath": "/"})),
            TriggerKind::Http
        );
        assert_eq!(
            EventDispatcher::classify(&json!({"Records": [{"eventSource": "aws:sqs", "body": "{}"}]})),
            TriggerKind::Queue
        );
        assert_eq!(
            EventDispatcher::classify(&json!({"_kind": "command", "_name": "widgets.Sync"})),
            TriggerKind::Direct
        );
        assert_eq!(
            EventDispatcher::classify(&json!({"Records": [{"eventSource": "aws:s3"}]})),
            TriggerKind::Direct
        );
    }
}
