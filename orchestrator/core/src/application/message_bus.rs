// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Message Bus
//!
//! Port through which the runtime adapters reach application logic, plus an
//! in-process registry implementing it.
//!
//! Commands and queries resolve to exactly one handler. Events fan out to
//! every registered listener; an event without listeners is dropped.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::api_error::{ApiErrorKind, DispatchError};
use crate::domain::message::{Message, MessageKind};

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Execute a command and return its result
    async fn invoke(&self, command: Message) -> Result<Value, DispatchError>;

    /// Execute a query and return its result
    async fn request(&self, query: Message) -> Result<Value, DispatchError>;

    /// Deliver a message received from a queue, routed by its kind
    async fn dispatch(&self, message: Message) -> Result<(), DispatchError>;
}

type Handler = Arc<dyn Fn(Message) -> BoxFuture<'static, Result<Value, DispatchError>> + Send + Sync>;

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    commands: HashMap<String, Handler>,
    queries: HashMap<String, Handler>,
    listeners: HashMap<String, Vec<Handler>>,
}

fn boxed<F, Fut>(handler: F) -> Handler
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    Arc::new(move |message| Box::pin(handler(message)))
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        self.commands.insert(name.into(), boxed(handler));
        self
    }

    pub fn register_query<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        self.queries.insert(name.into(), boxed(handler));
        self
    }

    pub fn register_listener<F, Fut>(&mut self, event: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, DispatchError>> + Send + 'static,
    {
        self.listeners.entry(event.into()).or_default().push(boxed(handler));
        self
    }

    fn lookup<'a>(table: &'a HashMap<String, Handler>, message: &Message) -> Result<&'a Handler, DispatchError> {
        table.get(&message.name).ok_or_else(|| {
            DispatchError::api(
                ApiErrorKind::NotFound,
                format!("No handler registered for {}", message.name),
            )
        })
    }
}

#[async_trait]
impl MessageBus for HandlerRegistry {
    async fn invoke(&self, command: Message) -> Result<Value, DispatchError> {
        let handler = Self::lookup(&self.commands, &command)?;
        debug!(command = %command.name, "Invoking command");
        handler(command).await
    }

    async fn request(&self, query: Message) -> Result<Value, DispatchError> {
        let handler = Self::lookup(&self.queries, &query)?;
        debug!(query = %query.name, "Executing query");
        handler(query).await
    }

    async fn dispatch(&self, message: Message) -> Result<(), DispatchError> {
        match message.kind {
            MessageKind::Command => self.invoke(message).await.map(|_| ()),
            MessageKind::Query => self.request(message).await.map(|_| ()),
            MessageKind::Event => {
                let Some(listeners) = self.listeners.get(&message.name) else {
                    warn!(event = %message.name, "No listeners registered, dropping event");
                    return Ok(());
                };
                for listener in listeners {
                    listener(message.clone()).await?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_command_and_query_handlers() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_command("widgets.CreateWidget", |m: Message| async move {
                Ok(json!({"created": m.payload["name"]}))
            })
            .register_query("widgets.GetWidget", |m: Message| async move { Ok(json!({"id": m.payload["id"]})) });

        let mut payload = Map::new();
        payload.insert("name".into(), json!("x"));
        let result = registry.invoke(Message::command("widgets.CreateWidget", payload)).await.unwrap();
        assert_eq!(result, json!({"created": "x"}));

        let mut payload = Map::new();
        payload.insert("id".into(), json!("42"));
        let result = registry.request(Message::query("widgets.GetWidget", payload)).await.unwrap();
        assert_eq!(result, json!({"id": "42"}));
    }

    #[tokio::test]
    async fn test_unknown_handler_is_not_found() {
        let registry = HandlerRegistry::new();
        let err = registry
            .invoke(Message::command("widgets.Nope", Map::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Api { kind: ApiErrorKind::NotFound, .. }));
    }

    #[tokio::test]
    async fn test_event_fans_out_to_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        for listener in ["audit", "search"] {
            let seen = seen.clone();
            registry.register_listener("WidgetCreated", move |m: Message| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(format!("{listener}:{}", m.is_external()));
                    Ok(Value::Null)
                }
            });
        }

        let mut event = Message::event("WidgetCreated", Map::new());
        event.mark_external();
        registry.dispatch(event).await.unwrap();
        assert_eq!(*seen.lock(), vec!["audit:true", "search:true"]);

        registry
            .dispatch(Message::event("Unheard", Map::new()))
            .await
            .unwrap();
    }
}
