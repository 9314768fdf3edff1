// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Context Map
//!
//! Read-only registry of bounded contexts: the entities each owns, the events
//! it publishes and the event listeners it registers. Subscriptions are
//! derived from the listener registrations and drive the queue/topic wiring
//! of every context stack.

use std::collections::BTreeMap;

use crate::domain::project_config::{ConfigError, ContextConfig, EndpointConfig, EntityConfig, ProjectConfig};

/// A bounded context as seen by the deployer and the runtime
#[derive(Debug, Clone)]
pub struct Context {
    pub name: String,
    pub entities: Vec<EntityConfig>,
    pub events: Vec<String>,
    pub event_listeners: BTreeMap<String, Vec<String>>,
    pub environment: BTreeMap<String, String>,
    pub endpoints: Vec<EndpointConfig>,
}

impl Context {
    pub fn from_config(name: impl Into<String>, config: &ContextConfig) -> Self {
        Self {
            name: name.into(),
            entities: config.entities.clone(),
            events: config.events.clone(),
            event_listeners: config.event_listeners.clone(),
            environment: config.environment.clone(),
            endpoints: config.endpoints.clone(),
        }
    }
}

/// Event reference as written in a listener registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    /// `orders.OrderPlaced`
    Qualified { context: String, event: String },
    /// `OrderPlaced`, owner resolved through the context map
    Bare(String),
}

impl EventRef {
    pub fn parse(reference: &str) -> Option<Self> {
        let parts: Vec<&str> = reference.split('.').collect();
        match parts.as_slice() {
            [event] if !event.is_empty() => Some(EventRef::Bare(event.to_string())),
            [context, event] if !context.is_empty() && !event.is_empty() => Some(EventRef::Qualified {
                context: context.to_string(),
                event: event.to_string(),
            }),
            _ => None,
        }
    }
}

/// Derived fact: `event` published by `source_context` is wanted by a listener
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub event: String,
    pub source_context: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    contexts: BTreeMap<String, Context>,
}

impl ContextMap {
    pub fn from_config(config: &ProjectConfig) -> Self {
        let contexts = config
            .contexts
            .iter()
            .map(|(name, c)| (name.clone(), Context::from_config(name.clone(), c)))
            .collect();
        Self { contexts }
    }

    pub fn get(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn get_context(&self, name: &str) -> Result<&Context, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownContext(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    /// Context declaring `event` among its published events
    pub fn owner_of(&self, event: &str) -> Result<Option<&str>, ConfigError> {
        let owners: Vec<&str> = self
            .contexts
            .values()
            .filter(|c| c.events.iter().any(|e| e == event))
            .map(|c| c.name.as_str())
            .collect();

        match owners.as_slice() {
            [] => Ok(None),
            [owner] => Ok(Some(owner)),
            _ => Err(ConfigError::AmbiguousEvent {
                event: event.to_string(),
                owners: owners.iter().map(|o| o.to_string()).collect(),
            }),
        }
    }

    /// Extract `{event, source context}` pairs from a context's listeners.
    ///
    /// Explicitly qualified references name their source context, which may
    /// be unknown to this map. Bare references resolve through the owning
    /// context declared in the map.
    pub fn subscriptions(&self, context: &Context) -> Result<Vec<Subscription>, ConfigError> {
        let mut subscriptions = Vec::new();
        for references in context.event_listeners.values() {
            for reference in references {
                let parsed = EventRef::parse(reference).ok_or_else(|| ConfigError::InvalidEventReference {
                    context: context.name.clone(),
                    reference: reference.clone(),
                })?;

                let subscription = match parsed {
                    EventRef::Qualified { context: source, event } => Subscription {
                        event,
                        source_context: source,
                    },
                    EventRef::Bare(event) => {
                        let owner = self.owner_of(&event)?.ok_or_else(|| ConfigError::UnknownEvent {
                            context: context.name.clone(),
                            event: event.clone(),
                        })?;
                        Subscription {
                            event,
                            source_context: owner.to_string(),
                        }
                    }
                };
                subscriptions.push(subscription);
            }
        }
        Ok(subscriptions)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for context in self.contexts.values() {
            self.subscriptions(context)?;
        }
        Ok(())
    }
}
