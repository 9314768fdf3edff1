// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Subscription Topology Builder
//!
//! Groups a context's subscriptions by source context and folds them into
//! topic subscription resources of the context stack.
//!
//! - The context's own events get one subscription on its own topic.
//! - Every other source context gets one subscription on that context's topic.
//! - Filter policies list exact event names; never prefixes or wildcards.
//! - Every subscription redrives into the listening context's dead-letter queue.
//!
//! Topics of source contexts this project does not deploy are probed and,
//! when absent, created in a minimal stack of their own before the
//! subscription referencing them is declared.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::resource_graph::build_topic_stack;
use crate::application::stack_convergence::{ConvergenceError, StackConvergenceEngine};
use crate::domain::context::{Context, ContextMap, Subscription};
use crate::domain::events::DeploymentEvent;
use crate::domain::naming::ResourceNames;
use crate::domain::notification::TopicService;
use crate::domain::project_config::ConfigError;
use crate::domain::template::{Expr, Resource, Template, TemplateError, TopicSubscription};
use crate::infrastructure::event_bus::EventBus;

/// Logical ids of the listening context's queue resources
#[derive(Debug, Clone, Copy)]
pub struct QueueWiring<'a> {
    pub queue_id: &'a str,
    pub dead_letter_queue_id: &'a str,
    pub topic_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTopology {
    context: String,
    /// Source context -> event names, deduplicated, in registration order
    groups: BTreeMap<String, Vec<String>>,
}

impl SubscriptionTopology {
    pub fn from_subscriptions(context: impl Into<String>, subscriptions: &[Subscription]) -> Self {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for subscription in subscriptions {
            let events = groups.entry(subscription.source_context.clone()).or_default();
            if !events.contains(&subscription.event) {
                events.push(subscription.event.clone());
            }
        }
        Self {
            context: context.into(),
            groups,
        }
    }

    pub fn for_context(map: &ContextMap, context: &Context) -> Result<Self, ConfigError> {
        let subscriptions = map.subscriptions(context)?;
        Ok(Self::from_subscriptions(&context.name, &subscriptions))
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Events the context listens to on its own topic
    pub fn own_events(&self) -> &[String] {
        self.groups.get(&self.context).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Other source contexts with the events wanted from each
    pub fn foreign(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .filter(|(source, _)| **source != self.context)
            .map(|(source, events)| (source.as_str(), events.as_slice()))
    }

    /// Every context whose topic publishes into this context's queue
    pub fn source_contexts(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Foreign sources this project does not deploy
    pub fn unknown_sources<'a>(&'a self, map: &'a ContextMap) -> impl Iterator<Item = &'a str> {
        self.foreign()
            .map(|(source, _)| source)
            .filter(move |source| !map.contains(source))
    }

    /// Topic ARNs allowed to publish into the context's queues
    pub fn topic_arns(&self, names: &ResourceNames) -> Vec<String> {
        self.source_contexts().map(|c| names.topic_arn(c)).collect()
    }

    /// Declare one subscription per source context; returns their logical ids
    pub fn apply(
        &self,
        template: &mut Template,
        names: &ResourceNames,
        wiring: QueueWiring<'_>,
    ) -> Result<Vec<String>, TemplateError> {
        let mut ids = Vec::new();

        let own = self.own_events();
        if !own.is_empty() {
            let id = template.add_resource(
                names.subscription_name(&self.context, None),
                Resource::new(subscription(
                    names.topic_arn(&self.context),
                    own,
                    wiring,
                ))
                .depends_on([wiring.queue_id, wiring.dead_letter_queue_id, wiring.topic_id]),
            )?;
            ids.push(id);
        }

        for (source, events) in self.foreign() {
            let id = template.add_resource(
                names.subscription_name(&self.context, Some(source)),
                Resource::new(subscription(names.topic_arn(source), events, wiring))
                    .depends_on([wiring.queue_id, wiring.dead_letter_queue_id]),
            )?;
            ids.push(id);
        }

        Ok(ids)
    }
}

fn subscription(topic_arn: String, events: &[String], wiring: QueueWiring<'_>) -> TopicSubscription {
    TopicSubscription {
        protocol: "sqs".to_string(),
        endpoint: Expr::arn_of(wiring.queue_id),
        topic_arn: Expr::Str(topic_arn),
        filter_policy: Some(filter_policy(events)),
        redrive_policy: Some(json!({
            "deadLetterTargetArn": Expr::arn_of(wiring.dead_letter_queue_id).to_value(),
        })),
    }
}

/// Exact-match filter on the message name
pub fn filter_policy(events: &[String]) -> Value {
    json!({ "_name": events })
}

/// Ensures topics of source contexts outside the project exist
pub struct TopicProvisioner {
    topics: Arc<dyn TopicService>,
    engine: Arc<StackConvergenceEngine>,
    event_bus: Arc<EventBus>,
}

impl TopicProvisioner {
    pub fn new(
        topics: Arc<dyn TopicService>,
        engine: Arc<StackConvergenceEngine>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            topics,
            engine,
            event_bus,
        }
    }

    /// Returns the source contexts whose topic had to be created
    pub async fn ensure_foreign_topics(
        &self,
        topology: &SubscriptionTopology,
        map: &ContextMap,
        names: &ResourceNames,
    ) -> Result<Vec<String>, ConvergenceError> {
        let mut provisioned = Vec::new();

        for source in topology.unknown_sources(map) {
            let arn = names.topic_arn(source);
            match self.topics.get_topic_attributes(&arn).await {
                Ok(_) => {
                    debug!(topic = %arn, "Topic exists");
                    continue;
                }
                Err(e) => {
                    debug!(topic = %arn, error = %e, "Topic probe failed, treating as absent");
                }
            }

            info!(context = %source, "Creating stack for context \"{}\"", source);
            let stack = build_topic_stack(names, source).map_err(|e| ConvergenceError::Template {
                stack: names.stack_name(Some(source)),
                source: e,
            })?;
            self.engine.converge(&stack).await?;

            self.event_bus.publish(DeploymentEvent::TopicProvisioned {
                context: source.to_string(),
                topic_arn: arn,
                provisioned_at: chrono::Utc::now(),
            });
            provisioned.push(source.to_string());
        }

        Ok(provisioned)
    }
}
