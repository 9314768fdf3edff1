// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource naming scheme shared by every stack.
//!
//! Logical ids must be alphanumeric, so they are camel-cased; stack names,
//! URL segments and storage prefixes are dasherized.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    project: String,
    env: String,
    region: String,
    account_id: String,
}

/// Which of the two functions of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRole {
    /// HTTP-triggered, bounded by the gateway timeout
    Sync,
    /// Queue-triggered, long timeout
    Async,
}

impl FunctionRole {
    fn suffix(self) -> &'static str {
        match self {
            FunctionRole::Sync => "Sync",
            FunctionRole::Async => "Async",
        }
    }
}

impl ResourceNames {
    pub fn new(
        project: impl Into<String>,
        env: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            env: env.into(),
            region: region.into(),
            account_id: account_id.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    fn prefix(&self) -> String {
        format!("{}{}", camelize(&self.project), camelize(&self.env))
    }

    /// `acme-dev` for the project stack, `acme-dev-widgets` for a context
    pub fn stack_name(&self, context: Option<&str>) -> String {
        match context {
            None => format!("{}-{}", dasherize(&self.project), dasherize(&self.env)),
            Some(c) => format!("{}-{}-{}", dasherize(&self.project), dasherize(&self.env), dasherize(c)),
        }
    }

    pub fn lambda_resource_name(&self, context: &str) -> String {
        format!("{}{}", self.prefix(), camelize(context))
    }

    pub fn function_name(&self, context: &str, role: FunctionRole) -> String {
        format!("{}{}", self.lambda_resource_name(context), role.suffix())
    }

    pub fn execution_role_name(&self, context: &str) -> String {
        format!("{}ExecutionRole", self.lambda_resource_name(context))
    }

    pub fn queue_name(&self, context: &str) -> String {
        format!("{}Queue", self.lambda_resource_name(context))
    }

    pub fn dead_letter_queue_name(&self, context: &str) -> String {
        format!("{}Dlq", self.queue_name(context))
    }

    pub fn topic_name(&self, context: &str) -> String {
        format!("{}Topic", self.lambda_resource_name(context))
    }

    pub fn topic_arn(&self, context: &str) -> String {
        format!("arn:aws:sns:{}:{}:{}", self.region, self.account_id, self.topic_name(context))
    }

    pub fn alert_topic_name(&self, context: &str) -> String {
        format!("{}Alerts", self.lambda_resource_name(context))
    }

    pub fn alert_topic_arn(&self, context: &str) -> String {
        format!("arn:aws:sns:{}:{}:{}", self.region, self.account_id, self.alert_topic_name(context))
    }

    pub fn alarm_subscription_name(&self, context: &str) -> String {
        format!("{}AlertsSubscription", self.lambda_resource_name(context))
    }

    /// `source` is `None` for the context's own topic
    pub fn subscription_name(&self, context: &str, source: Option<&str>) -> String {
        match source {
            None => format!("{}Subscription", self.lambda_resource_name(context)),
            Some(s) => format!("{}{}Subscription", self.lambda_resource_name(context), camelize(s)),
        }
    }

    pub fn rest_api_name(&self) -> String {
        format!("{}Api", self.prefix())
    }

    /// Export name of the API id, imported by every context stack
    pub fn rest_api_reference(&self) -> String {
        format!("{}Id", self.rest_api_name())
    }

    pub fn integration_name(&self, context: Option<&str>) -> String {
        match context {
            None => format!("{}Integration", self.rest_api_name()),
            Some(c) => format!("{}{}Integration", self.rest_api_name(), camelize(c)),
        }
    }

    pub fn route_name(&self, context: Option<&str>) -> String {
        match context {
            None => format!("{}Route", self.rest_api_name()),
            Some(c) => format!("{}{}Route", self.rest_api_name(), camelize(c)),
        }
    }

    /// URL segment a context is mounted under
    pub fn route_segment(&self, context: &str) -> String {
        dasherize(context)
    }

    /// Storage prefix holding every artifact version of a service
    pub fn code_path(&self, service: &str) -> String {
        format!("lambda/code/{}", dasherize(&self.lambda_resource_name(service)))
    }

    pub fn code_key(&self, service: &str, at: DateTime<Utc>) -> String {
        format!("{}/{}.zip", self.code_path(service), at.format("%Y-%m-%dT%H:%M:%S%.6f"))
    }

    pub fn human_api_name(&self) -> String {
        format!("{} {} API", humanize(&self.project), humanize(&self.env))
    }
}

fn words(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in value.chars() {
        if !ch.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `order_service` / `order-service` -> `OrderService`
pub fn camelize(value: &str) -> String {
    words(value)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `OrderService` / `order_service` -> `order-service`
pub fn dasherize(value: &str) -> String {
    words(value)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `order_service` -> `Order service`
pub fn humanize(value: &str) -> String {
    let joined = words(value)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
