// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Notification Service Port
//!
//! Only used as an existence probe for topics owned by contexts this project
//! does not deploy.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[async_trait]
pub trait TopicService: Send + Sync {
    async fn get_topic_attributes(&self, topic_arn: &str) -> Result<BTreeMap<String, String>, TopicServiceError>;
}

#[derive(Debug, Error)]
pub enum TopicServiceError {
    #[error("Topic not found: {0}")]
    NotFound(String),

    #[error("Notification service error: {0}")]
    Service(String),
}
