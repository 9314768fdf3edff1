// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Stack Service
//!
//! File-backed implementation of the StackService and TopicService ports for
//! development, dry runs and tests. Each stack is one JSON file holding its
//! status and last applied template. Operations settle immediately.
//!
//! Mirrors the hosted service where the deployer depends on it:
//! - describing an unknown stack reports "does not exist"
//! - updating with an identical template reports "No updates are to be performed"
//! - a topic exists when some stored stack declares it

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::notification::{TopicService, TopicServiceError};
use crate::domain::stack::{StackDescription, StackService, StackServiceError, StackStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredStack {
    status: String,
    template: Value,
    updated_at: DateTime<Utc>,
}

pub struct LocalStackService {
    state_dir: PathBuf,
}

impl LocalStackService {
    pub fn new(state_dir: impl Into<PathBuf>) -> Result<Self, StackServiceError> {
        let state_dir = state_dir.into();
        std::fs::create_dir_all(state_dir.join("stacks")).map_err(|e| {
            StackServiceError::Transport(format!(
                "Failed to create state directory {}: {}",
                state_dir.display(),
                e
            ))
        })?;
        Ok(Self { state_dir })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn stack_path(&self, stack_name: &str) -> Result<PathBuf, StackServiceError> {
        if stack_name.is_empty() || !stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(StackServiceError::Api {
                code: "ValidationError".to_string(),
                message: format!("Invalid stack name: {}", stack_name),
            });
        }
        Ok(self.state_dir.join("stacks").join(format!("{stack_name}.json")))
    }

    async fn load(&self, stack_name: &str) -> Result<Option<StoredStack>, StackServiceError> {
        let path = self.stack_path(stack_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StackServiceError::Transport(format!("Corrupt stack state {}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StackServiceError::Transport(e.to_string())),
        }
    }

    async fn store(&self, stack_name: &str, stack: &StoredStack) -> Result<(), StackServiceError> {
        let path = self.stack_path(stack_name)?;
        let bytes = serde_json::to_vec_pretty(stack).map_err(|e| StackServiceError::Transport(e.to_string()))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StackServiceError::Transport(e.to_string()))
    }

    /// Last applied template of a stack
    pub async fn template(&self, stack_name: &str) -> Result<Option<Value>, StackServiceError> {
        Ok(self.load(stack_name).await?.map(|s| s.template))
    }

    /// Names of every stored stack
    pub async fn stack_names(&self) -> Result<Vec<String>, StackServiceError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.state_dir.join("stacks"))
            .await
            .map_err(|e| StackServiceError::Transport(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StackServiceError::Transport(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn parse_template(template_body: &str) -> Result<Value, StackServiceError> {
        serde_json::from_str(template_body).map_err(|e| StackServiceError::Api {
            code: "ValidationError".to_string(),
            message: format!("Template format error: {}", e),
        })
    }
}

#[async_trait]
impl StackService for LocalStackService {
    async fn describe(&self, stack_name: &str) -> Result<StackDescription, StackServiceError> {
        match self.load(stack_name).await? {
            Some(stack) => Ok(StackDescription {
                name: stack_name.to_string(),
                status: StackStatus::new(stack.status),
            }),
            None => Err(StackServiceError::stack_missing(stack_name)),
        }
    }

    async fn create(&self, stack_name: &str, template_body: &str) -> Result<(), StackServiceError> {
        if self.load(stack_name).await?.is_some() {
            return Err(StackServiceError::Api {
                code: "AlreadyExistsException".to_string(),
                message: format!("Stack [{}] already exists", stack_name),
            });
        }
        let template = Self::parse_template(template_body)?;
        debug!(stack = %stack_name, "Creating local stack");
        self.store(
            stack_name,
            &StoredStack {
                status: "CREATE_COMPLETE".to_string(),
                template,
                updated_at: Utc::now(),
            },
        )
        .await
    }

    async fn update(&self, stack_name: &str, template_body: &str) -> Result<(), StackServiceError> {
        let current = self
            .load(stack_name)
            .await?
            .ok_or_else(|| StackServiceError::stack_missing(stack_name))?;
        let template = Self::parse_template(template_body)?;
        if current.template == template {
            return Err(StackServiceError::no_updates());
        }
        debug!(stack = %stack_name, "Updating local stack");
        self.store(
            stack_name,
            &StoredStack {
                status: "UPDATE_COMPLETE".to_string(),
                template,
                updated_at: Utc::now(),
            },
        )
        .await
    }
}

#[async_trait]
impl TopicService for LocalStackService {
    async fn get_topic_attributes(&self, topic_arn: &str) -> Result<BTreeMap<String, String>, TopicServiceError> {
        let topic_name = topic_arn.rsplit(':').next().unwrap_or(topic_arn);
        let names = self
            .stack_names()
            .await
            .map_err(|e| TopicServiceError::Service(e.to_string()))?;

        for stack_name in names {
            let Some(template) = self
                .template(&stack_name)
                .await
                .map_err(|e| TopicServiceError::Service(e.to_string()))?
            else {
                continue;
            };
            let declared = template["Resources"]
                .as_object()
                .into_iter()
                .flat_map(|resources| resources.values())
                .any(|r| r["Type"] == "AWS::SNS::Topic" && r["Properties"]["TopicName"] == topic_name);
            if declared {
                return Ok(BTreeMap::from([
                    ("TopicArn".to_string(), topic_arn.to_string()),
                    ("StackName".to_string(), stack_name),
                ]));
            }
        }
        Err(TopicServiceError::NotFound(topic_arn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOPIC_TEMPLATE: &str =
        r#"{"Resources": {"AcmeDevBillingTopic": {"Type": "AWS::SNS::Topic", "Properties": {"TopicName": "AcmeDevBillingTopic"}}}}"#;

    fn service() -> (TempDir, LocalStackService) {
        let dir = TempDir::new().unwrap();
        let service = LocalStackService::new(dir.path()).unwrap();
        (dir, service)
    }

    #[tokio::test]
    async fn test_describe_missing_stack() {
        let (_dir, service) = service();
        let err = service.describe("acme-dev").await.unwrap_err();
        assert!(err.is_stack_missing());
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let (_dir, service) = service();
        service.create("acme-dev", r#"{"Resources": {}}"#).await.unwrap();
        assert_eq!(service.describe("acme-dev").await.unwrap().status.as_str(), "CREATE_COMPLETE");

        let err = service.create("acme-dev", r#"{"Resources": {}}"#).await.unwrap_err();
        assert!(!err.is_stack_missing() && !err.is_no_updates());

        let err = service.update("acme-dev", r#"{"Resources": {}}"#).await.unwrap_err();
        assert!(err.is_no_updates());

        service.update("acme-dev", TOPIC_TEMPLATE).await.unwrap();
        assert_eq!(service.describe("acme-dev").await.unwrap().status.as_str(), "UPDATE_COMPLETE");
        assert_eq!(service.stack_names().await.unwrap(), vec!["acme-dev"]);
    }

    #[tokio::test]
    async fn test_topic_probe() {
        let (_dir, service) = service();
        let arn = "arn:aws:sns:us-east-1:123456789012:AcmeDevBillingTopic";
        assert!(matches!(
            service.get_topic_attributes(arn).await,
            Err(TopicServiceError::NotFound(_))
        ));

        service.create("acme-dev-billing", TOPIC_TEMPLATE).await.unwrap();
        let attributes = service.get_topic_attributes(arn).await.unwrap();
        assert_eq!(attributes["StackName"], "acme-dev-billing");
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let (_dir, service) = service();
        assert!(service.describe("../escape").await.is_err());
        assert!(!service.describe("../escape").await.unwrap_err().is_stack_missing());
    }
}
