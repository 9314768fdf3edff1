// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Declarative Infrastructure Service Port
//!
//! The infrastructure service reports benign outcomes ("stack does not exist",
//! "no updates are to be performed") as ordinary errors. They are recognised
//! here through named predicates; any other error is fatal to a deploy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message fragment reported when describing an absent stack
pub const STACK_MISSING_SENTINEL: &str = "does not exist";

/// Message fragment reported when an update matches the live stack
pub const NO_UPDATES_SENTINEL: &str = "No updates are to be performed";

/// Reported status of a stack, e.g. `UPDATE_IN_PROGRESS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackStatus(String);

impl StackStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Still transitioning; keep polling
    pub fn is_in_progress(&self) -> bool {
        self.0.ends_with("_IN_PROGRESS")
    }

    /// Terminal, but the target state was not reached
    pub fn is_failed(&self) -> bool {
        !self.is_in_progress() && (self.0.ends_with("_FAILED") || self.0.ends_with("ROLLBACK_COMPLETE"))
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of driving a stack to its target template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceOutcome {
    Created,
    Updated,
    Unchanged,
}

impl ConvergenceOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, ConvergenceOutcome::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    pub status: StackStatus,
}

#[async_trait]
pub trait StackService: Send + Sync {
    async fn describe(&self, stack_name: &str) -> Result<StackDescription, StackServiceError>;

    async fn create(&self, stack_name: &str, template_body: &str) -> Result<(), StackServiceError>;

    async fn update(&self, stack_name: &str, template_body: &str) -> Result<(), StackServiceError>;
}

#[derive(Debug, Clone, Error)]
pub enum StackServiceError {
    /// Error reported by the service itself
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl StackServiceError {
    pub fn stack_missing(stack_name: &str) -> Self {
        StackServiceError::Api {
            code: "ValidationError".to_string(),
            message: format!("Stack with id {} {}", stack_name, STACK_MISSING_SENTINEL),
        }
    }

    pub fn no_updates() -> Self {
        StackServiceError::Api {
            code: "ValidationError".to_string(),
            message: NO_UPDATES_SENTINEL.to_string(),
        }
    }

    fn message(&self) -> Option<&str> {
        match self {
            StackServiceError::Api { message, .. } => Some(message),
            StackServiceError::Transport(_) => None,
        }
    }

    /// Describe target is absent; proceed to create
    pub fn is_stack_missing(&self) -> bool {
        self.message().is_some_and(|m| m.contains(STACK_MISSING_SENTINEL))
    }

    /// Update submitted but nothing differs; convergence succeeded
    pub fn is_no_updates(&self) -> bool {
        self.message().is_some_and(|m| m.contains(NO_UPDATES_SENTINEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_predicates() {
        assert!(StackServiceError::stack_missing("acme-dev").is_stack_missing());
        assert!(!StackServiceError::stack_missing("acme-dev").is_no_updates());
        assert!(StackServiceError::no_updates().is_no_updates());

        let throttled = StackServiceError::Api {
            code: "Throttling".into(),
            message: "Rate exceeded".into(),
        };
        assert!(!throttled.is_stack_missing());
        assert!(!throttled.is_no_updates());

        // Transport failures never count as benign, whatever their text
        let transport = StackServiceError::Transport("stack does not exist".into());
        assert!(!transport.is_stack_missing());
    }

    #[test]
    fn test_status_classification() {
        assert!(StackStatus::new("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS").is_in_progress());
        assert!(!StackStatus::new("CREATE_COMPLETE").is_in_progress());
        assert!(StackStatus::new("CREATE_FAILED").is_failed());
        assert!(StackStatus::new("UPDATE_ROLLBACK_COMPLETE").is_failed());
        assert!(!StackStatus::new("ROLLBACK_IN_PROGRESS").is_failed());
        assert!(!StackStatus::new("UPDATE_COMPLETE").is_failed());
    }
}
