// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stack Convergence Engine
//!
//! Drives one named stack to its target template.
//!
//! # Flow
//!
//! 1. Describe the stack; "does not exist" means create, success means update
//! 2. Submit the template; "no updates are to be performed" is success
//! 3. Poll at a fixed interval until the status leaves `*_IN_PROGRESS`
//!
//! Any other service error aborts the deploy. Polling uses a fixed interval
//! without backoff.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::stack::{ConvergenceOutcome, StackService, StackServiceError};
use crate::domain::template::{StackDescriptor, TemplateError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConvergenceError {
    #[error("Invalid template for stack {stack}: {source}")]
    Template {
        stack: String,
        #[source]
        source: TemplateError,
    },

    #[error("Stack service call failed for {stack}: {source}")]
    Service {
        stack: String,
        #[source]
        source: StackServiceError,
    },

    #[error("Stack {stack} settled in {status}")]
    TerminalStatus { stack: String, status: String },
}

pub struct StackConvergenceEngine {
    service: Arc<dyn StackService>,
    poll_interval: Duration,
}

impl StackConvergenceEngine {
    pub fn new(service: Arc<dyn StackService>) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn converge(&self, stack: &StackDescriptor) -> Result<ConvergenceOutcome, ConvergenceError> {
        let body = stack.template.to_json().map_err(|source| ConvergenceError::Template {
            stack: stack.name.clone(),
            source,
        })?;

        let exists = match self.service.describe(&stack.name).await {
            Ok(_) => true,
            Err(e) if e.is_stack_missing() => false,
            Err(source) => return Err(self.service_error(stack, source)),
        };

        let outcome = if exists {
            info!(stack = %stack.name, "Updating stack");
            match self.service.update(&stack.name, &body).await {
                Ok(()) => ConvergenceOutcome::Updated,
                Err(e) if e.is_no_updates() => {
                    info!(stack = %stack.name, "No updates to be performed");
                    return Ok(ConvergenceOutcome::Unchanged);
                }
                Err(source) => return Err(self.service_error(stack, source)),
            }
        } else {
            info!(stack = %stack.name, "Creating stack");
            self.service
                .create(&stack.name, &body)
                .await
                .map_err(|source| self.service_error(stack, source))?;
            ConvergenceOutcome::Created
        };

        self.wait_until_settled(&stack.name).await?;
        Ok(outcome)
    }

    async fn wait_until_settled(&self, stack_name: &str) -> Result<(), ConvergenceError> {
        loop {
            let description = self.service.describe(stack_name).await.map_err(|source| ConvergenceError::Service {
                stack: stack_name.to_string(),
                source,
            })?;

            if description.status.is_in_progress() {
                debug!(stack = %stack_name, status = %description.status, "Waiting...");
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            if description.status.is_failed() {
                return Err(ConvergenceError::TerminalStatus {
                    stack: stack_name.to_string(),
                    status: description.status.to_string(),
                });
            }

            info!(stack = %stack_name, status = %description.status, "Stack settled");
            return Ok(());
        }
    }

    fn service_error(&self, stack: &StackDescriptor, source: StackServiceError) -> ConvergenceError {
        ConvergenceError::Service {
            stack: stack.name.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stack::{StackDescription, StackStatus};
    use crate::domain::template::Template;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Stack service replaying scripted describe results
    struct ScriptedStackService {
        describes: Mutex<VecDeque<Result<&'static str, StackServiceError>>>,
        update_result: Mutex<Option<StackServiceError>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedStackService {
        fn new(describes: Vec<Result<&'static str, StackServiceError>>) -> Self {
            Self {
                describes: Mutex::new(describes.into()),
                update_result: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_update(self, error: StackServiceError) -> Self {
            *self.update_result.lock() = Some(error);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl StackService for ScriptedStackService {
        async fn describe(&self, stack_name: &str) -> Result<StackDescription, StackServiceError> {
            self.calls.lock().push("describe".into());
            let next = self.describes.lock().pop_front().unwrap_or(Ok("CREATE_COMPLETE"));
            next.map(|status| StackDescription {
                name: stack_name.to_string(),
                status: StackStatus::new(status),
            })
        }

        async fn create(&self, _stack_name: &str, _template_body: &str) -> Result<(), StackServiceError> {
            self.calls.lock().push("create".into());
            Ok(())
        }

        async fn update(&self, _stack_name: &str, _template_body: &str) -> Result<(), StackServiceError> {
            self.calls.lock().push("update".into());
            match self.update_result.lock().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn engine(service: Arc<ScriptedStackService>) -> StackConvergenceEngine {
        StackConvergenceEngine::new(service).with_poll_interval(Duration::from_millis(1))
    }

    fn stack() -> StackDescriptor {
        StackDescriptor::new("acme-dev", Template::new())
    }

    #[tokio::test]
    async fn test_missing_stack_is_created_and_polled() {
        let service = Arc::new(ScriptedStackService::new(vec![
            Err(StackServiceError::stack_missing("acme-dev")),
            Ok("CREATE_IN_PROGRESS"),
            Ok("CREATE_IN_PROGRESS"),
            Ok("CREATE_COMPLETE"),
        ]));

        let outcome = engine(service.clone()).converge(&stack()).await.unwrap();
        assert_eq!(outcome, ConvergenceOutcome::Created);
        assert_eq!(
            service.calls(),
            vec!["describe", "create", "describe", "describe", "describe"]
        );
    }

    #[tokio::test]
    async fn test_existing_stack_is_updated() {
        let service = Arc::new(ScriptedStackService::new(vec![
            Ok("CREATE_COMPLETE"),
            Ok("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"),
            Ok("UPDATE_COMPLETE"),
        ]));

        let outcome = engine(service.clone()).converge(&stack()).await.unwrap();
        assert_eq!(outcome, ConvergenceOutcome::Updated);
        assert_eq!(service.calls()[1], "update");
    }

    #[tokio::test]
    async fn test_no_updates_is_success_without_polling() {
        let service = Arc::new(
            ScriptedStackService::new(vec![Ok("UPDATE_COMPLETE")])
                .failing_update(StackServiceError::no_updates()),
        );

        let outcome = engine(service.clone()).converge(&stack()).await.unwrap();
        assert_eq!(outcome, ConvergenceOutcome::Unchanged);
        assert_eq!(service.calls(), vec!["describe", "update"]);
    }

    #[tokio::test]
    async fn test_other_errors_are_fatal() {
        let throttled = StackServiceError::Api {
            code: "Throttling".into(),
            message: "Rate exceeded".into(),
        };
        let service = Arc::new(ScriptedStackService::new(vec![Err(throttled)]));
        let result = engine(service.clone()).converge(&stack()).await;
        assert!(matches!(result, Err(ConvergenceError::Service { .. })));
        assert_eq!(service.calls(), vec!["describe"]);

        let service = Arc::new(
            ScriptedStackService::new(vec![Ok("UPDATE_COMPLETE")])
                .failing_update(StackServiceError::Transport("connection reset".into())),
        );
        let result = engine(service).converge(&stack()).await;
        assert!(matches!(result, Err(ConvergenceError::Service { .. })));
    }

    #[tokio::test]
    async fn test_rollback_is_reported() {
        let service = Arc::new(ScriptedStackService::new(vec![
            Ok("UPDATE_COMPLETE"),
            Ok("UPDATE_ROLLBACK_IN_PROGRESS"),
            Ok("UPDATE_ROLLBACK_COMPLETE"),
        ]));

        match engine(service).converge(&stack()).await {
            Err(ConvergenceError::TerminalStatus { status, .. }) => {
                assert_eq!(status, "UPDATE_ROLLBACK_COMPLETE")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
