// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deploy Use Case
//!
//! Application service sequencing one deploy run.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Converge the project stack, then every context stack
//! - **Collaborators:**
//!   - Domain: Deployment, ContextMap, ResourceNames
//!   - Application: ResourceGraphBuilder, SubscriptionTopology, ArtifactPackager, StackConvergenceEngine
//!   - Infrastructure: EventBus
//!
//! # Flow
//!
//! 1. Converge the project stack (bucket, API, stage, exported API id)
//! 2. For each service, sequentially:
//!    1. Resolve the code artifact (build + upload + prune, or reuse)
//!    2. Compute the subscription topology and ensure foreign topics exist
//!    3. Build and converge the context stack
//!    4. Materialize schemas of relational entities, skipping failures
//! 3. Publish DeploymentCompleted
//!
//! # Error Handling
//!
//! Configuration errors surface before anything is touched. Packaging and
//! convergence errors abort the run; re-running is safe because convergence
//! is idempotent. Schema errors are logged per entity and skipped.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::artifact_packager::ArtifactPackager;
use crate::application::resource_graph::ResourceGraphBuilder;
use crate::application::stack_convergence::StackConvergenceEngine;
use crate::application::subscription_topology::{SubscriptionTopology, TopicProvisioner};
use crate::domain::artifact::ArtifactVersion;
use crate::domain::context::{Context, ContextMap};
use crate::domain::deployment::Deployment;
use crate::domain::events::DeploymentEvent;
use crate::domain::project_config::{EntityStorage, ProjectConfig};
use crate::domain::schema::SchemaMaterializer;
use crate::domain::stack::ConvergenceOutcome;
use crate::domain::template::StackDescriptor;
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    pub name: String,
    pub outcome: ConvergenceOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentReport {
    pub stacks: Vec<StackReport>,
    pub artifacts: Vec<ArtifactVersion>,
    /// Contexts outside the project whose topic stack was created
    pub provisioned_topics: Vec<String>,
    /// `context.entity` names whose schema could not be materialized
    pub skipped_schemas: Vec<String>,
}

impl DeploymentReport {
    /// Whether the run changed anything in the target environment
    pub fn applied_changes(&self) -> bool {
        self.stacks.iter().any(|s| s.outcome.changed())
            || self.artifacts.iter().any(|a| !a.reused)
            || !self.provisioned_topics.is_empty()
    }
}

pub struct DeploymentOrchestrator {
    config: ProjectConfig,
    engine: Arc<StackConvergenceEngine>,
    topics: TopicProvisioner,
    packager: ArtifactPackager,
    schema: Arc<dyn SchemaMaterializer>,
    event_bus: Arc<EventBus>,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: ProjectConfig,
        engine: Arc<StackConvergenceEngine>,
        topics: TopicProvisioner,
        packager: ArtifactPackager,
        schema: Arc<dyn SchemaMaterializer>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            config,
            engine,
            topics,
            packager,
            schema,
            event_bus,
        }
    }

    pub async fn deploy(&self, deployment: &Deployment) -> Result<DeploymentReport> {
        info!(
            project = %deployment.project,
            environment = %deployment.environment,
            services = deployment.services.len(),
            "Starting deployment"
        );

        let builder = ResourceGraphBuilder::new(deployment, &self.config.provider);
        let map = ContextMap::from_config(&self.config);
        let sidecar = self
            .config
            .to_yaml_string()
            .context("Failed to serialize effective configuration")?;
        let mut report = DeploymentReport::default();

        info!("Creating project stack");
        let project_stack = builder
            .build_project_stack()
            .context("Failed to build project stack")?;
        self.converge(&project_stack, &mut report).await?;

        for service in &deployment.services {
            let context = map
                .get_context(&service.context)
                .with_context(|| format!("Service {} has no context", service.name))?;

            let artifact = self
                .packager
                .resolve(deployment, &service.name, &sidecar)
                .await
                .with_context(|| format!("Failed to package service {}", service.name))?;

            let topology = SubscriptionTopology::for_context(&map, context)
                .with_context(|| format!("Invalid subscriptions in context {}", context.name))?;
            let provisioned = self
                .topics
                .ensure_foreign_topics(&topology, &map, builder.names())
                .await
                .with_context(|| format!("Failed to provision foreign topics for {}", context.name))?;
            report.provisioned_topics.extend(provisioned);

            info!(context = %context.name, "Deploying stack");
            let stack = builder
                .build_context_stack(context, &artifact.key, &topology)
                .with_context(|| format!("Failed to build stack for context {}", context.name))?;
            self.converge(&stack, &mut report).await?;
            report.artifacts.push(artifact);

            let skipped = self.materialize_schemas(context).await;
            report.skipped_schemas.extend(skipped);
            info!(context = %context.name, "Done");
        }

        self.event_bus.publish(DeploymentEvent::DeploymentCompleted {
            environment: deployment.environment.clone(),
            stacks: report.stacks.len(),
            changed: report.applied_changes(),
            completed_at: Utc::now(),
        });
        info!(
            stacks = report.stacks.len(),
            changed = report.applied_changes(),
            "Deployment complete"
        );
        Ok(report)
    }

    async fn converge(&self, stack: &StackDescriptor, report: &mut DeploymentReport) -> Result<()> {
        let outcome = self
            .engine
            .converge(stack)
            .await
            .with_context(|| format!("Failed to converge stack {}", stack.name))?;

        self.event_bus.publish(DeploymentEvent::StackConverged {
            stack: stack.name.clone(),
            outcome,
            converged_at: Utc::now(),
        });
        report.stacks.push(StackReport {
            name: stack.name.clone(),
            outcome,
        });
        Ok(())
    }

    async fn materialize_schemas(&self, context: &Context) -> Vec<String> {
        let mut skipped = Vec::new();
        for entity in &context.entities {
            if entity.storage != EntityStorage::Rdb {
                debug!(context = %context.name, entity = %entity.name, "No schema to materialize");
                continue;
            }
            match self.schema.materialize(&context.name, entity).await {
                Ok(()) => {
                    self.event_bus.publish(DeploymentEvent::SchemaMaterialized {
                        context: context.name.clone(),
                        entity: entity.name.clone(),
                    });
                }
                Err(e) => {
                    warn!(context = %context.name, entity = %entity.name, error = %e, "Could not execute ddl for entity");
                    self.event_bus.publish(DeploymentEvent::SchemaSkipped {
                        context: context.name.clone(),
                        entity: entity.name.clone(),
                        reason: e.to_string(),
                    });
                    skipped.push(format!("{}.{}", context.name, entity.name));
                }
            }
        }
        skipped
    }
}

/// Every stack document of a run without touching any service.
///
/// Context stacks reference `code_key(service)` since a dry run has no
/// upload to point at.
pub fn render_stacks(
    config: &ProjectConfig,
    deployment: &Deployment,
    code_key: impl Fn(&str) -> String,
) -> Result<Vec<StackDescriptor>> {
    let builder = ResourceGraphBuilder::new(deployment, &config.provider);
    let map = ContextMap::from_config(config);

    let mut stacks = vec![builder.build_project_stack().context("Failed to build project stack")?];
    for service in &deployment.services {
        let context = map.get_context(&service.context)?;
        let topology = SubscriptionTopology::for_context(&map, context)?;
        let stack = builder
            .build_context_stack(context, &code_key(&service.name), &topology)
            .with_context(|| format!("Failed to build stack for context {}", context.name))?;
        stacks.push(stack);
    }
    Ok(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_changes() {
        let mut report = DeploymentReport::default();
        assert!(!report.applied_changes());

        report.stacks.push(StackReport {
            name: "acme-dev".into(),
            outcome: ConvergenceOutcome::Unchanged,
        });
        assert!(!report.applied_changes());

        report.stacks.push(StackReport {
            name: "acme-dev-widgets".into(),
            outcome: ConvergenceOutcome::Updated,
        });
        assert!(report.applied_changes());
    }

    #[test]
    fn test_render_stacks() {
        let config = ProjectConfig::from_yaml_str(
            r#"
project: acme
provider: {bucket: artifacts, region: us-east-1}
contexts:
  widgets: {}
  orders: {}
"#,
        )
        .unwrap();
        let deployment = Deployment::new(&config, "dev", "123456789012", &["widgets".to_string()]).unwrap();

        let stacks = render_stacks(&config, &deployment, |s| format!("pending/{s}.zip")).unwrap();
        let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["acme-dev", "acme-dev-widgets"]);

        let doc = stacks[1].template.to_value().unwrap();
        assert_eq!(
            doc["Resources"]["AcmeDevWidgetsSync"]["Properties"]["Code"]["S3Key"],
            "pending/widgets.zip"
        );
    }
}
