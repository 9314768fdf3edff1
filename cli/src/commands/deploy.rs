// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deploy command
//!
//! Wires the core services against the local backend (file-backed stack
//! state, directory-backed buckets) and runs one deployment, printing
//! progress events as they are published.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use stratus_core::application::artifact_packager::ArtifactPackager;
use stratus_core::application::deployment_orchestrator::{DeploymentOrchestrator, DeploymentReport};
use stratus_core::application::stack_convergence::StackConvergenceEngine;
use stratus_core::application::subscription_topology::TopicProvisioner;
use stratus_core::domain::deployment::ArtifactMode;
use stratus_core::domain::events::DeploymentEvent;
use stratus_core::domain::stack::ConvergenceOutcome;
use stratus_core::infrastructure::event_bus::{EventBus, EventBusError};
use stratus_core::infrastructure::storage::{create_object_store, StorageBackend};
use stratus_core::infrastructure::{LocalBundleBuilder, LocalStackService, UnconfiguredSchemaMaterializer};

use super::{load_config, TargetArgs};

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Point functions at the newest uploaded artifact instead of rebuilding
    #[arg(long)]
    pub reuse_artifacts: bool,

    /// Directory holding local stack state
    #[arg(long, env = "STRATUS_STATE_DIR", default_value = ".stratus/state")]
    pub state_dir: PathBuf,

    /// Directory holding local buckets
    #[arg(long, env = "STRATUS_ARTIFACTS_DIR", default_value = ".stratus/buckets")]
    pub artifacts_dir: PathBuf,
}

pub async fn execute(args: DeployArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_override)?;
    let mode = if args.reuse_artifacts {
        ArtifactMode::ReuseLatest
    } else {
        ArtifactMode::Build
    };
    let deployment = args.target.deployment(&config)?.with_artifact_mode(mode);

    let stacks = Arc::new(
        LocalStackService::new(&args.state_dir)
            .with_context(|| format!("Failed to open stack state at {}", args.state_dir.display()))?,
    );
    let store = create_object_store(StorageBackend::Local {
        base_path: args.artifacts_dir.to_string_lossy().to_string(),
    })
    .context("Failed to open artifact storage")?;
    let event_bus = Arc::new(EventBus::with_default_capacity());
    let engine = Arc::new(StackConvergenceEngine::new(stacks.clone()));

    let orchestrator = DeploymentOrchestrator::new(
        config.clone(),
        engine.clone(),
        TopicProvisioner::new(stacks, engine, event_bus.clone()),
        ArtifactPackager::new(
            store,
            Arc::new(LocalBundleBuilder::new(config.provider.packaging.clone())),
            event_bus.clone(),
        ),
        Arc::new(UnconfiguredSchemaMaterializer),
        event_bus.clone(),
    );

    let mut receiver = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => print_event(&event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });

    info!(environment = %deployment.environment, "Deploying {}", config.project);
    let result = orchestrator.deploy(&deployment).await;

    // Closing every sender ends the printer
    drop(orchestrator);
    drop(event_bus);
    printer.await.context("Event printer failed")?;

    let report = result?;
    print_summary(&report);
    Ok(())
}

fn print_event(event: &DeploymentEvent) {
    match event {
        DeploymentEvent::StackConverged { stack, outcome, .. } => {
            let label = match outcome {
                ConvergenceOutcome::Created => "created".green(),
                ConvergenceOutcome::Updated => "updated".yellow(),
                ConvergenceOutcome::Unchanged => "unchanged".dimmed(),
            };
            println!("  {} {} {}", "stack".bold(), stack, label);
        }
        DeploymentEvent::TopicProvisioned { context, topic_arn, .. } => {
            println!("  {} {} {}", "topic".bold(), context, topic_arn.dimmed());
        }
        DeploymentEvent::ArtifactUploaded { service, key, size_bytes, .. } => {
            println!("  {} {} {} ({} bytes)", "artifact".bold(), service, key, size_bytes);
        }
        DeploymentEvent::ArtifactReused { service, key } => {
            println!("  {} {} {} {}", "artifact".bold(), service, key, "reused".dimmed());
        }
        DeploymentEvent::ArtifactPruned { key, .. } => {
            println!("  {} {}", "pruned".bold(), key.dimmed());
        }
        DeploymentEvent::SchemaMaterialized { context, entity } => {
            println!("  {} {}.{}", "schema".bold(), context, entity);
        }
        DeploymentEvent::SchemaSkipped { context, entity, reason } => {
            println!("  {} {}.{} {}", "schema".bold(), context, entity, reason.yellow());
        }
        DeploymentEvent::DeploymentCompleted { .. } => {}
    }
}

fn print_summary(report: &DeploymentReport) {
    println!();
    if report.applied_changes() {
        println!(
            "{}",
            format!("✓ Deployed {} stacks", report.stacks.len()).green()
        );
    } else {
        println!("{}", "✓ No changes to deploy".green());
    }
    if !report.skipped_schemas.is_empty() {
        println!(
            "{}",
            format!("  Skipped schemas: {}", report.skipped_schemas.join(", ")).yellow()
        );
    }
}
