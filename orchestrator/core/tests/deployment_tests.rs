// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stratus_core::application::artifact_packager::ArtifactPackager;
use stratus_core::application::deployment_orchestrator::DeploymentOrchestrator;
use stratus_core::application::stack_convergence::StackConvergenceEngine;
use stratus_core::application::subscription_topology::TopicProvisioner;
use stratus_core::domain::artifact::{BundleBuilder, PackagingError};
use stratus_core::domain::deployment::{ArtifactMode, Deployment};
use stratus_core::domain::events::DeploymentEvent;
use stratus_core::domain::project_config::ProjectConfig;
use stratus_core::domain::stack::ConvergenceOutcome;
use stratus_core::infrastructure::event_bus::EventBus;
use stratus_core::infrastructure::local_stack::LocalStackService;
use stratus_core::infrastructure::schema::UnconfiguredSchemaMaterializer;
use stratus_core::infrastructure::storage::InMemoryObjectStore;
use tempfile::TempDir;

const CONFIG: &str = r#"
project: acme
provider:
  bucket: acme-deployments
  region: us-east-1
contexts:
  widgets:
    entities:
      - {name: Widget, storage: rdb}
      - {name: WidgetCache}
    events: [WidgetCreated]
    event_listeners:
      WidgetService: [WidgetCreated, orders.OrderPlaced, billing.InvoicePaid]
      AuditService: [shipping.ParcelSent, orders.OrderPlaced]
    endpoints:
      - {path: "/widgets/{id}", method: GET, message: widgets.GetWidget}
  orders:
    events: [OrderPlaced, OrderCancelled]
"#;

struct StaticBundle;

#[async_trait]
impl BundleBuilder for StaticBundle {
    async fn build(&self, service: &str, sidecar: &str) -> Result<Vec<u8>, PackagingError> {
        Ok(format!("{service}\n{sidecar}").into_bytes())
    }
}

struct Harness {
    _state: TempDir,
    stacks: Arc<LocalStackService>,
    store: Arc<InMemoryObjectStore>,
    bus: Arc<EventBus>,
    orchestrator: DeploymentOrchestrator,
}

fn config() -> ProjectConfig {
    ProjectConfig::from_yaml_str(CONFIG).unwrap()
}

fn harness() -> Harness {
    let state = TempDir::new().unwrap();
    let stacks = Arc::new(LocalStackService::new(state.path()).unwrap());
    let engine = Arc::new(StackConvergenceEngine::new(stacks.clone()).with_poll_interval(Duration::from_millis(1)));
    let bus = Arc::new(EventBus::new(1024));
    let store = Arc::new(InMemoryObjectStore::new());

    let orchestrator = DeploymentOrchestrator::new(
        config(),
        engine.clone(),
        TopicProvisioner::new(stacks.clone(), engine, bus.clone()),
        ArtifactPackager::new(store.clone(), Arc::new(StaticBundle), bus.clone()),
        Arc::new(UnconfiguredSchemaMaterializer),
        bus.clone(),
    );

    Harness {
        _state: state,
        stacks,
        store,
        bus,
        orchestrator,
    }
}

fn deployment(mode: ArtifactMode) -> Deployment {
    Deployment::new(&config(), "dev", "123456789012", &[])
        .unwrap()
        .with_artifact_mode(mode)
}

#[tokio::test]
async fn test_second_run_applies_no_changes() {
    let harness = harness();

    let first = harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();
    assert!(first.applied_changes());
    let names: Vec<&str> = first.stacks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["acme-dev", "acme-dev-orders", "acme-dev-widgets"]);
    assert!(first.stacks.iter().all(|s| s.outcome == ConvergenceOutcome::Created));

    let second = harness
        .orchestrator
        .deploy(&deployment(ArtifactMode::ReuseLatest))
        .await
        .unwrap();
    assert!(!second.applied_changes());
    assert!(second.stacks.iter().all(|s| s.outcome == ConvergenceOutcome::Unchanged));
    assert!(second.artifacts.iter().all(|a| a.reused));
    assert!(second.provisioned_topics.is_empty());
}

#[tokio::test]
async fn test_cross_context_subscriptions_are_filtered_by_name() {
    let harness = harness();
    harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();

    let doc = harness.stacks.template("acme-dev-widgets").await.unwrap().unwrap();
    let own_topic = "arn:aws:sns:us-east-1:123456789012:AcmeDevWidgetsTopic";
    let mut foreign: Vec<(String, serde_json::Value)> = doc["Resources"]
        .as_object()
        .unwrap()
        .values()
        .filter(|r| r["Type"] == "AWS::SNS::Subscription")
        .filter(|r| r["Properties"]["TopicArn"] != own_topic)
        .map(|r| {
            (
                r["Properties"]["TopicArn"].as_str().unwrap().to_string(),
                r["Properties"]["FilterPolicy"].clone(),
            )
        })
        .collect();
    foreign.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(foreign.len(), 3);
    assert_eq!(foreign[0].0, "arn:aws:sns:us-east-1:123456789012:AcmeDevBillingTopic");
    assert_eq!(foreign[0].1, serde_json::json!({"_name": ["InvoicePaid"]}));
    assert_eq!(foreign[1].0, "arn:aws:sns:us-east-1:123456789012:AcmeDevOrdersTopic");
    assert_eq!(foreign[1].1, serde_json::json!({"_name": ["OrderPlaced"]}));
    assert_eq!(foreign[2].0, "arn:aws:sns:us-east-1:123456789012:AcmeDevShippingTopic");
    assert_eq!(foreign[2].1, serde_json::json!({"_name": ["ParcelSent"]}));

    let own = doc["Resources"]["AcmeDevWidgetsSubscription"]["Properties"].clone();
    assert_eq!(own["TopicArn"], own_topic);
    assert_eq!(own["FilterPolicy"], serde_json::json!({"_name": ["WidgetCreated"]}));
}

#[tokio::test]
async fn test_unknown_source_topics_are_provisioned_once() {
    let harness = harness();
    let mut events = harness.bus.subscribe();

    let first = harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();
    assert_eq!(first.provisioned_topics, vec!["billing", "shipping"]);
    assert!(harness.stacks.template("acme-dev-billing").await.unwrap().is_some());
    assert!(harness.stacks.template("acme-dev-shipping").await.unwrap().is_some());

    let provisioned = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, DeploymentEvent::TopicProvisioned { .. }))
        .count();
    assert_eq!(provisioned, 2);

    let second = harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();
    assert!(second.provisioned_topics.is_empty());
}

#[tokio::test]
async fn test_repeated_deploys_keep_two_artifacts_per_service() {
    let harness = harness();
    for _ in 0..4 {
        harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();
    }

    let keys = harness.store.keys("acme-deployments");
    for prefix in ["lambda/code/acme-dev-widgets/", "lambda/code/acme-dev-orders/"] {
        assert_eq!(keys.iter().filter(|k| k.starts_with(prefix)).count(), 2, "{prefix}");
    }
}

#[tokio::test]
async fn test_relational_schema_failures_are_skipped() {
    let harness = harness();
    let mut events = harness.bus.subscribe();

    let report = harness.orchestrator.deploy(&deployment(ArtifactMode::Build)).await.unwrap();
    assert_eq!(report.skipped_schemas, vec!["widgets.Widget"]);

    let skipped: Vec<String> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            DeploymentEvent::SchemaSkipped { context, entity, .. } => Some(format!("{context}.{entity}")),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["widgets.Widget"]);
}

#[tokio::test]
async fn test_only_filter_limits_context_stacks() {
    let harness = harness();
    let deployment = Deployment::new(&config(), "dev", "123456789012", &["orders".to_string()]).unwrap();

    let report = harness.orchestrator.deploy(&deployment).await.unwrap();
    let names: Vec<&str> = report.stacks.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["acme-dev", "acme-dev-orders"]);
    assert!(harness.stacks.template("acme-dev-widgets").await.unwrap().is_none());
}
