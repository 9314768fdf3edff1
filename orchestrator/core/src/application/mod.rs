// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod resource_graph;
pub mod subscription_topology;
pub mod stack_convergence;
pub mod artifact_packager;
pub mod deployment_orchestrator;
pub mod message_bus;

// Re-export use cases for convenience
pub use deployment_orchestrator::{render_stacks, DeploymentOrchestrator, DeploymentReport, StackReport};
pub use message_bus::{HandlerRegistry, MessageBus};
pub use stack_convergence::{ConvergenceError, StackConvergenceEngine};
