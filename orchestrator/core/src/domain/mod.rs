// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects, aggregates and ports shared by the deployer and the runtime.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Deployment model, template graph, messaging model and service ports

pub mod project_config;
pub mod context;
pub mod deployment;
pub mod naming;
pub mod template;
pub mod storage;
pub mod artifact;
pub mod stack;
pub mod notification;
pub mod schema;
pub mod events;
pub mod message;
pub mod queue;
pub mod api_error;
pub mod route;
