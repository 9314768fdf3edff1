// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stratus core
//!
//! Synthesizes and converges the resource graph of a serverless, event-driven
//! deployment and provides the runtime dispatcher its functions run.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Deployer (application) and runtime dispatcher (presentation)

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
