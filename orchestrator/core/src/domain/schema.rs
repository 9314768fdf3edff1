// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Post-deploy schema materialization port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::project_config::EntityConfig;

#[async_trait]
pub trait SchemaMaterializer: Send + Sync {
    /// Create or migrate the storage schema backing `entity`
    async fn materialize(&self, context: &str, entity: &EntityConfig) -> Result<(), MaterializeError>;
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("No repository registered for entity {0}")]
    NoRepository(String),

    #[error("Schema backend error: {0}")]
    Backend(String),
}
