// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Schema materializer used when no relational repository is configured.
//!
//! Every relational entity is reported as lacking a repository, which the
//! deployer logs and skips.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::project_config::EntityConfig;
use crate::domain::schema::{MaterializeError, SchemaMaterializer};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSchemaMaterializer;

#[async_trait]
impl SchemaMaterializer for UnconfiguredSchemaMaterializer {
    async fn materialize(&self, context: &str, entity: &EntityConfig) -> Result<(), MaterializeError> {
        debug!(context = %context, entity = %entity.name, "No repository configured");
        Err(MaterializeError::NoRepository(format!("{}.{}", context, entity.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project_config::EntityStorage;

    #[tokio::test]
    async fn test_reports_missing_repository() {
        let entity = EntityConfig {
            name: "Widget".into(),
            storage: EntityStorage::Rdb,
        };
        let err = UnconfiguredSchemaMaterializer
            .materialize("widgets", &entity)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No repository registered for entity widgets.Widget");
    }
}
