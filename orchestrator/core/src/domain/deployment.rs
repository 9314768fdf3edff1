// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment run aggregate. Built per orchestrator invocation, never persisted.

use crate::domain::context::ContextMap;
use crate::domain::naming::ResourceNames;
use crate::domain::project_config::{ConfigError, ProjectConfig};

/// A deployable service. Each service belongs to exactly one context and is
/// deployed as a sync and an async function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub context: String,
}

/// How the code artifact for each service is obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArtifactMode {
    /// Build, upload and prune a fresh bundle
    #[default]
    Build,
    /// Point functions at the newest uploaded version; build only if none exists
    ReuseLatest,
}

#[derive(Debug, Clone)]
pub struct Deployment {
    pub environment: String,
    pub account_id: String,
    pub region: String,
    pub project: String,
    pub bucket: String,
    pub services: Vec<Service>,
    pub artifact_mode: ArtifactMode,
}

impl Deployment {
    /// Build a deployment for every context, or only the ones in `only`.
    ///
    /// Fails on configuration errors before anything is provisioned.
    pub fn new(
        config: &ProjectConfig,
        environment: impl Into<String>,
        account_id: impl Into<String>,
        only: &[String],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let map = ContextMap::from_config(config);
        for name in only {
            map.get_context(name)?;
        }

        let services = map
            .names()
            .filter(|name| only.is_empty() || only.iter().any(|o| o == name))
            .map(|name| Service {
                name: name.to_string(),
                context: name.to_string(),
            })
            .collect();

        Ok(Self {
            environment: environment.into(),
            account_id: account_id.into(),
            region: config.region()?.to_string(),
            project: config.project.clone(),
            bucket: config.bucket()?.to_string(),
            services,
            artifact_mode: ArtifactMode::Build,
        })
    }

    pub fn with_artifact_mode(mut self, mode: ArtifactMode) -> Self {
        self.artifact_mode = mode;
        self
    }

    pub fn names(&self) -> ResourceNames {
        ResourceNames::new(&self.project, &self.environment, &self.region, &self.account_id)
    }
}
