// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the stratus CLI

pub mod config;
pub mod deploy;
pub mod template;

pub use self::config::ConfigCommand;
pub use self::deploy::DeployArgs;
pub use self::template::TemplateArgs;

use clap::Args;
use std::path::PathBuf;

use stratus_core::domain::deployment::Deployment;
use stratus_core::domain::project_config::ProjectConfig;

/// Target selection shared by `deploy` and `template`
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Environment name (dev, staging, prod, ...)
    #[arg(short, long, env = "STRATUS_ENV")]
    pub env: String,

    /// Account the resources are deployed into
    #[arg(long, env = "STRATUS_ACCOUNT_ID")]
    pub account_id: String,

    /// Deploy only these contexts (repeatable; default: all)
    #[arg(long, value_name = "CONTEXT")]
    pub only: Vec<String>,
}

impl TargetArgs {
    pub fn deployment(&self, config: &ProjectConfig) -> anyhow::Result<Deployment> {
        Ok(Deployment::new(config, &self.env, &self.account_id, &self.only)?)
    }
}

/// Load the project manifest from `--config` or discovery
pub fn load_config(config_override: Option<PathBuf>) -> anyhow::Result<ProjectConfig> {
    use anyhow::Context;
    ProjectConfig::load(config_override).context("Failed to load configuration")
}
