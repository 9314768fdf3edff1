// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Settings a deployed function reads from its environment.
//!
//! The resource graph injects these into every function; they are loaded
//! once at process start and shared read-only by every invocation.

use serde::{Deserialize, Serialize};

use crate::domain::project_config::ConfigError;

pub const PROJECT_VAR: &str = "PROJECT";
pub const ENV_VAR: &str = "ENV";
pub const ACCOUNT_ID_VAR: &str = "ACCOUNT_ID";
pub const CONTEXT_VAR: &str = "CONTEXT";
pub const REGION_VAR: &str = "REGION";
pub const BUCKET_VAR: &str = "BUCKET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    pub project: String,
    pub env: String,
    pub account_id: String,
    /// Context this function serves
    pub context: String,
    pub region: String,
    /// Bucket holding offloaded message payloads
    pub bucket: String,
}

impl RuntimeSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingSetting(name.to_string()))
        };

        Ok(Self {
            project: require(PROJECT_VAR)?,
            env: require(ENV_VAR)?,
            account_id: require(ACCOUNT_ID_VAR)?,
            context: require(CONTEXT_VAR)?,
            region: require(REGION_VAR)?,
            bucket: require(BUCKET_VAR)?,
        })
    }
}
