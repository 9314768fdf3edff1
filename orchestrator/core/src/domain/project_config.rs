// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Project Configuration
//!
//! Declarative project manifest consumed by the deployer and, as a sidecar
//! document inside every bundle, by the deployed runtime.
//!
//! # Discovery order
//!
//! 1. Explicit `--config` path
//! 2. `STRATUS_CONFIG_PATH` environment variable
//! 3. `./stratus.yaml`
//! 4. `~/.stratus/config.yaml`
//! 5. `/etc/stratus/config.yaml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::context::ContextMap;

/// Methods an endpoint may declare.
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Top-level project manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used as the prefix of every resource name
    pub project: String,

    /// Cloud provider settings shared by all contexts
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Bounded contexts keyed by name
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Artifact bucket (required for deploys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Deployment region (required for deploys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Function runtime identifier
    #[serde(default = "default_runtime")]
    pub runtime: String,

    #[serde(default)]
    pub functions: FunctionSettings,

    /// Optional network attachment for every function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<VpcConfig>,

    /// Optional error alerting (alarm topic, alarms, email subscription)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorAlertConfig>,

    #[serde(default)]
    pub packaging: PackagingConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            runtime: default_runtime(),
            functions: FunctionSettings::default(),
            vpc: None,
            errors: None,
            packaging: PackagingConfig::default(),
        }
    }
}

/// Defaults for the function template parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSettings {
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,

    /// Timeout of the HTTP-triggered function, bounded by the gateway
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout: u32,

    /// Timeout of the queue-triggered function
    #[serde(default = "default_async_timeout")]
    pub async_timeout: u32,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            memory_size: default_memory_size(),
            sync_timeout: default_sync_timeout(),
            async_timeout: default_async_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VpcConfig {
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default)]
    pub subnet_ids: Vec<String>,
}

impl VpcConfig {
    /// A network attachment needs both security groups and subnets.
    pub fn is_complete(&self) -> bool {
        !self.security_group_ids.is_empty() && !self.subnet_ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorAlertConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAlertConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAlertConfig {
    pub recipients: String,
}

/// Bundle assembly settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// Command installing dependencies into the build directory.
    /// The `{target}` placeholder is replaced with the build directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<Vec<String>>,

    /// Runtime entry point copied into every bundle
    #[serde(default = "default_entry_point")]
    pub entry_point: PathBuf,

    /// File name of the effective configuration inside the bundle
    #[serde(default = "default_sidecar_name")]
    pub sidecar_name: String,

    /// Directory the install command and entry point are resolved against
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            install_command: None,
            entry_point: default_entry_point(),
            sidecar_name: default_sidecar_name(),
            source_dir: default_source_dir(),
        }
    }
}

/// Per-context section of the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,

    /// Event names this context publishes
    #[serde(default)]
    pub events: Vec<String>,

    /// Service name -> event references (`context.Event` or a bare `Event`)
    #[serde(default)]
    pub event_listeners: BTreeMap<String, Vec<String>>,

    /// Function environment overrides
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub storage: EntityStorage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStorage {
    /// Relational storage; schema is materialized after deploy
    Rdb,
    Document,
    #[default]
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub path: String,
    pub method: String,
    /// Command or query dispatched on a match
    pub message: String,
    #[serde(default)]
    pub secured: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No project name configured")]
    MissingProject,

    #[error("No deployment bucket configured in provider settings")]
    MissingBucket,

    #[error("No deployment region configured in provider settings")]
    MissingRegion,

    #[error("Missing runtime setting: {0}")]
    MissingSetting(String),

    #[error("Unknown context: {0}")]
    UnknownContext(String),

    #[error("Invalid event reference '{reference}' in context '{context}'")]
    InvalidEventReference { context: String, reference: String },

    #[error("Event '{event}' referenced by context '{context}' is not declared by any context")]
    UnknownEvent { context: String, event: String },

    #[error("Event '{event}' is declared by more than one context: {owners:?}")]
    AmbiguousEvent { event: String, owners: Vec<String> },

    #[error("Invalid HTTP method '{method}' on endpoint {path} in context '{context}'")]
    InvalidMethod {
        context: String,
        path: String,
        method: String,
    },

    #[error("No configuration file found")]
    NotFound,

    #[error("Failed to read configuration at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ProjectConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Serialize the effective configuration (used for the bundle sidecar)
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover a configuration file using the precedence order above
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("STRATUS_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./stratus.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".stratus").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/stratus/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load from an explicit path or discovery, then apply env overrides.
    ///
    /// There is no default project; a missing file is an error.
    pub fn load(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match cli_path {
            Some(path) => {
                tracing::info!("Loading configuration from explicit path: {:?}", path);
                path
            }
            None => {
                let path = Self::discover_config().ok_or(ConfigError::NotFound)?;
                tracing::info!("Loading configuration from discovered path: {:?}", path);
                path
            }
        };

        let mut config = Self::from_yaml_file(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides so CI can retarget a deploy
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bucket) = std::env::var("STRATUS_BUCKET") {
            tracing::info!("Environment override: STRATUS_BUCKET={}", bucket);
            self.provider.bucket = Some(bucket);
        }
        if let Ok(region) = std::env::var("STRATUS_REGION") {
            tracing::info!("Environment override: STRATUS_REGION={}", region);
            self.provider.region = Some(region);
        }
    }

    pub fn bucket(&self) -> Result<&str, ConfigError> {
        self.provider
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or(ConfigError::MissingBucket)
    }

    pub fn region(&self) -> Result<&str, ConfigError> {
        self.provider
            .region
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(ConfigError::MissingRegion)
    }

    /// Validate everything a deploy needs before any resource is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingProject);
        }
        self.bucket()?;
        self.region()?;

        for (name, context) in &self.contexts {
            for endpoint in &context.endpoints {
                let method = endpoint.method.to_ascii_uppercase();
                if !HTTP_METHODS.contains(&method.as_str()) {
                    return Err(ConfigError::InvalidMethod {
                        context: name.clone(),
                        path: endpoint.path.clone(),
                        method: endpoint.method.clone(),
                    });
                }
            }
        }

        ContextMap::from_config(self).validate()
    }
}

fn default_runtime() -> String {
    "provided.al2023".to_string()
}

fn default_memory_size() -> u32 {
    3008
}

fn default_sync_timeout() -> u32 {
    30
}

fn default_async_timeout() -> u32 {
    900
}

fn default_entry_point() -> PathBuf {
    PathBuf::from("templates/aws/bootstrap")
}

fn default_sidecar_name() -> String {
    "stratus.yaml".to_string()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
project: acme
provider:
  bucket: acme-deployments
  region: us-east-1
  vpc:
    security_group_ids: [sg-1]
    subnet_ids: [subnet-1]
contexts:
  widgets:
    entities:
      - name: Widget
        storage: rdb
    events: [WidgetCreated]
    event_listeners:
      WidgetService: [orders.OrderPlaced, WidgetCreated]
    endpoints:
      - path: /widgets/{id}
        method: get
        message: widgets.GetWidget
  orders:
    events: [OrderPlaced]
"#;

    #[test]
    fn test_parse_applies_defaults() {
        let config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.project, "acme");
        assert_eq!(config.provider.runtime, "provided.al2023");
        assert_eq!(config.provider.functions.memory_size, 3008);
        assert_eq!(config.provider.functions.async_timeout, 900);
        assert_eq!(config.provider.packaging.sidecar_name, "stratus.yaml");
        assert!(config.provider.vpc.as_ref().unwrap().is_complete());

        let widgets = &config.contexts["widgets"];
        assert_eq!(widgets.entities[0].storage, EntityStorage::Rdb);
        assert!(!widgets.endpoints[0].secured);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_bucket_is_rejected() {
        let mut config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        config.provider.bucket = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingBucket)));
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        let mut config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        config.contexts.get_mut("widgets").unwrap().endpoints[0].method = "FETCH".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMethod { .. })));
    }

    #[test]
    fn test_sidecar_round_trips_through_yaml() {
        let config = ProjectConfig::from_yaml_str(SAMPLE).unwrap();
        let yaml = config.to_yaml_string().unwrap();
        let reparsed = ProjectConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(reparsed.contexts.len(), 2);
        assert_eq!(reparsed.bucket().unwrap(), "acme-deployments");
    }
}
