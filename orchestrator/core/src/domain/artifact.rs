// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Code Artifacts
//!
//! An artifact version is an immutable bundle stored under a per-service
//! prefix with a timestamp-suffixed key. Retention keeps the two most recent
//! versions so the previous deploy can always be rolled back to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::storage::{ObjectSummary, StorageError};

/// Versions kept per service after pruning
pub const RETAINED_VERSIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub service: String,
    pub key: String,
    pub last_modified: DateTime<Utc>,
    /// True when an existing upload was reused instead of building
    pub reused: bool,
}

/// Keys to delete so that only the newest `RETAINED_VERSIONS` remain.
///
/// Nothing is deleted while fewer than `RETAINED_VERSIONS + 1` versions
/// exist. Equal modification times are ordered by key, which embeds the
/// upload timestamp.
pub fn versions_to_prune(mut objects: Vec<ObjectSummary>) -> Vec<String> {
    if objects.len() <= RETAINED_VERSIONS {
        return Vec::new();
    }
    objects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| b.key.cmp(&a.key))
    });
    objects
        .into_iter()
        .skip(RETAINED_VERSIONS)
        .map(|o| o.key)
        .collect()
}

/// Newest version under a prefix, if any
pub fn latest_version(objects: &[ObjectSummary]) -> Option<&ObjectSummary> {
    objects
        .iter()
        .max_by(|a, b| a.last_modified.cmp(&b.last_modified).then_with(|| a.key.cmp(&b.key)))
}

/// Assembles the deployable bundle of a service
#[async_trait]
pub trait BundleBuilder: Send + Sync {
    /// Build the compressed bundle, embedding `sidecar` as the effective
    /// configuration document.
    async fn build(&self, service: &str, sidecar: &str) -> Result<Vec<u8>, PackagingError>;
}

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("Failed to prepare build directory: {0}")]
    BuildDirectory(#[source] std::io::Error),

    #[error("Dependency install command {command:?} failed: {reason}")]
    InstallFailed { command: Vec<String>, reason: String },

    #[error("Runtime entry point not found at {0:?}")]
    MissingEntryPoint(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write archive: {0}")]
    Archive(String),

    #[error("Artifact storage failed: {0}")]
    Storage(#[from] StorageError),
}
