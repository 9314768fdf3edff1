// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Storage Port - Anti-Corruption Layer for the artifact/payload store
//!
//! The deployer uploads and prunes code bundles through this port; the
//! runtime resolves oversized queue payloads through it. Concrete adapters
//! live in `crate::infrastructure::storage`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StorageError>;

    /// Fetch the object stored under `key`
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// List every object whose key starts with `prefix`
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Unknown storage error: {0}")]
    Unknown(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(err.to_string()),
            _ => StorageError::IoError(err.to_string()),
        }
    }
}
