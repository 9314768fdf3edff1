// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Object Store
//!
//! Filesystem-backed implementation of ObjectStore for development, dry
//! runs and tests. Each bucket is a directory under the base path and each
//! key is a relative file path inside it.
//!
//! **Limitations:**
//! - Modification times come from the filesystem, so two writes within the
//!   filesystem's timestamp granularity may list with equal times
//! - No access control beyond filesystem permissions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::storage::{ObjectStore, ObjectSummary, StorageError};

pub struct LocalObjectStore {
    /// Base directory holding one directory per bucket
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::IoError(format!(
                "Failed to create base directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        Self::check_relative(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    /// Resolve `key` inside `bucket`, rejecting traversal outside the bucket
    fn resolve(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let key = key.strip_prefix('/').unwrap_or(key);
        Self::check_relative(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }

    fn check_relative(path: &str) -> Result<(), StorageError> {
        if path.is_empty() {
            return Err(StorageError::InvalidKey(path.to_string()));
        }
        let escapes = Path::new(path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::InvalidKey(path.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let path = self.resolve(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!("Writing {} bytes to {}", body.len(), path.display());
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        let root = self.bucket_path(bucket)?;
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !key.starts_with(prefix) {
                continue;
            }
            let modified = entry
                .metadata()
                .map_err(|e| StorageError::IoError(e.to_string()))?
                .modified()?;
            objects.push(ObjectSummary {
                key,
                last_modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(objects)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalObjectStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_dir, store) = store();
        store
            .put("artifacts", "lambda/code/acme-dev-widgets/a.zip", b"zip".to_vec())
            .await
            .unwrap();

        let body = store
            .get("artifacts", "lambda/code/acme-dev-widgets/a.zip")
            .await
            .unwrap();
        assert_eq!(body, b"zip");
        assert!(store
            .base_path()
            .join("artifacts/lambda/code/acme-dev-widgets/a.zip")
            .exists());
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let (_dir, store) = store();
        store.put("b", "code/w/1.zip", vec![1]).await.unwrap();
        store.put("b", "code/w/2.zip", vec![2]).await.unwrap();
        store.put("b", "code/x/1.zip", vec![3]).await.unwrap();

        let mut keys: Vec<String> = store
            .list("b", "code/w")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["code/w/1.zip", "code/w/2.zip"]);
        assert!(store.list("missing", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_and_delete() {
        let (_dir, store) = store();
        let result = store.get("b", "nope").await;
        assert!(matches!(result, Err(StorageError::NotFound { .. })));

        store.put("b", "k", vec![0]).await.unwrap();
        store.delete("b", "k").await.unwrap();
        store.delete("b", "k").await.unwrap();
        assert!(store.get("b", "k").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let (_dir, store) = store();
        let result = store.put("b", "../escape", vec![0]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        let result = store.get("..", "k").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
