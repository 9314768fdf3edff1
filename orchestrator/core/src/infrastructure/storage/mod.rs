// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Concrete implementations of the ObjectStore port.

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;

use std::sync::Arc;
use crate::domain::storage::{ObjectStore, StorageError};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Buckets are directories under `base_path` (development, dry runs)
    Local { base_path: String },

    /// Process-local store for tests
    Memory,
}

/// Factory function to create an object store from configuration
pub fn create_object_store(backend: StorageBackend) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match backend {
        StorageBackend::Local { base_path } => Ok(Arc::new(LocalObjectStore::new(base_path)?)),
        StorageBackend::Memory => Ok(Arc::new(InMemoryObjectStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_local() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = create_object_store(StorageBackend::Local {
            base_path: temp_dir.path().to_string_lossy().to_string(),
        })
        .unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }

    #[test]
    fn test_factory_memory() {
        let store = create_object_store(StorageBackend::Memory).unwrap();
        assert!(Arc::strong_count(&store) == 1);
    }
}
