// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Artifact Packager
//!
//! Builds a service bundle, uploads it under a timestamped key and prunes
//! versions beyond the retention limit.
//!
//! # Flow
//!
//! 1. Build the bundle through the [`BundleBuilder`] port
//! 2. Upload to `<code path>/<timestamp>.zip`
//! 3. List the code path, keep the two newest versions, delete the rest

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::artifact::{latest_version, versions_to_prune, ArtifactVersion, BundleBuilder, PackagingError};
use crate::domain::deployment::{ArtifactMode, Deployment};
use crate::domain::events::DeploymentEvent;
use crate::domain::storage::{ObjectStore, ObjectSummary};
use crate::infrastructure::event_bus::EventBus;

pub struct ArtifactPackager {
    store: Arc<dyn ObjectStore>,
    bundler: Arc<dyn BundleBuilder>,
    event_bus: Arc<EventBus>,
}

impl ArtifactPackager {
    pub fn new(store: Arc<dyn ObjectStore>, bundler: Arc<dyn BundleBuilder>, event_bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bundler,
            event_bus,
        }
    }

    /// Obtain the artifact the service's functions should point at
    pub async fn resolve(
        &self,
        deployment: &Deployment,
        service: &str,
        sidecar: &str,
    ) -> Result<ArtifactVersion, PackagingError> {
        if deployment.artifact_mode == ArtifactMode::ReuseLatest {
            if let Some(latest) = self.latest(deployment, service).await? {
                info!(service = %service, key = %latest.key, "Reusing latest artifact");
                self.event_bus.publish(DeploymentEvent::ArtifactReused {
                    service: service.to_string(),
                    key: latest.key.clone(),
                });
                return Ok(ArtifactVersion {
                    service: service.to_string(),
                    key: latest.key,
                    last_modified: latest.last_modified,
                    reused: true,
                });
            }
            debug!(service = %service, "No artifact to reuse, building");
        }
        self.package(deployment, service, sidecar).await
    }

    /// Build, upload and prune
    pub async fn package(
        &self,
        deployment: &Deployment,
        service: &str,
        sidecar: &str,
    ) -> Result<ArtifactVersion, PackagingError> {
        info!(service = %service, "Packaging artifact");
        let bundle = self.bundler.build(service, sidecar).await?;

        let uploaded_at = Utc::now();
        let key = deployment.names().code_key(service, uploaded_at);
        self.upload(deployment, service, &key, bundle).await?;
        self.prune(deployment, service).await?;

        Ok(ArtifactVersion {
            service: service.to_string(),
            key,
            last_modified: uploaded_at,
            reused: false,
        })
    }

    pub async fn upload(
        &self,
        deployment: &Deployment,
        service: &str,
        key: &str,
        bundle: Vec<u8>,
    ) -> Result<(), PackagingError> {
        let size_bytes = bundle.len() as u64;
        info!(service = %service, key = %key, size_bytes, "Uploading artifact");
        self.store.put(&deployment.bucket, key, bundle).await?;

        self.event_bus.publish(DeploymentEvent::ArtifactUploaded {
            service: service.to_string(),
            key: key.to_string(),
            size_bytes,
            uploaded_at: Utc::now(),
        });
        Ok(())
    }

    /// Delete every version beyond the two newest; returns the deleted keys
    pub async fn prune(&self, deployment: &Deployment, service: &str) -> Result<Vec<String>, PackagingError> {
        let objects = self.versions(deployment, service).await?;
        let stale = versions_to_prune(objects);

        for key in &stale {
            debug!(service = %service, key = %key, "Deleting old artifact");
            self.store.delete(&deployment.bucket, key).await?;
            self.event_bus.publish(DeploymentEvent::ArtifactPruned {
                service: service.to_string(),
                key: key.clone(),
                pruned_at: Utc::now(),
            });
        }

        if !stale.is_empty() {
            info!(service = %service, count = stale.len(), "Pruned old artifacts");
        }
        Ok(stale)
    }

    pub async fn latest(&self, deployment: &Deployment, service: &str) -> Result<Option<ObjectSummary>, PackagingError> {
        let objects = self.versions(deployment, service).await?;
        Ok(latest_version(&objects).cloned())
    }

    async fn versions(&self, deployment: &Deployment, service: &str) -> Result<Vec<ObjectSummary>, PackagingError> {
        // Trailing slash so `widgets` does not match `widgets-admin`
        let prefix = format!("{}/", deployment.names().code_path(service));
        Ok(self.store.list(&deployment.bucket, &prefix).await?)
    }
}
