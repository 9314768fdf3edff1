// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::stack::ConvergenceOutcome;

/// Progress of a deployment run, published on the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeploymentEvent {
    StackConverged {
        stack: String,
        outcome: ConvergenceOutcome,
        converged_at: DateTime<Utc>,
    },
    /// A minimal stack was created for a topic owned outside the project
    TopicProvisioned {
        context: String,
        topic_arn: String,
        provisioned_at: DateTime<Utc>,
    },
    ArtifactUploaded {
        service: String,
        key: String,
        size_bytes: u64,
        uploaded_at: DateTime<Utc>,
    },
    ArtifactReused {
        service: String,
        key: String,
    },
    ArtifactPruned {
        service: String,
        key: String,
        pruned_at: DateTime<Utc>,
    },
    SchemaMaterialized {
        context: String,
        entity: String,
    },
    SchemaSkipped {
        context: String,
        entity: String,
        reason: String,
    },
    DeploymentCompleted {
        environment: String,
        stacks: usize,
        changed: bool,
        completed_at: DateTime<Utc>,
    },
}
