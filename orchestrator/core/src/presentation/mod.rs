// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`stratus-core`)
//!
//! Runtime surface of a deployed function. Translates trigger payloads into
//! message-bus calls; no business logic lives here.
//!
//! | Module | Trigger | Description |
//! |--------|---------|-------------|
//! | [`dispatcher`] | any | Classifies the payload and picks an adapter |
//! | [`http`] | HTTP API | Routing, body parsing, response envelopes |
//! | [`queue`] | Queue batch | Payload resolution, nacks, handshakes |
//! | [`runtime_settings`] | n/a | Environment injected at deploy time |

pub mod dispatcher;
pub mod http;
pub mod queue;
pub mod runtime_settings;

pub use dispatcher::{EventDispatcher, TriggerKind};
pub use http::HttpAdapter;
pub use queue::QueueAdapter;
pub use runtime_settings::RuntimeSettings;
