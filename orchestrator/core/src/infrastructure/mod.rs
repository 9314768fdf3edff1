// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod storage;
pub mod local_stack;
pub mod bundle;
pub mod acknowledger;
pub mod schema;

pub use acknowledger::LoggingAcknowledger;
pub use bundle::LocalBundleBuilder;
pub use event_bus::EventBus;
pub use local_stack::LocalStackService;
pub use schema::UnconfiguredSchemaMaterializer;
