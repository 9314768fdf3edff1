// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain Messages
//!
//! Commands, queries and events share one wire representation. The kind is
//! an explicit tag decided when the message is constructed; dispatchers
//! consult the tag instead of inspecting payload shape.
//!
//! Wire format:
//!
//! ```json
//! {"_kind": "command", "_name": "widgets.CreateWidget", "headers": {}, "name": "x"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header marking a message as received from outside the process
pub const EXTERNAL_HEADER: &str = "external";

/// Field of a reference object pointing at an oversized payload in storage
pub const PAYLOAD_KEY: &str = "PAYLOAD_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Command,
    Query,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_kind")]
    pub kind: MessageKind,

    #[serde(rename = "_name")]
    pub name: String,

    /// Publishing context, if known
    #[serde(rename = "_context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub headers: Map<String, Value>,

    /// Message fields, flattened into the top-level object on the wire
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Message {
    pub fn new(kind: MessageKind, name: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            kind,
            name: name.into(),
            context: None,
            headers: Map::new(),
            payload,
        }
    }

    pub fn command(name: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self::new(MessageKind::Command, name, payload)
    }

    pub fn query(name: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self::new(MessageKind::Query, name, payload)
    }

    pub fn event(name: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self::new(MessageKind::Event, name, payload)
    }

    /// Interpret an arbitrary JSON value as a message, if it carries the tags
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Storage key of an offloaded payload, when `value` is a reference object
    pub fn payload_reference(value: &Value) -> Option<&str> {
        value.as_object()?.get(PAYLOAD_KEY)?.as_str()
    }

    pub fn mark_external(&mut self) {
        self.headers.insert(EXTERNAL_HEADER.to_string(), Value::Bool(true));
    }

    pub fn is_external(&self) -> bool {
        self.headers.get(EXTERNAL_HEADER).and_then(Value::as_bool).unwrap_or(false)
    }
}
