// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! REST routes registered by a context and the router matching them.
//!
//! Patterns use `{name}` for a single segment and `{name+}` for the
//! remaining path.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::project_config::EndpointConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    /// Upper-case HTTP method
    pub method: String,
    /// Command or query dispatched on a match
    pub message: String,
    pub secured: bool,
    pub scopes: Vec<String>,
}

impl From<&EndpointConfig> for Endpoint {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            path: config.path.clone(),
            method: config.method.to_ascii_uppercase(),
            message: config.message.clone(),
            secured: config.secured,
            scopes: config.scopes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Greedy(String),
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    endpoint: Endpoint,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    pub params: Map<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("No route matches {method} {path}")]
    NoMatch { method: String, path: String },
}

#[derive(Debug, Clone, Default)]
pub struct RestRouter {
    routes: Vec<CompiledRoute>,
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn compile(pattern: &str) -> Vec<Segment> {
    split(pattern)
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => match name.strip_suffix('+') {
                Some(greedy) => Segment::Greedy(greedy.to_string()),
                None => Segment::Param(name.to_string()),
            },
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

impl RestRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_endpoints<'a>(endpoints: impl IntoIterator<Item = &'a EndpointConfig>) -> Self {
        let mut router = Self::new();
        for endpoint in endpoints {
            router.register(Endpoint::from(endpoint));
        }
        router
    }

    pub fn register(&mut self, endpoint: Endpoint) {
        let segments = compile(&endpoint.path);
        self.routes.push(CompiledRoute { endpoint, segments });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// First registered route matching `(path, method)` wins
    pub fn match_route(&self, path: &str, method: &str) -> Result<RouteMatch, RouteError> {
        let parts: Vec<&str> = split(path).collect();
        for route in &self.routes {
            if !route.endpoint.method.eq_ignore_ascii_case(method) {
                continue;
            }
            if let Some(params) = Self::bind(&route.segments, &parts) {
                return Ok(RouteMatch {
                    endpoint: route.endpoint.clone(),
                    params,
                });
            }
        }
        Err(RouteError::NoMatch {
            method: method.to_string(),
            path: path.to_string(),
        })
    }

    fn bind(segments: &[Segment], parts: &[&str]) -> Option<Map<String, Value>> {
        let mut params = Map::new();
        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Greedy(name) => {
                    if i >= parts.len() {
                        return None;
                    }
                    params.insert(name.clone(), Value::String(parts[i..].join("/")));
                    return Some(params);
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let part = parts.get(i)?;
                    params.insert(name.clone(), Value::String(part.to_string()));
                }
            }
        }
        (segments.len() == parts.len()).then_some(params)
    }
}
