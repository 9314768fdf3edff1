// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP Adapter
//!
//! Translates an HTTP trigger into a command or query and the result back
//! into a proxy response envelope.
//!
//! # Request Flow
//!
//! 1. `OPTIONS` answers 200 with a permissive CORS header, before routing
//! 2. The version prefix (`/v1`, `/v2`, ...) is stripped from the raw path
//! 3. The path and method are matched against the context's routes
//! 4. `GET` executes the route's query; any other method invokes its command
//!    with the request body merged into the parameters
//!
//! # Response Mapping
//!
//! | Outcome | Response |
//! |---------|----------|
//! | success | 200, body = serialized result |
//! | unauthenticated | bare 403 |
//! | unauthorized | bare 401 |
//! | API error | status from the kind table, body = serialized message |
//! | no matching route | no response |

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::message_bus::MessageBus;
use crate::domain::api_error::{ApiErrorKind, DispatchError};
use crate::domain::message::Message;
use crate::domain::route::{RestRouter, RouteMatch};

pub const CORS_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

/// Whether `event` is an HTTP trigger
pub fn is_http_trigger(event: &Value) -> bool {
    event
        .get("requestContext")
        .and_then(|c| c.get("http"))
        .is_some()
}

/// Strip a leading `/v<digits>` segment.
///
/// Accepts multi-digit versions and only strips a whole segment, so
/// `/v1beta/...` and `/v2x` are left alone where a bare `^/v\d` match
/// would cut them.
pub fn strip_version_prefix(path: &str) -> &str {
    let Some(rest) = path.strip_prefix("/v") else {
        return path;
    };
    let tail = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    if tail.len() == rest.len() {
        return path;
    }
    if tail.is_empty() {
        "/"
    } else if tail.starts_with('/') {
        tail
    } else {
        path
    }
}

/// Proxy response with the CORS header and a serialized body
pub fn envelope(status_code: u16, body: &Value) -> Result<Value, DispatchError> {
    Ok(json!({
        "statusCode": status_code,
        "headers": { CORS_ORIGIN_HEADER: "*" },
        "body": serde_json::to_string(body)?,
        "isBase64Encoded": false,
    }))
}

fn bare(status_code: u16) -> Value {
    json!({ "statusCode": status_code })
}

pub struct HttpAdapter {
    router: RestRouter,
    bus: Arc<dyn MessageBus>,
}

impl HttpAdapter {
    pub fn new(router: RestRouter, bus: Arc<dyn MessageBus>) -> Self {
        Self { router, bus }
    }

    pub async fn handle(&self, event: &Value) -> Result<Option<Value>, DispatchError> {
        let method = event["requestContext"]["http"]["method"]
            .as_str()
            .unwrap_or_default()
            .to_ascii_uppercase();

        if method == "OPTIONS" {
            return Ok(Some(json!({
                "statusCode": 200,
                "headers": { CORS_ORIGIN_HEADER: "*" },
            })));
        }

        let raw_path = event["rawPath"].as_str().unwrap_or("/");
        let path = strip_version_prefix(raw_path);
        info!(method = %method, path = %path, "Trying to match route");

        let route = match self.router.match_route(path, &method) {
            Ok(route) => route,
            Err(e) => {
                warn!(error = %e, "No response for unmatched route");
                return Ok(None);
            }
        };
        debug!(message = %route.endpoint.message, "Matched route");

        match self.execute(event, &method, route).await {
            Ok(result) => envelope(200, &result).map(Some),
            Err(DispatchError::Unauthenticated) => {
                info!("Unauthenticated");
                Ok(Some(bare(403)))
            }
            Err(DispatchError::Unauthorized) => {
                info!("Unauthorized");
                Ok(Some(bare(401)))
            }
            Err(DispatchError::Api { kind, message }) => {
                envelope(kind.status_code(), &Value::String(message)).map(Some)
            }
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, event: &Value, method: &str, route: RouteMatch) -> Result<Value, DispatchError> {
        let mut params = route.params;
        let headers = json!({
            "http_request": { "headers": event.get("headers").cloned().unwrap_or(Value::Object(Map::new())) },
            "secured": route.endpoint.secured,
            "scopes": route.endpoint.scopes,
        });

        if method == "GET" {
            let mut query = Message::query(route.endpoint.message, params);
            query.headers = as_map(headers);
            return self.bus.request(query).await;
        }

        match parse_body(event)? {
            Some(Value::Object(body)) => params.extend(body),
            Some(body) => {
                params.insert("body".to_string(), body);
            }
            None => {}
        }
        let mut command = Message::command(route.endpoint.message, params);
        command.headers = as_map(headers);
        self.bus.invoke(command).await
    }
}

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn content_type(event: &Value) -> Option<&str> {
    event
        .get("headers")?
        .as_object()?
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .and_then(|(_, value)| value.as_str())
}

/// Request body as JSON when declared (or parseable), raw text otherwise
fn parse_body(event: &Value) -> Result<Option<Value>, DispatchError> {
    let Some(raw) = event.get("body").and_then(Value::as_str) else {
        return Ok(None);
    };

    let raw = if event["isBase64Encoded"].as_bool().unwrap_or(false) {
        let bytes = STANDARD
            .decode(raw)
            .map_err(|e| DispatchError::api(ApiErrorKind::BadRequest, format!("Invalid base64 body: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| DispatchError::api(ApiErrorKind::BadRequest, format!("Invalid body encoding: {e}")))?
    } else {
        raw.to_string()
    };

    if raw.is_empty() {
        return Ok(None);
    }

    match content_type(event) {
        Some(ct) if ct.to_ascii_lowercase().starts_with("application/json") => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DispatchError::api(ApiErrorKind::BadRequest, format!("Invalid JSON body: {e}"))),
        Some(_) => Ok(Some(Value::String(raw))),
        None => match serde_json::from_str::<Value>(&raw) {
            Ok(body) => Ok(Some(body)),
            Err(_) => Ok(Some(Value::String(raw))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_version_prefix() {
        assert_eq!(strip_version_prefix("/v1/widgets/42"), "/widgets/42");
        assert_eq!(strip_version_prefix("/v12/widgets"), "/widgets");
        assert_eq!(strip_version_prefix("/v2"), "/");
        assert_eq!(strip_version_prefix("/widgets"), "/widgets");
        assert_eq!(strip_version_prefix("/vendors/1"), "/vendors/1");
        assert_eq!(strip_version_prefix("/v1beta/widgets"), "/v1beta/widgets");
    }

    #[test]
    fn test_is_http_trigger() {
        assert!(is_http_trigger(&json!({"requestContext": {"http": {"method": "GET"}}})));
        assert!(!is_http_trigger(&json!({"requestContext": {}})));
        assert!(!is_http_trigger(&json!({"Records": []})));
    }

    #[test]
    fn test_parse_body_by_content_type() {
        let json_body = json!({"headers": {"Content-Type": "application/json; charset=utf-8"}, "body": "{\"name\":\"x\"}"});
        assert_eq!(parse_body(&json_body).unwrap(), Some(json!({"name": "x"})));

        let text = json!({"headers": {"content-type": "text/plain"}, "body": "{\"name\":\"x\"}"});
        assert_eq!(parse_body(&text).unwrap(), Some(json!("{\"name\":\"x\"}")));

        let untyped = json!({"headers": {}, "body": "hello"});
        assert_eq!(parse_body(&untyped).unwrap(), Some(json!("hello")));

        let invalid = json!({"headers": {"content-type": "application/json"}, "body": "{"});
        assert!(matches!(
            parse_body(&invalid),
            Err(DispatchError::Api { kind: ApiErrorKind::BadRequest, .. })
        ));

        let encoded = json!({"body": STANDARD.encode("{\"a\":1}"), "isBase64Encoded": true});
        assert_eq!(parse_body(&encoded).unwrap(), Some(json!({"a": 1})));

        assert_eq!(parse_body(&json!({"headers": {}})).unwrap(), None);
    }

    #[test]
    fn test_envelope_shape() {
        let response = envelope(404, &json!("Widget not found")).unwrap();
        assert_eq!(response["statusCode"], 404);
        assert_eq!(response["headers"][CORS_ORIGIN_HEADER], "*");
        assert_eq!(response["body"], "\"Widget not found\"");
        assert_eq!(response["isBase64Encoded"], false);
    }
}
