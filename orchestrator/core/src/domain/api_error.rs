// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Errors raised by message handlers and how the runtime reports them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::storage::StorageError;

/// Declared API error kinds, mapped to HTTP status codes by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ApiError,
}

/// Kind name -> status code
pub const STATUS_CODES: [(&str, u16); 5] = [
    ("BadRequest", 400),
    ("Unauthorized", 401),
    ("Forbidden", 403),
    ("NotFound", 404),
    ("ApiError", 500),
];

impl ApiErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ApiErrorKind::BadRequest => "BadRequest",
            ApiErrorKind::Unauthorized => "Unauthorized",
            ApiErrorKind::Forbidden => "Forbidden",
            ApiErrorKind::NotFound => "NotFound",
            ApiErrorKind::ApiError => "ApiError",
        }
    }

    pub fn status_code(self) -> u16 {
        STATUS_CODES
            .iter()
            .find(|(name, _)| *name == self.name())
            .map(|(_, code)| *code)
            .unwrap_or(500)
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Caller identity could not be established
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Caller lacks the required scopes
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{kind}: {message}")]
    Api { kind: ApiErrorKind, message: String },

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Failed to resolve payload: {0}")]
    Payload(#[from] StorageError),

    #[error("Malformed trigger payload: {0}")]
    Malformed(String),
}

impl DispatchError {
    pub fn api(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        DispatchError::Api {
            kind,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(ApiErrorKind::BadRequest.status_code(), 400);
        assert_eq!(ApiErrorKind::Unauthorized.status_code(), 401);
        assert_eq!(ApiErrorKind::Forbidden.status_code(), 403);
        assert_eq!(ApiErrorKind::NotFound.status_code(), 404);
        assert_eq!(ApiErrorKind::ApiError.status_code(), 500);
    }
}
