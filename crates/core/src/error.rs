// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store error taxonomy
//!
//! Every adapter normalizes its failures into [`StoreError`]. Store-level
//! rejections keep the store's numeric code so protocol layers can tell a
//! lost compare apart from a missing key or a broken connection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric error code defined by the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const KEY_NOT_FOUND: Self = Self(100);
    pub const COMPARE_FAILED: Self = Self(101);
    pub const NOT_FILE: Self = Self(102);
    pub const NODE_EXIST: Self = Self(105);
    pub const EVENT_INDEX_CLEARED: Self = Self(401);

    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            100 => Some("key not found"),
            101 => Some("compare failed"),
            102 => Some("not a file"),
            105 => Some("key already exists"),
            401 => Some("event index cleared"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Error payload returned by the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("store error {error_code}: {message}")]
pub struct ApiError {
    pub error_code: ErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Store-wide index when the request was rejected
    #[serde(default)]
    pub index: u64,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, index: u64) -> Self {
        Self {
            error_code,
            message: message.into(),
            cause: None,
            index,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Errors from store operations
#[derive(Clone, Debug, Error)]
pub enum StoreError {
    /// The store rejected the request
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Connection failure or unexpected HTTP response
    #[error("transport error: {0}")]
    Transport(String),
    /// The request (usually a watch) ran out of time
    #[error("request timed out")]
    Timeout,
    #[error("redirected more than once (last location: {location})")]
    TooManyRedirects { location: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl StoreError {
    /// The store's error payload, if the store produced this error
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            StoreError::Api(api) => Some(api),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.api().map(|api| api.error_code)
    }

    /// Store-wide index reported alongside a store error
    pub fn index(&self) -> Option<u64> {
        self.api().map(|api| api.index)
    }

    pub fn is_key_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::KEY_NOT_FOUND)
    }

    pub fn is_node_exists(&self) -> bool {
        self.code() == Some(ErrorCode::NODE_EXIST)
    }

    pub fn is_compare_failed(&self) -> bool {
        self.code() == Some(ErrorCode::COMPARE_FAILED)
    }

    pub fn is_event_index_cleared(&self) -> bool {
        self.code() == Some(ErrorCode::EVENT_INDEX_CLEARED)
    }

    /// A conditional write lost: the key was missing, held a different value, or already existed
    pub fn is_precondition_failed(&self) -> bool {
        self.is_key_not_found() || self.is_compare_failed() || self.is_node_exists()
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
