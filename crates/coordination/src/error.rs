// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordination protocols

use latch_core::StoreError;
use thiserror::Error;

/// Errors from lock and semaphore operations
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Release or renew presented a token that no longer owns the lock
    #[error("lock {name} is not held by this token: {source}")]
    NotHeld { name: String, source: StoreError },
    #[error("deadline exceeded waiting for {name}")]
    DeadlineExceeded { name: String },
    #[error("counter {key} holds a non-integer value: {value:?}")]
    InvalidCounter { key: String, value: Option<String> },
    #[error("semaphore {name} needs a limit of at least one")]
    InvalidLimit { name: String },
    #[error("lease keeper for {name} needs a nonzero renew interval")]
    InvalidRenewInterval { name: String },
    #[error("lease keeper for {name} stopped abnormally: {reason}")]
    KeeperAborted { name: String, reason: String },
}

impl CoordinationError {
    /// The store error behind this failure, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            CoordinationError::Store(e) | CoordinationError::NotHeld { source: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, CoordinationError::DeadlineExceeded { .. })
    }
}
