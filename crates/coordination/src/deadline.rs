// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional deadlines for the blocking protocol loops

use crate::error::CoordinationError;
use std::future::Future;
use tokio::time::Instant;

/// Fail if `deadline` has already passed
pub(crate) fn check(deadline: Option<Instant>, name: &str) -> Result<(), CoordinationError> {
    match deadline {
        Some(at) if Instant::now() >= at => Err(CoordinationError::DeadlineExceeded {
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Run `fut`, giving up when `deadline` passes
///
/// Only wrap waits here. Conditional writes must run to completion, or a
/// lock could be taken without its token ever reaching the caller.
pub(crate) async fn within<F: Future>(
    deadline: Option<Instant>,
    name: &str,
    fut: F,
) -> Result<F::Output, CoordinationError> {
    match deadline {
        None => Ok(fut.await),
        Some(at) => tokio::time::timeout_at(at, fut).await.map_err(|_| {
            CoordinationError::DeadlineExceeded {
                name: name.to_string(),
            }
        }),
    }
}
