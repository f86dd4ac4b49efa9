// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::store::StoreAdapter;
use async_trait::async_trait;
use latch_core::{StoreError, StoreOptions, StoreResponse};
use tracing::Instrument;

/// Wrapper that adds tracing to any StoreAdapter
#[derive(Clone)]
pub struct TracedStoreAdapter<S> {
    inner: S,
}

impl<S> TracedStoreAdapter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Log the outcome of a store call
///
/// Precondition failures and misses are expected by the protocols, so they
/// stay at debug; anything else is a warning.
fn log_outcome(result: &Result<StoreResponse, StoreError>, elapsed: std::time::Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match result {
        Ok(response) => tracing::debug!(
            action = ?response.action,
            index = response.node.modified_index,
            elapsed_ms,
            "ok"
        ),
        Err(e) if e.is_precondition_failed() => {
            tracing::debug!(error = %e, elapsed_ms, "rejected")
        }
        Err(StoreError::Timeout) => tracing::debug!(elapsed_ms, "timed out"),
        Err(e) => tracing::warn!(error = %e, elapsed_ms, "failed"),
    }
}

#[async_trait]
impl<S: StoreAdapter> StoreAdapter for TracedStoreAdapter<S> {
    async fn get(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let span = tracing::debug_span!("store.get", key, wait = opts.wait);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.get(key, opts).await;
            log_outcome(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        let span = tracing::debug_span!(
            "store.set",
            key,
            ttl = opts.ttl,
            prev_exist = opts.prev_exist,
            conditional = opts.prev_value.is_some()
        );
        async {
            tracing::trace!(value_len = value.len(), "writing");
            let start = std::time::Instant::now();
            let result = self.inner.set(key, value, opts).await;
            log_outcome(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let span = tracing::debug_span!(
            "store.delete",
            key,
            conditional = opts.prev_value.is_some()
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.delete(key, opts).await;
            log_outcome(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn create(
        &self,
        dir: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        let span = tracing::debug_span!("store.create", dir);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create(dir, value, opts).await;
            log_outcome(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn watch(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let span = tracing::debug_span!("store.watch", key, wait_index = opts.wait_index);
        async {
            tracing::debug!("waiting for change");
            let start = std::time::Instant::now();
            let result = self.inner.watch(key, opts).await;
            log_outcome(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
