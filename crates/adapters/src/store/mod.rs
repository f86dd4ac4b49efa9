// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store adapters

mod http;

pub use http::HttpStoreAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStoreAdapter, StoreCall, StoreOp};

use async_trait::async_trait;
use latch_core::{StoreError, StoreOptions, StoreResponse};

/// Adapter for the remote key-value store
///
/// Implementations pass options through verbatim and never retry on their own;
/// retry policy belongs to the coordination protocols.
#[async_trait]
pub trait StoreAdapter: Clone + Send + Sync + 'static {
    /// Read a key (or block for a change when `opts.wait` is set)
    async fn get(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError>;

    /// Write a key, subject to the conditions in `opts`
    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError>;

    /// Delete a key; the response's `prev_node` holds the removed entry
    async fn delete(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError>;

    /// Create a child of `dir` under a store-generated, ordered name
    async fn create(
        &self,
        dir: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError>;

    /// Block until `key` changes at or after `opts.wait_index`
    async fn watch(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let opts = opts.clone().waiting();
        self.get(key, &opts).await
    }
}
