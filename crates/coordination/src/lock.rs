// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive lock over a single store key
//!
//! A lock named `jobs` is the entry `locks_jobs`. Whoever creates it (with
//! `prevExist=false`) owns it until they delete it, it expires, or their
//! renewals stop. The entry's value is the owner's token; release and renew
//! are conditional on it, so a stale owner can never disturb a newer one.

use crate::deadline;
use crate::error::CoordinationError;
use latch_adapters::StoreAdapter;
use latch_core::{
    keys, LockConfig, LockToken, StoreError, StoreOptions, StoreResponse, TokenGen, UuidTokenGen,
};
use std::time::Duration;
use tokio::time::Instant;

/// Where a single acquisition stands
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcquireState {
    /// Try to create the lock entry
    AttemptCreate,
    /// Someone else holds it; wait for the entry to change at or after `index`
    Wait { index: u64 },
    /// Our create went through
    Held,
}

impl AcquireState {
    /// Transition after a conditional create of the lock entry
    pub fn after_create(result: Result<StoreResponse, StoreError>) -> Result<Self, StoreError> {
        match result {
            Ok(_) => Ok(AcquireState::Held),
            // The conflict reports the store index at which the lock was seen held;
            // its release or expiry is necessarily a later event.
            Err(e) if e.is_node_exists() => Ok(AcquireState::Wait {
                index: e.index().unwrap_or_default() + 1,
            }),
            Err(e) => Err(e),
        }
    }

    /// Transition after a watch on the lock entry
    pub fn after_watch(
        index: u64,
        result: Result<StoreResponse, StoreError>,
    ) -> Result<Self, StoreError> {
        match result {
            Ok(_) => Ok(AcquireState::AttemptCreate),
            Err(StoreError::Timeout) => Ok(AcquireState::Wait { index }),
            // History no longer reaches back to `index`; a fresh attempt re-reads it
            Err(e) if e.is_event_index_cleared() => Ok(AcquireState::AttemptCreate),
            Err(e) => Err(e),
        }
    }
}

/// Per-call acquisition settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquireOptions {
    pub ttl: Duration,
    /// Give up waiting at this instant; `None` waits indefinitely
    pub deadline: Option<Instant>,
}

impl AcquireOptions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// Client for named exclusive locks
#[derive(Clone)]
pub struct LockClient<S, G = UuidTokenGen> {
    store: S,
    tokens: G,
    config: LockConfig,
}

impl<S: StoreAdapter> LockClient<S> {
    pub fn new(store: S, config: LockConfig) -> Self {
        Self::with_token_gen(store, UuidTokenGen, config)
    }
}

impl<S: StoreAdapter, G: TokenGen> LockClient<S, G> {
    pub fn with_token_gen(store: S, tokens: G, config: LockConfig) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire `name` with the configured TTL, waiting as long as it takes
    pub async fn acquire(&self, name: &str) -> Result<LockToken, CoordinationError> {
        self.acquire_with(name, AcquireOptions::new(self.config.ttl))
            .await
    }

    /// Acquire `name`, blocking on a watch while someone else holds it
    ///
    /// Returns the token that proves ownership. Waiters are not queued: when
    /// the lock frees up, every waiter races for it.
    pub async fn acquire_with(
        &self,
        name: &str,
        options: AcquireOptions,
    ) -> Result<LockToken, CoordinationError> {
        let key = keys::lock_key(name);
        let token = self.tokens.next();
        let create = StoreOptions::new()
            .with_ttl(options.ttl)
            .with_prev_exist(false);

        let mut state = AcquireState::AttemptCreate;
        loop {
            state = match state {
                AcquireState::AttemptCreate => {
                    deadline::check(options.deadline, name)?;
                    let result = self.store.set(&key, token.as_str(), &create).await;
                    AcquireState::after_create(result)?
                }
                AcquireState::Wait { index } => {
                    tracing::debug!(lock = name, index, "lock busy, waiting");
                    let watch = StoreOptions::new().with_wait_index(index);
                    let result =
                        deadline::within(options.deadline, name, self.store.watch(&key, &watch))
                            .await?;
                    AcquireState::after_watch(index, result)?
                }
                AcquireState::Held => {
                    tracing::info!(lock = name, ttl_secs = options.ttl.as_secs(), "acquired");
                    return Ok(token);
                }
            };
        }
    }

    /// Single attempt at `name`; `None` when someone else holds it
    pub async fn try_acquire(&self, name: &str) -> Result<Option<LockToken>, CoordinationError> {
        let key = keys::lock_key(name);
        let token = self.tokens.next();
        let create = StoreOptions::new()
            .with_ttl(self.config.ttl)
            .with_prev_exist(false);

        match AcquireState::after_create(self.store.set(&key, token.as_str(), &create).await)? {
            AcquireState::Held => {
                tracing::info!(lock = name, "acquired");
                Ok(Some(token))
            }
            _ => {
                tracing::debug!(lock = name, "lock busy");
                Ok(None)
            }
        }
    }

    /// Release `name`, provided `token` still owns it
    pub async fn release(&self, name: &str, token: &LockToken) -> Result<(), CoordinationError> {
        let key = keys::lock_key(name);
        let opts = StoreOptions::new().with_prev_value(token.as_str());

        match self.store.delete(&key, &opts).await {
            Ok(_) => {
                tracing::info!(lock = name, "released");
                Ok(())
            }
            Err(e) => Err(ownership_error(name, e)),
        }
    }

    /// Extend the lease on `name` by the configured TTL
    pub async fn renew(&self, name: &str, token: &LockToken) -> Result<(), CoordinationError> {
        self.renew_with_ttl(name, token, self.config.ttl).await
    }

    /// Extend the lease on `name`, provided `token` still owns it
    pub async fn renew_with_ttl(
        &self,
        name: &str,
        token: &LockToken,
        ttl: Duration,
    ) -> Result<(), CoordinationError> {
        let key = keys::lock_key(name);
        let opts = StoreOptions::new()
            .with_ttl(ttl)
            .with_prev_value(token.as_str());

        match self.store.set(&key, token.as_str(), &opts).await {
            Ok(_) => {
                tracing::debug!(lock = name, ttl_secs = ttl.as_secs(), "renewed");
                Ok(())
            }
            Err(e) => Err(ownership_error(name, e)),
        }
    }
}

/// A lost compare on a token-guarded write means the caller no longer owns the lock
fn ownership_error(name: &str, error: StoreError) -> CoordinationError {
    if error.is_precondition_failed() {
        tracing::warn!(lock = name, error = %error, "lock not held by this token");
        CoordinationError::NotHeld {
            name: name.to_string(),
            source: error,
        }
    } else {
        CoordinationError::Store(error)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
