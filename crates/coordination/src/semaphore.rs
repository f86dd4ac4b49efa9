// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphore built from a lock and a counter key
//!
//! Semaphore `workers` keeps its number of taken slots in `limitCounters_workers`.
//! Every read-modify-write of that counter happens while holding the lock
//! `limit_lock_workers`, and the lock is released on every exit path, so a
//! failed read or write never strands other callers until the TTL runs out.

use crate::deadline;
use crate::error::CoordinationError;
use crate::lock::{AcquireOptions, LockClient};
use latch_adapters::StoreAdapter;
use latch_core::{keys, SemaphoreConfig, StoreError, StoreOptions, TokenGen, UuidTokenGen};
use tokio::time::Instant;

/// Counter value and the index it was read at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Observed {
    count: i64,
    index: u64,
}

/// Result of one locked check-and-increment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    /// Took a slot; the counter now reads `count`
    Taken { count: i64 },
    /// No slot free; wait for the counter to change at or after `index`
    Full { index: u64 },
}

/// Where an increment stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IncrementState {
    Attempt,
    Wait { index: u64 },
}

/// Client for named counting semaphores
#[derive(Clone)]
pub struct Semaphore<S, G = UuidTokenGen> {
    locks: LockClient<S, G>,
    config: SemaphoreConfig,
}

impl<S: StoreAdapter, G: TokenGen> Semaphore<S, G> {
    pub fn new(locks: LockClient<S, G>, config: SemaphoreConfig) -> Self {
        Self { locks, config }
    }

    pub fn locks(&self) -> &LockClient<S, G> {
        &self.locks
    }

    /// Take a slot of `name`, waiting while all `limit` slots are taken
    ///
    /// Returns the counter value after the increment.
    ///
    /// If the counter write succeeds but releasing the guarding lock fails,
    /// the release error is returned even though the slot is taken. A caller
    /// seeing an error can check [`count`](Self::count) and [`decrement`](Self::decrement)
    /// to give the slot back.
    pub async fn increment(&self, name: &str, limit: u32) -> Result<i64, CoordinationError> {
        self.increment_with(name, limit, None).await
    }

    /// Like [`increment`](Self::increment), giving up at `deadline`
    pub async fn increment_with(
        &self,
        name: &str,
        limit: u32,
        deadline: Option<Instant>,
    ) -> Result<i64, CoordinationError> {
        check_limit(name, limit)?;
        let counter = keys::counter_key(name);

        let mut state = IncrementState::Attempt;
        loop {
            state = match state {
                IncrementState::Attempt => {
                    match self.attempt(name, &counter, limit, deadline).await? {
                        Attempt::Taken { count } => {
                            tracing::info!(semaphore = name, count, limit, "slot taken");
                            return Ok(count);
                        }
                        Attempt::Full { index } => IncrementState::Wait { index },
                    }
                }
                IncrementState::Wait { index } => {
                    tracing::debug!(semaphore = name, limit, index, "semaphore full, waiting");
                    let watch = StoreOptions::new().with_wait_index(index);
                    let result =
                        deadline::within(deadline, name, self.store().watch(&counter, &watch))
                            .await?;
                    match result {
                        Ok(_) => IncrementState::Attempt,
                        Err(StoreError::Timeout) => IncrementState::Wait { index },
                        Err(e) if e.is_event_index_cleared() => IncrementState::Attempt,
                        Err(e) => return Err(e.into()),
                    }
                }
            };
        }
    }

    /// Single locked attempt at a slot; `None` when all `limit` slots are taken
    pub async fn try_increment(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Option<i64>, CoordinationError> {
        check_limit(name, limit)?;
        let counter = keys::counter_key(name);
        match self.attempt(name, &counter, limit, None).await? {
            Attempt::Taken { count } => Ok(Some(count)),
            Attempt::Full { .. } => Ok(None),
        }
    }

    /// Give back a slot of `name`
    ///
    /// There is no floor check: decrementing more often than incrementing
    /// drives the counter negative. A missing counter is the store's
    /// key-not-found error.
    pub async fn decrement(&self, name: &str) -> Result<i64, CoordinationError> {
        self.decrement_with(name, None).await
    }

    /// Like [`decrement`](Self::decrement), giving up on the guarding lock at `deadline`
    pub async fn decrement_with(
        &self,
        name: &str,
        deadline: Option<Instant>,
    ) -> Result<i64, CoordinationError> {
        let counter = keys::counter_key(name);
        let count = self
            .with_counter_lock(name, deadline, async {
                let response = self.store().get(&counter, &StoreOptions::new()).await?;
                let count = parse_count(&counter, response.node.value.as_deref())? - 1;
                self.store()
                    .set(&counter, &count.to_string(), &StoreOptions::new())
                    .await?;
                Ok::<_, CoordinationError>(count)
            })
            .await?;
        tracing::info!(semaphore = name, count, "slot returned");
        Ok(count)
    }

    /// Current number of taken slots, read without locking
    pub async fn count(&self, name: &str) -> Result<i64, CoordinationError> {
        let counter = keys::counter_key(name);
        Ok(self.read_counter(&counter).await?.count)
    }

    fn store(&self) -> &S {
        self.locks.store()
    }

    /// Lock, check the counter, take a slot if one is free, unlock
    async fn attempt(
        &self,
        name: &str,
        counter: &str,
        limit: u32,
        deadline: Option<Instant>,
    ) -> Result<Attempt, CoordinationError> {
        self.with_counter_lock(name, deadline, async {
            let observed = self.read_counter(counter).await?;
            if observed.count >= i64::from(limit) {
                return Ok(Attempt::Full {
                    index: observed.index + 1,
                });
            }
            let count = observed.count + 1;
            self.store()
                .set(counter, &count.to_string(), &StoreOptions::new())
                .await?;
            Ok::<_, CoordinationError>(Attempt::Taken { count })
        })
        .await
    }

    /// Run `body` while holding the lock guarding `name`'s counter
    ///
    /// The lock is released whatever `body` returns. If both fail, the body's
    /// error is returned and the release error is logged.
    async fn with_counter_lock<T, F>(
        &self,
        name: &str,
        deadline: Option<Instant>,
        body: F,
    ) -> Result<T, CoordinationError>
    where
        F: std::future::Future<Output = Result<T, CoordinationError>>,
    {
        let lock_name = keys::semaphore_lock_name(name);
        let mut options = AcquireOptions::new(self.config.lock_ttl);
        options.deadline = deadline;
        let token = self.locks.acquire_with(&lock_name, options).await?;

        let outcome = body.await;
        let released = self.locks.release(&lock_name, &token).await;

        match (outcome, released) {
            (outcome, Ok(())) => outcome,
            (Ok(_), Err(release_error)) => Err(release_error),
            (Err(error), Err(release_error)) => {
                tracing::warn!(
                    semaphore = name,
                    error = %release_error,
                    "failed to release counter lock after error"
                );
                Err(error)
            }
        }
    }

    /// Read the counter; a missing counter counts as zero
    async fn read_counter(&self, counter: &str) -> Result<Observed, CoordinationError> {
        match self.store().get(counter, &StoreOptions::new()).await {
            Ok(response) => Ok(Observed {
                count: parse_count(counter, response.node.value.as_deref())?,
                index: response.node.modified_index,
            }),
            Err(e) if e.is_key_not_found() => Ok(Observed {
                count: 0,
                index: e.index().unwrap_or_default(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_limit(name: &str, limit: u32) -> Result<(), CoordinationError> {
    if limit == 0 {
        return Err(CoordinationError::InvalidLimit {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn parse_count(key: &str, value: Option<&str>) -> Result<i64, CoordinationError> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| CoordinationError::InvalidCounter {
            key: key.to_string(),
            value: value.map(str::to_string),
        })
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
