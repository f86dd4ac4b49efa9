// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background lease renewal for a held lock

use crate::error::CoordinationError;
use crate::lock::LockClient;
use latch_adapters::StoreAdapter;
use latch_core::{LockToken, TokenGen};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to a task renewing one lock until stopped
///
/// Dropping the handle aborts renewal; the lock then lapses after its TTL.
pub struct LeaseKeeper {
    name: String,
    token: LockToken,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), CoordinationError>>>,
}

impl LeaseKeeper {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &LockToken {
        &self.token
    }

    /// True once renewal has ended on its own (the lock was lost or the store failed)
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }

    /// Stop renewing; reports why renewal ended if it ended early
    pub async fn stop(mut self) -> Result<LockToken, CoordinationError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let token = self.token.clone();
        let Some(handle) = self.handle.take() else {
            return Ok(token);
        };
        match handle.await {
            Ok(result) => result.map(|()| token),
            Err(e) => Err(CoordinationError::KeeperAborted {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for LeaseKeeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl<S: StoreAdapter, G: TokenGen> LockClient<S, G> {
    /// Renew `name` every renew interval until the returned keeper is stopped
    ///
    /// The first renewal happens one interval after this call. A failed renewal
    /// ends the task; [`LeaseKeeper::stop`] then returns that error. A zero
    /// renew interval is rejected before anything is spawned.
    pub fn keep_alive(
        &self,
        name: &str,
        token: LockToken,
    ) -> Result<LeaseKeeper, CoordinationError> {
        let interval = self.config().effective_renew_interval();
        if interval.is_zero() {
            return Err(CoordinationError::InvalidRenewInterval {
                name: name.to_string(),
            });
        }
        let client = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task_name = name.to_string();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => return Ok(()),
                    _ = ticker.tick() => {
                        if let Err(e) = client.renew(&task_name, &task_token).await {
                            tracing::warn!(lock = %task_name, error = %e, "lease renewal failed, lock lost");
                            return Err(e);
                        }
                    }
                }
            }
        });

        tracing::debug!(lock = name, interval_ms = interval.as_millis() as u64, "keeping lease alive");
        Ok(LeaseKeeper {
            name: name.to_string(),
            token,
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

#[cfg(test)]
#[path = "keeper_tests.rs"]
mod tests;
