// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for testing
//!
//! Simulates the parts of the v2 keys API the coordination protocols rely on:
//! a store-wide modification index, `prevExist`/`prevValue`/`prevIndex`
//! conditions, TTL expiry on the tokio clock, and an event history that
//! `wait`/`waitIndex` reads are answered from.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::StoreAdapter;
use async_trait::async_trait;
use chrono::Utc;
use latch_core::{
    Action, ApiError, ErrorCode, Node, StoreError, StoreOptions, StoreResponse,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

/// Operation kinds, used to target injected faults
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
    Delete,
    Create,
    Watch,
}

/// Recorded store call
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    Get {
        key: String,
    },
    Watch {
        key: String,
        wait_index: Option<u64>,
    },
    Set {
        key: String,
        value: String,
        options: StoreOptions,
    },
    Delete {
        key: String,
        options: StoreOptions,
    },
    Create {
        dir: String,
        value: String,
    },
}

impl StoreCall {
    pub fn key(&self) -> &str {
        match self {
            StoreCall::Get { key }
            | StoreCall::Watch { key, .. }
            | StoreCall::Set { key, .. }
            | StoreCall::Delete { key, .. } => key,
            StoreCall::Create { dir, .. } => dir,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    node: Node,
    expires_at: Option<Instant>,
}

#[derive(Clone, Debug)]
struct Event {
    action: Action,
    node: Node,
    prev_node: Option<Node>,
}

#[derive(Debug)]
struct Fault {
    op: StoreOp,
    key: String,
    error: StoreError,
}

#[derive(Debug, Default)]
struct State {
    index: u64,
    entries: BTreeMap<String, Entry>,
    history: Vec<Event>,
    calls: Vec<StoreCall>,
    faults: Vec<Fault>,
}

impl State {
    fn error(&self, code: ErrorCode, message: &str, key: &str) -> StoreError {
        StoreError::Api(ApiError::new(code, message, self.index).with_cause(key))
    }

    fn take_fault(&mut self, op: StoreOp, key: &str) -> Option<StoreError> {
        let position = self
            .faults
            .iter()
            .position(|f| f.op == op && f.key == key)?;
        Some(self.faults.remove(position).error)
    }

    /// Remove every entry whose TTL ran out, recording an `expire` event for each
    fn expire_due(&mut self, now: Instant) {
        let mut due: Vec<(Instant, String)> = self
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry.expires_at {
                Some(at) if at <= now => Some((at, key.clone())),
                _ => None,
            })
            .collect();
        due.sort();

        for (_, key) in due {
            if let Some(entry) = self.entries.remove(&key) {
                self.index += 1;
                let node = Node::new(key).with_indexes(entry.node.created_index, self.index);
                self.history.push(Event {
                    action: Action::Expire,
                    node,
                    prev_node: Some(entry.node),
                });
            }
        }
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.entries.values().filter_map(|e| e.expires_at).min()
    }

    /// Node as seen by a reader at `now`, with the remaining TTL filled in
    fn render(entry: &Entry, now: Instant) -> Node {
        let mut node = entry.node.clone();
        if let Some(at) = entry.expires_at {
            let left = at.saturating_duration_since(now);
            node.ttl = Some((left.as_secs() + u64::from(left.subsec_nanos() > 0)) as i64);
            node.expiration = chrono::Duration::from_std(left)
                .ok()
                .map(|left| Utc::now() + left);
        }
        node
    }

    fn record(&mut self, action: Action, node: Node, prev_node: Option<Node>) {
        self.history.push(Event {
            action,
            node,
            prev_node,
        });
    }

    fn check_prev(
        &self,
        key: &str,
        current: Option<&Entry>,
        opts: &StoreOptions,
    ) -> Result<(), StoreError> {
        if opts.prev_value.is_none() && opts.prev_index.is_none() {
            return Ok(());
        }
        let Some(current) = current else {
            return Err(self.error(ErrorCode::KEY_NOT_FOUND, "Key not found", key));
        };
        if let Some(expected) = &opts.prev_value {
            if current.node.value.as_deref() != Some(expected.as_str()) {
                let cause = format!(
                    "[{} != {}]",
                    expected,
                    current.node.value.as_deref().unwrap_or_default()
                );
                return Err(self.error(ErrorCode::COMPARE_FAILED, "Compare failed", &cause));
            }
        }
        if let Some(expected) = opts.prev_index {
            if current.node.modified_index != expected {
                let cause = format!("[{} != {}]", expected, current.node.modified_index);
                return Err(self.error(ErrorCode::COMPARE_FAILED, "Compare failed", &cause));
            }
        }
        Ok(())
    }
}

/// In-memory store adapter for testing
///
/// Clones share the same store, so several clients (or simulated processes)
/// can coordinate through one instance.
#[derive(Clone)]
pub struct FakeStoreAdapter {
    state: Arc<Mutex<State>>,
    changes: Arc<watch::Sender<u64>>,
}

impl Default for FakeStoreAdapter {
    fn default() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            changes: Arc::new(changes),
        }
    }
}

impl FakeStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Current store-wide index
    pub fn index(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).index
    }

    /// Current value of a key, honoring expiry
    pub fn value(&self, key: &str) -> Option<String> {
        let key = normalize(key);
        let index = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.expire_due(Instant::now());
            state.index
        };
        self.publish(index);
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.entries.get(&key).and_then(|e| e.node.value.clone())
    }

    /// Make the next `op` on `key` fail with `error` instead of touching the store
    pub fn fail_next(&self, op: StoreOp, key: &str, error: StoreError) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .faults
            .push(Fault {
                op,
                key: normalize(key),
                error,
            });
    }

    /// Wake watchers if the index moved
    fn publish(&self, index: u64) {
        self.changes.send_if_modified(|current| {
            if *current == index {
                false
            } else {
                *current = index;
                true
            }
        });
    }

    fn read(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(StoreCall::Get {
            key: key.to_string(),
        });
        if let Some(error) = state.take_fault(StoreOp::Get, key) {
            return Err(error);
        }
        state.expire_due(now);
        let index = state.index;

        let response = if let Some(entry) = state.entries.get(key) {
            Ok(StoreResponse::new(Action::Get, State::render(entry, now)).with_etcd_index(index))
        } else {
            let prefix = format!("{}/", key);
            let children: Vec<Node> = state
                .entries
                .iter()
                .filter(|(k, _)| {
                    k.strip_prefix(&prefix)
                        .is_some_and(|rest| opts.recursive || !rest.contains('/'))
                })
                .map(|(_, e)| State::render(e, now))
                .collect();
            if children.is_empty() {
                Err(state.error(ErrorCode::KEY_NOT_FOUND, "Key not found", key))
            } else {
                let mut dir = Node::new(key);
                dir.dir = true;
                dir.nodes = children;
                Ok(StoreResponse::new(Action::Get, dir).with_etcd_index(index))
            }
        };
        drop(state);
        self.publish(index);
        response
    }

    async fn wait(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let mut changes = self.changes.subscribe();
        let start = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(StoreCall::Watch {
                key: key.to_string(),
                wait_index: opts.wait_index,
            });
            if let Some(error) = state.take_fault(StoreOp::Watch, key) {
                return Err(error);
            }
            opts.wait_index.unwrap_or(state.index + 1)
        };

        loop {
            let (found, index, next_expiry) = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                state.expire_due(Instant::now());
                let found = state
                    .history
                    .iter()
                    .find(|event| {
                        event.node.modified_index >= start
                            && matches_key(&event.node.key, key, opts.recursive)
                    })
                    .cloned();
                (found, state.index, state.next_expiry())
            };
            self.publish(index);

            if let Some(event) = found {
                return Ok(StoreResponse::new(event.action, event.node)
                    .with_prev_node(event.prev_node)
                    .with_etcd_index(index));
            }

            match next_expiry {
                Some(at) => {
                    tokio::select! {
                        changed = changes.changed() => {
                            if changed.is_err() {
                                return Err(StoreError::Transport("store closed".to_string()));
                            }
                        }
                        _ = tokio::time::sleep_until(at) => {}
                    }
                }
                None => {
                    if changes.changed().await.is_err() {
                        return Err(StoreError::Transport("store closed".to_string()));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl StoreAdapter for FakeStoreAdapter {
    async fn get(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let key = normalize(key);
        if opts.wait {
            self.wait(&key, opts).await
        } else {
            self.read(&key, opts)
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        let key = normalize(key);
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(StoreCall::Set {
            key: key.clone(),
            value: value.to_string(),
            options: opts.clone(),
        });
        if let Some(error) = state.take_fault(StoreOp::Set, &key) {
            return Err(error);
        }
        state.expire_due(now);

        let current = state.entries.get(&key).cloned();
        let result = match (opts.prev_exist, &current) {
            (Some(false), Some(_)) => Err(state.error(
                ErrorCode::NODE_EXIST,
                "Key already exists",
                &key,
            )),
            (Some(true), None) => Err(state.error(ErrorCode::KEY_NOT_FOUND, "Key not found", &key)),
            _ => state.check_prev(&key, current.as_ref(), opts),
        };
        if let Err(error) = result {
            let index = state.index;
            drop(state);
            self.publish(index);
            return Err(error);
        }

        let action = if opts.prev_value.is_some() || opts.prev_index.is_some() {
            Action::CompareAndSwap
        } else {
            match opts.prev_exist {
                Some(false) => Action::Create,
                Some(true) => Action::Update,
                None => Action::Set,
            }
        };

        state.index += 1;
        let index = state.index;
        let created = current
            .as_ref()
            .map_or(index, |entry| entry.node.created_index);
        let mut node = Node::new(key.clone())
            .with_value(value)
            .with_indexes(created, index);
        node.ttl = opts.ttl.map(|t| t as i64);
        let entry = Entry {
            node: node.clone(),
            expires_at: opts.ttl.map(|t| now + Duration::from_secs(t)),
        };
        state.entries.insert(key, entry);

        let prev_node = current.map(|entry| State::render(&entry, now));
        state.record(action, node.clone(), prev_node.clone());
        drop(state);
        self.publish(index);

        Ok(StoreResponse::new(action, node)
            .with_prev_node(prev_node)
            .with_etcd_index(index))
    }

    async fn delete(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        let key = normalize(key);
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(StoreCall::Delete {
            key: key.clone(),
            options: opts.clone(),
        });
        if let Some(error) = state.take_fault(StoreOp::Delete, &key) {
            return Err(error);
        }
        state.expire_due(now);

        let current = state.entries.get(&key).cloned();
        let result = match &current {
            None => Err(state.error(ErrorCode::KEY_NOT_FOUND, "Key not found", &key)),
            Some(_) => state.check_prev(&key, current.as_ref(), opts),
        };
        if let Err(error) = result {
            let index = state.index;
            drop(state);
            self.publish(index);
            return Err(error);
        }

        let action = if opts.prev_value.is_some() || opts.prev_index.is_some() {
            Action::CompareAndDelete
        } else {
            Action::Delete
        };

        state.entries.remove(&key);
        state.index += 1;
        let index = state.index;
        let created = current.as_ref().map_or(index, |e| e.node.created_index);
        let node = Node::new(key).with_indexes(created, index);
        let prev_node = current.map(|entry| State::render(&entry, now));
        state.record(action, node.clone(), prev_node.clone());
        drop(state);
        self.publish(index);

        Ok(StoreResponse::new(action, node)
            .with_prev_node(prev_node)
            .with_etcd_index(index))
    }

    async fn create(
        &self,
        dir: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        let dir = normalize(dir);
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(StoreCall::Create {
            dir: dir.clone(),
            value: value.to_string(),
        });
        if let Some(error) = state.take_fault(StoreOp::Create, &dir) {
            return Err(error);
        }
        state.expire_due(now);

        if state.entries.contains_key(&dir) {
            let error = state.error(ErrorCode::NOT_FILE, "Not a directory", &dir);
            let index = state.index;
            drop(state);
            self.publish(index);
            return Err(error);
        }

        state.index += 1;
        let index = state.index;
        let key = format!("{}/{:020}", dir, index);
        let mut node = Node::new(key.clone())
            .with_value(value)
            .with_indexes(index, index);
        node.ttl = opts.ttl.map(|t| t as i64);
        state.entries.insert(
            key,
            Entry {
                node: node.clone(),
                expires_at: opts.ttl.map(|t| now + Duration::from_secs(t)),
            },
        );
        state.record(Action::Create, node.clone(), None);
        drop(state);
        self.publish(index);

        Ok(StoreResponse::new(Action::Create, node).with_etcd_index(index))
    }
}

/// Keys are stored with exactly one leading slash, as the store reports them
fn normalize(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}

fn matches_key(event_key: &str, key: &str, recursive: bool) -> bool {
    event_key == key
        || (recursive
            && event_key
                .strip_prefix(key)
                .is_some_and(|rest| rest.starts_with('/')))
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
