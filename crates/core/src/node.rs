// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store entries and responses as returned by the v2 keys API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of change a response (or watch event) describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Get,
    Set,
    Create,
    Update,
    Delete,
    CompareAndSwap,
    CompareAndDelete,
    Expire,
}

impl Action {
    /// True for actions that leave the key absent
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Action::Delete | Action::CompareAndDelete | Action::Expire
        )
    }
}

/// A single entry in the store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dir: bool,
    #[serde(default)]
    pub created_index: u64,
    #[serde(default)]
    pub modified_index: u64,
    /// Seconds left before the entry expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// Wall-clock instant the entry expires at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Children, populated when reading a directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_indexes(mut self, created: u64, modified: u64) -> Self {
        self.created_index = created;
        self.modified_index = modified;
        self
    }

    pub fn value_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Successful result of a store operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub action: Action,
    pub node: Node,
    /// State of the key before this change (set, delete and watch events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<Node>,
    /// Store-wide index at the time of the response (`X-Etcd-Index` header)
    #[serde(skip)]
    pub etcd_index: Option<u64>,
}

impl StoreResponse {
    pub fn new(action: Action, node: Node) -> Self {
        Self {
            action,
            node,
            prev_node: None,
            etcd_index: None,
        }
    }

    pub fn with_prev_node(mut self, prev_node: Option<Node>) -> Self {
        self.prev_node = prev_node;
        self
    }

    pub fn with_etcd_index(mut self, index: u64) -> Self {
        self.etcd_index = Some(index);
        self
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
