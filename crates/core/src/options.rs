// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request options passed through to the store as query parameters

use serde::Serialize;
use std::time::Duration;

/// Conditions and modifiers for a store request
///
/// Serializes to the store's query parameter names; unset options are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// Entry lifetime in whole seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// `false` requires the key to be absent, `true` requires it to exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_exist: Option<bool>,
    /// Require the current value to match exactly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_value: Option<String>,
    /// Require the current modification index to match exactly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_index: Option<u64>,
    /// Block until the key changes
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wait: bool,
    /// With `wait`, return the first change at or after this index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_index: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL, rounding partial seconds up (the store only takes whole seconds)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl_secs(ttl));
        self
    }

    pub fn with_prev_exist(mut self, exists: bool) -> Self {
        self.prev_exist = Some(exists);
        self
    }

    pub fn with_prev_value(mut self, value: impl Into<String>) -> Self {
        self.prev_value = Some(value.into());
        self
    }

    pub fn with_prev_index(mut self, index: u64) -> Self {
        self.prev_index = Some(index);
        self
    }

    pub fn with_wait_index(mut self, index: u64) -> Self {
        self.wait = true;
        self.wait_index = Some(index);
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Same options with `wait` turned on
    pub fn waiting(mut self) -> Self {
        self.wait = true;
        self
    }

    /// True when the request carries a compare condition
    pub fn is_conditional(&self) -> bool {
        self.prev_exist.is_some() || self.prev_value.is_some() || self.prev_index.is_some()
    }
}

/// Whole seconds for a TTL, never less than one
pub fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}
