// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! latch-core: data model for the latch coordination client
//!
//! This crate provides:
//! - Store entries, responses and request options for the v2 keys API
//! - The store error taxonomy shared by every adapter
//! - Key derivation for locks and semaphore counters
//! - Lock token generation
//! - TOML-backed configuration

pub mod config;
pub mod error;
pub mod keys;
pub mod node;
pub mod options;
pub mod token;

// Re-exports
pub use config::{ConfigError, LatchConfig, LockConfig, SemaphoreConfig, StoreConfig};
pub use error::{ApiError, ErrorCode, StoreError};
pub use node::{Action, Node, StoreResponse};
pub use options::StoreOptions;
pub use token::{LockToken, SequentialTokenGen, TokenGen, UuidTokenGen};
