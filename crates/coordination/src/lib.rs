// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Coordination primitives built on the remote store
//!
//! This crate provides:
//! - **LockClient** - Exclusive locks with TTL leases, blocking acquisition via watch
//! - **LeaseKeeper** - Background renewal of a held lock
//! - **Semaphore** - Counting semaphore over a lock-guarded counter key
//!
//! All shared state lives in the store; conditional writes are the only
//! atomicity primitive and watches the only wake-up signal.

mod deadline;
pub mod error;
pub mod keeper;
pub mod lock;
pub mod semaphore;

pub use error::CoordinationError;
pub use keeper::LeaseKeeper;
pub use lock::{AcquireOptions, AcquireState, LockClient};
pub use semaphore::Semaphore;
