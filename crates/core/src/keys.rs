// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store key layout for locks and semaphores

/// Key holding the token of the current holder of lock `name`
pub fn lock_key(name: &str) -> String {
    format!("locks_{}", name)
}

/// Name of the lock that serializes counter updates for semaphore `name`
///
/// This is a lock name, so the entry itself lives at
/// `lock_key(&semaphore_lock_name(name))`.
pub fn semaphore_lock_name(name: &str) -> String {
    format!("limit_lock_{}", name)
}

/// Key holding the number of taken slots of semaphore `name`
pub fn counter_key(name: &str) -> String {
    format!("limitCounters_{}", name)
}
