//! Guard lock release specs
//!
//! A failure while the counter lock is held must not strand it until its TTL.

use crate::prelude::*;
use latch_adapters::StoreOp;
use latch_coordination::CoordinationError;
use latch_core::StoreError;

#[tokio::test]
async fn failed_counter_read_releases_guard() {
    let (fake, store) = store();
    let p = semaphore(&store, "p");
    let q = semaphore(&store, "q");
    fake.fail_next(
        StoreOp::Get,
        "limitCounters_workers",
        StoreError::Transport("connection reset".to_string()),
    );

    let err = p.increment("workers", 2).await.unwrap_err();

    assert!(matches!(
        err,
        CoordinationError::Store(StoreError::Transport(_))
    ));
    assert_eq!(fake.value("locks_limit_lock_workers"), None);
    // Nobody has to wait out the guard's TTL
    assert_eq!(q.try_increment("workers", 2).await.unwrap(), Some(1));
}

#[tokio::test]
async fn failed_counter_write_releases_guard() {
    let (fake, store) = store();
    let p = semaphore(&store, "p");
    fake.fail_next(
        StoreOp::Set,
        "limitCounters_workers",
        StoreError::Transport("connection reset".to_string()),
    );

    assert!(p.increment("workers", 2).await.is_err());

    assert_eq!(fake.value("locks_limit_lock_workers"), None);
    assert_eq!(fake.value("limitCounters_workers"), None);
}

#[tokio::test]
async fn corrupt_counter_releases_guard() {
    let (fake, store) = store();
    let p = semaphore(&store, "p");
    let writer = process(&store, "x");
    latch_adapters::StoreAdapter::set(
        writer.store(),
        "limitCounters_workers",
        "lots",
        &latch_core::StoreOptions::new(),
    )
    .await
    .unwrap();

    let err = p.increment("workers", 2).await.unwrap_err();

    assert!(matches!(err, CoordinationError::InvalidCounter { .. }));
    assert_eq!(fake.value("locks_limit_lock_workers"), None);
}
