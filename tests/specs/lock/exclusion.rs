//! Lock exclusion specs
//!
//! Verify that one process holds a lock at a time and that waiters take over
//! on release or expiry.

use crate::prelude::*;
use latch_coordination::{AcquireOptions, CoordinationError};
use latch_core::LockToken;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn waiter_takes_over_on_release() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");

    let token = a.acquire("jobs").await.unwrap();
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("a-1"));

    let waiting = tokio::spawn(async move { b.acquire("jobs").await });
    tokio::task::yield_now().await;
    assert!(!waiting.is_finished());

    a.release("jobs", &token).await.unwrap();

    let taken = waiting.await.unwrap().unwrap();
    assert_eq!(taken.as_str(), "b-1");
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("b-1"));
}

#[tokio::test(start_paused = true)]
async fn abandoned_lock_frees_after_ttl() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");

    // a acquires and then goes away without releasing
    a.acquire("jobs").await.unwrap();
    let started = Instant::now();

    let token = b.acquire("jobs").await.unwrap();

    assert_eq!(token.as_str(), "b-1");
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("b-1"));
}

#[tokio::test]
async fn stale_owner_cannot_release_new_holder() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");

    let first = a.acquire("jobs").await.unwrap();
    a.release("jobs", &first).await.unwrap();
    b.acquire("jobs").await.unwrap();

    let err = a.release("jobs", &first).await.unwrap_err();

    assert!(matches!(err, CoordinationError::NotHeld { .. }));
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("b-1"));
}

#[tokio::test]
async fn forged_token_cannot_renew() {
    let (fake, store) = store();
    let a = process(&store, "a");
    a.acquire("jobs").await.unwrap();

    let err = a
        .renew("jobs", &LockToken::new("someone-else"))
        .await
        .unwrap_err();

    assert!(matches!(err, CoordinationError::NotHeld { .. }));
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("a-1"));
}

#[tokio::test(start_paused = true)]
async fn waiter_gives_up_at_deadline() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");
    a.acquire("jobs").await.unwrap();

    let err = b
        .acquire_with(
            "jobs",
            AcquireOptions::new(Duration::from_secs(10)).with_timeout(Duration::from_secs(2)),
        )
        .await
        .unwrap_err();

    assert!(err.is_deadline_exceeded());
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("a-1"));
}

#[tokio::test]
async fn locks_are_independent() {
    let (_fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");

    a.acquire("jobs").await.unwrap();
    let other = b.try_acquire("reports").await.unwrap();

    assert!(other.is_some());
    assert!(b.try_acquire("jobs").await.unwrap().is_none());
}
