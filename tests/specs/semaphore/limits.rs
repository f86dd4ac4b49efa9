//! Semaphore limit specs

use crate::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn third_worker_waits_for_a_slot() {
    let (fake, store) = store();
    let p = semaphore(&store, "p");
    let q = semaphore(&store, "q");
    let r = semaphore(&store, "r");

    assert_eq!(p.increment("workers", 2).await.unwrap(), 1);
    assert_eq!(q.increment("workers", 2).await.unwrap(), 2);

    let waiting = tokio::spawn(async move { r.increment("workers", 2).await });
    tokio::task::yield_now().await;
    assert!(!waiting.is_finished());

    assert_eq!(p.decrement("workers").await.unwrap(), 1);

    assert_eq!(waiting.await.unwrap().unwrap(), 2);
    assert_eq!(fake.value("limitCounters_workers").as_deref(), Some("2"));
    assert_eq!(fake.value("locks_limit_lock_workers"), None);
}

#[tokio::test(start_paused = true)]
async fn concurrent_workers_respect_limit() {
    let (fake, store) = store();
    let running = Arc::new(AtomicI64::new(0));
    let most = Arc::new(AtomicI64::new(0));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let sem = semaphore(&store, &format!("w{}", i));
        let running = Arc::clone(&running);
        let most = Arc::clone(&most);
        tasks.push(tokio::spawn(async move {
            sem.increment("workers", 3).await.unwrap();
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            most.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            sem.decrement("workers").await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(most.load(Ordering::SeqCst) <= 3);
    assert_eq!(fake.value("limitCounters_workers").as_deref(), Some("0"));
    assert_eq!(fake.value("locks_limit_lock_workers"), None);
}
