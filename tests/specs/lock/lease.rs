//! Lease renewal specs

use crate::prelude::*;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn kept_lease_outlives_ttl() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let b = process(&store, "b");
    let token = a.acquire("jobs").await.unwrap();
    let keeper = a.keep_alive("jobs", token).unwrap();

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert!(b.try_acquire("jobs").await.unwrap().is_none());

    let token = keeper.stop().await.unwrap();
    a.release("jobs", &token).await.unwrap();
    assert!(b.try_acquire("jobs").await.unwrap().is_some());
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("b-2"));
}

#[tokio::test(start_paused = true)]
async fn manual_renewal_resets_expiry() {
    let (fake, store) = store();
    let a = process(&store, "a");
    let token = a.acquire("jobs").await.unwrap();

    tokio::time::advance(Duration::from_secs(7)).await;
    a.renew("jobs", &token).await.unwrap();
    tokio::time::advance(Duration::from_secs(7)).await;
    assert_eq!(fake.value("locks_jobs").as_deref(), Some("a-1"));

    tokio::time::advance(Duration::from_secs(4)).await;
    assert_eq!(fake.value("locks_jobs"), None);
}
