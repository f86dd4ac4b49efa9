//! Shared helpers for scenario tests

use latch_adapters::{FakeStoreAdapter, TracedStoreAdapter};
use latch_coordination::{LockClient, Semaphore};
use latch_core::{LatchConfig, SequentialTokenGen};

pub type Store = TracedStoreAdapter<FakeStoreAdapter>;

/// Settings every scenario runs with
const CONFIG: &str = r#"
[lock]
ttl = "10s"
renew_interval = "3s"

[semaphore]
lock_ttl = "5s"
"#;

pub fn config() -> LatchConfig {
    LatchConfig::from_toml_str(CONFIG).unwrap()
}

/// One in-memory store plus a view of it as a deployment would see it
pub fn store() -> (FakeStoreAdapter, Store) {
    let fake = FakeStoreAdapter::new();
    let traced = TracedStoreAdapter::new(fake.clone());
    (fake, traced)
}

/// Lock client for the process `name`; its tokens read `{name}-1`, `{name}-2`, ...
pub fn process(store: &Store, name: &str) -> LockClient<Store, SequentialTokenGen> {
    LockClient::with_token_gen(
        store.clone(),
        SequentialTokenGen::new(name),
        config().lock,
    )
}

pub fn semaphore(store: &Store, name: &str) -> Semaphore<Store, SequentialTokenGen> {
    Semaphore::new(process(store, name), config().semaphore)
}
