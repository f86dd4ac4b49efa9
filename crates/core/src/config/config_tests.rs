// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

#[test]
fn empty_document_uses_defaults() {
    let config = LatchConfig::from_toml_str("").unwrap();

    assert_eq!(config.store.hostname, "127.0.0.1");
    assert_eq!(config.store.port, 4001);
    assert_eq!(config.store.request_timeout, Duration::from_secs(5));
    assert_eq!(config.store.watch_timeout, None);
    assert_eq!(config.lock.ttl, Duration::from_secs(60));
    assert_eq!(config.semaphore.lock_ttl, Duration::from_secs(60));
}

#[test]
fn parses_humantime_durations() {
    let config = LatchConfig::from_toml_str(
        r#"
        [store]
        hostname = "etcd.internal"
        port = 2379
        request_timeout = "2s"
        watch_timeout = "5m"

        [lock]
        ttl = "30s"
        renew_interval = "10s"

        [semaphore]
        lock_ttl = "15s"
        "#,
    )
    .unwrap();

    assert_eq!(config.store.base_url(), "http://etcd.internal:2379");
    assert_eq!(config.store.request_timeout, Duration::from_secs(2));
    assert_eq!(config.store.watch_timeout, Some(Duration::from_secs(300)));
    assert_eq!(config.lock.ttl, Duration::from_secs(30));
    assert_eq!(
        config.lock.effective_renew_interval(),
        Duration::from_secs(10)
    );
    assert_eq!(config.semaphore.lock_ttl, Duration::from_secs(15));
}

#[test]
fn renew_interval_defaults_to_third_of_ttl() {
    let lock = LockConfig::new().with_ttl(Duration::from_secs(30));
    assert_eq!(lock.effective_renew_interval(), Duration::from_secs(10));
}

#[test]
fn rejects_sub_second_ttl() {
    let err = LatchConfig::from_toml_str("[lock]\nttl = \"500ms\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "lock.ttl", .. }));
}

#[test]
fn rejects_renew_interval_longer_than_ttl() {
    let err =
        LatchConfig::from_toml_str("[lock]\nttl = \"10s\"\nrenew_interval = \"20s\"\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "lock.renew_interval",
            ..
        }
    ));
}

#[test]
fn rejects_unparseable_duration() {
    let err = LatchConfig::from_toml_str("[store]\nrequest_timeout = \"soon\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[store]\nport = 2379").unwrap();

    let config = LatchConfig::load(file.path()).unwrap();

    assert_eq!(config.store.port, 2379);
    assert_eq!(config.store.hostname, "127.0.0.1");
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latch.toml");

    let err = LatchConfig::load(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Io { path: p, .. } if p == path));
}
