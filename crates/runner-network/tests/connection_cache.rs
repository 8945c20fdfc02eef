//! Transport handle reuse keyed by destination identity.

use runner_network::{ClientConfig, ClientKey, ConnectionCache, NetworkError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn fixture_ca() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ca.pem")
}

fn cache() -> ConnectionCache {
    ConnectionCache::new(ClientConfig::new("ci/api/v1"))
}

/// Test: value-equal identities share one handle, others do not
#[tokio::test]
async fn test_handles_keyed_by_url_and_trust_root() {
    let cache = cache();
    let ca = fixture_ca();

    let c1 = cache
        .acquire(&ClientKey::new("http://test/", None).unwrap())
        .await
        .expect("plain handle");
    let c2 = cache
        .acquire(&ClientKey::new("http://test2/", None).unwrap())
        .await
        .expect("second host handle");
    let c4 = cache
        .acquire(&ClientKey::new("http://test/", Some(ca.as_path())).unwrap())
        .await
        .expect("pinned handle");
    let c5 = cache
        .acquire(&ClientKey::new("http://test/", Some(ca.as_path())).unwrap())
        .await
        .expect("pinned handle again");

    assert!(!Arc::ptr_eq(&c1, &c2), "different hosts must not share a handle");
    assert!(!Arc::ptr_eq(&c1, &c4), "trust root is part of the identity");
    assert!(Arc::ptr_eq(&c4, &c5), "equal identities reuse the handle");
    assert_eq!(cache.len().await, 3);
}

/// Test: two different trust-root files give two handles
#[tokio::test]
async fn test_distinct_trust_roots() {
    let dir = tempfile::tempdir().unwrap();
    let other_ca = dir.path().join("other-ca.pem");
    std::fs::copy(fixture_ca(), &other_ca).unwrap();

    let cache = cache();
    let a = cache
        .acquire(&ClientKey::new("https://ci.example.com", Some(fixture_ca().as_path())).unwrap())
        .await
        .unwrap();
    let b = cache
        .acquire(&ClientKey::new("https://ci.example.com", Some(other_ca.as_path())).unwrap())
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
}

/// Test: malformed endpoints fail fast and never reach the cache
#[tokio::test]
async fn test_broken_url_is_never_cached() {
    let cache = cache();

    for _ in 0..2 {
        let err = ClientKey::new("broken", None).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl { .. }));
        assert!(err.is_config());
    }
    assert!(cache.is_empty().await);

    // The corrected URL still builds a handle
    assert!(cache
        .acquire(&ClientKey::new("http://test/", None).unwrap())
        .await
        .is_ok());
    assert_eq!(cache.len().await, 1);
}

/// Test: concurrent acquires of one identity collapse to a single handle
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquire_builds_once() {
    let cache = Arc::new(cache());
    let key = ClientKey::new("http://test/", Some(fixture_ca().as_path())).unwrap();

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        tasks.push(tokio::spawn(async move { cache.acquire(&key).await.unwrap() }));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    let first = &handles[0];
    assert!(handles.iter().all(|handle| Arc::ptr_eq(first, handle)));
    assert_eq!(cache.len().await, 1);
}
