use chrono::Duration;

use parley_cache::{EmbeddedThreadStateStore, MemoryThreadStateStore, ThreadStateStore};
use parley_persist::ThreadBinding;

fn binding(conversation_id: &str, thread_id: &str, ttl_hours: i64) -> ThreadBinding {
    ThreadBinding::new(conversation_id, thread_id, Duration::hours(ttl_hours))
}

#[tokio::test]
async fn set_then_get_returns_equal_binding() {
    let store = MemoryThreadStateStore::new();
    let original = binding("c1", "t1", 24);

    store.set(original.clone()).await;
    let fetched = store.get("c1").await.expect("binding should be present");

    assert_eq!(fetched, original);
}

#[tokio::test]
async fn expired_binding_reads_as_absent() {
    let store = MemoryThreadStateStore::new();
    let mut expired = binding("c1", "t1", 24);
    expired.expires_at = expired.created_at - Duration::hours(1);

    store.set(expired).await;

    assert!(store.get("c1").await.is_none());
}

#[tokio::test]
async fn expired_binding_is_evicted_on_read() {
    let store = MemoryThreadStateStore::new();
    let mut expired = binding("c1", "t1", 24);
    expired.expires_at = expired.created_at - Duration::hours(1);

    store.set(expired).await;
    let _ = store.get("c1").await;

    // After the eviction a fresh binding for the same conversation is stored cleanly
    assert!(!store.exists("c1").await);
    store.set(binding("c1", "t2", 24)).await;
    assert_eq!(store.get("c1").await.unwrap().thread_id, "t2");
}

#[tokio::test]
async fn set_overwrites_previous_binding() {
    let store = MemoryThreadStateStore::new();

    store.set(binding("c1", "t1", 24)).await;
    store.set(binding("c1", "t2", 24)).await;

    assert_eq!(store.get("c1").await.unwrap().thread_id, "t2");
}

#[tokio::test]
async fn remove_clears_the_binding() {
    let store = MemoryThreadStateStore::new();

    store.set(binding("c1", "t1", 24)).await;
    assert!(store.exists("c1").await);

    store.remove("c1").await;
    assert!(!store.exists("c1").await);
    assert!(store.get("c1").await.is_none());
}

#[tokio::test]
async fn inactive_binding_reads_as_absent() {
    let store = MemoryThreadStateStore::new();
    let mut inactive = binding("c1", "t1", 24);
    inactive.is_active = false;

    store.set(inactive).await;

    assert!(store.get("c1").await.is_none());
}

#[tokio::test]
async fn embedded_store_is_a_non_authoritative_noop() {
    let store = EmbeddedThreadStateStore::new();

    store.set(binding("c1", "t1", 24)).await;

    assert!(!store.authoritative());
    assert!(store.get("c1").await.is_none());
    assert!(!store.exists("c1").await);
}
