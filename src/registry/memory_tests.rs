use super::*;
use crate::registry::{canonical_lock_keys, LockGuard};
use std::sync::Arc;

fn intent(name: &str) -> RecordIntent {
    RecordIntent::new(name, RecordType::A, "10.0.0.5", "host-a", "web")
}

#[tokio::test]
async fn register_then_list_returns_the_record() {
    let registry = InMemoryRegistry::new();
    registry.register(&intent("web.local")).await.unwrap();
    let records = registry.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "web.local");
}

#[tokio::test]
async fn remove_drops_the_record() {
    let registry = InMemoryRegistry::new();
    registry.register(&intent("web.local")).await.unwrap();
    registry.remove("web.local", RecordType::A).await.unwrap();
    assert!(registry.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn removing_absent_record_is_a_no_op() {
    let registry = InMemoryRegistry::new();
    registry.remove("ghost.local", RecordType::A).await.unwrap();
}

#[tokio::test]
async fn lock_excludes_a_second_holder_until_released() {
    let registry = Arc::new(InMemoryRegistry::new());
    let keys = canonical_lock_keys(vec!["sync".to_string()]);

    let guard = LockGuard::acquire(
        Arc::clone(&registry) as Arc<dyn Registry>,
        keys.clone(),
        10,
        Duration::from_millis(5),
        Duration::from_millis(50),
    )
    .await
    .unwrap();

    let second = registry
        .lock(&keys, 10, Duration::from_millis(5), Duration::from_millis(20))
        .await;
    assert!(matches!(second, Err(SyncError::LockTimeout { .. })));

    guard.release().await.unwrap();

    registry
        .lock(&keys, 10, Duration::from_millis(5), Duration::from_millis(50))
        .await
        .unwrap();
}

#[tokio::test]
async fn drop_releases_the_lock_best_effort() {
    let registry = Arc::new(InMemoryRegistry::new());
    let keys = canonical_lock_keys(vec!["sync".to_string()]);

    {
        let _guard = LockGuard::acquire(
            Arc::clone(&registry) as Arc<dyn Registry>,
            keys.clone(),
            10,
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
        .await
        .unwrap();
    }

    // give the detached release task a chance to run
    tokio::time::sleep(Duration::from_millis(20)).await;

    registry
        .lock(&keys, 10, Duration::from_millis(5), Duration::from_millis(200))
        .await
        .unwrap();
}
