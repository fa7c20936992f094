use super::*;
use crate::derive::LabelBasedIntentDeriver;
use crate::events::{ChannelEventSource, ContainerEvent, ContainerEventKind};
use crate::registry::memory::InMemoryRegistry;
use std::collections::HashMap;
use std::time::Duration;

fn test_settings() -> Settings {
    Settings {
        etcd_host: "127.0.0.1".to_string(),
        etcd_port: 2379,
        etcd_path_prefix: "/records".to_string(),
        etcd_lock_ttl_secs: 10,
        etcd_lock_timeout: Duration::from_millis(200),
        etcd_lock_retry_interval: Duration::from_millis(5),
        hostname: "host-a".to_string(),
        poll_interval: Duration::from_millis(20),
        staleness_ttl_secs: 60,
        lock_sync_tick: true,
        dns_label_key: "dns-sync.register".to_string(),
        dns_domain_suffix: "local".to_string(),
        metrics_bind_address: "0.0.0.0".to_string(),
        metrics_port: 9090,
        metrics_path: "/metrics".to_string(),
    }
}

fn started_event(name: &str) -> ContainerEvent {
    let mut labels = HashMap::new();
    labels.insert("dns-sync.register".to_string(), "true".to_string());
    ContainerEvent {
        kind: ContainerEventKind::Started,
        container_id: format!("{name}-id"),
        container_name: name.to_string(),
        labels,
        ip_address: Some("10.0.0.5".to_string()),
    }
}

fn stopped_event(name: &str) -> ContainerEvent {
    ContainerEvent {
        kind: ContainerEventKind::Stopped,
        container_id: format!("{name}-id"),
        container_name: name.to_string(),
        labels: HashMap::new(),
        ip_address: None,
    }
}

#[tokio::test]
async fn tick_registers_a_new_desired_intent() {
    let registry = Arc::new(InMemoryRegistry::new());
    let (tx, source) = ChannelEventSource::new_pair(8);
    let deriver = Arc::new(LabelBasedIntentDeriver::new("dns-sync.register", "local"));
    let settings = test_settings();

    let engine = SyncEngine::new(
        registry.clone() as Arc<dyn Registry>,
        Arc::new(source),
        deriver.clone() as Arc<dyn IntentDeriver>,
        settings,
    );

    tx.send(started_event("web")).await.unwrap();
    // feed the event straight into state, bypassing the background consumer,
    // to keep this test deterministic.
    let intents = deriver.derive(&started_event("web"), "host-a");
    engine.state.upsert("web-id", intents).await;

    engine.tick().await.unwrap();

    let records = registry.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "web.local");
}

#[tokio::test]
async fn tick_removes_no_longer_desired_intent() {
    let registry = Arc::new(InMemoryRegistry::new());
    let (_tx, source) = ChannelEventSource::new_pair(8);
    let deriver = Arc::new(LabelBasedIntentDeriver::new("dns-sync.register", "local"));
    let settings = test_settings();

    let engine = SyncEngine::new(
        registry.clone() as Arc<dyn Registry>,
        Arc::new(source),
        deriver.clone() as Arc<dyn IntentDeriver>,
        settings,
    );

    let intents = deriver.derive(&started_event("web"), "host-a");
    engine.state.upsert("web-id", intents).await;
    engine.tick().await.unwrap();
    assert_eq!(registry.list().await.unwrap().len(), 1);

    engine.state.mark_removed("web-id", Utc::now()).await;
    engine.tick().await.unwrap();
    assert!(registry.list().await.unwrap().is_empty());

    let _ = stopped_event("web");
}

#[tokio::test]
async fn tick_is_idempotent() {
    let registry = Arc::new(InMemoryRegistry::new());
    let (_tx, source) = ChannelEventSource::new_pair(8);
    let deriver = Arc::new(LabelBasedIntentDeriver::new("dns-sync.register", "local"));
    let settings = test_settings();

    let engine = SyncEngine::new(
        registry.clone() as Arc<dyn Registry>,
        Arc::new(source),
        deriver.clone() as Arc<dyn IntentDeriver>,
        settings,
    );

    let intents = deriver.derive(&started_event("web"), "host-a");
    engine.state.upsert("web-id", intents).await;

    engine.tick().await.unwrap();
    engine.tick().await.unwrap();
    engine.tick().await.unwrap();

    assert_eq!(registry.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn tick_never_touches_records_owned_by_another_host() {
    let registry = Arc::new(InMemoryRegistry::new());
    let foreign_intent = crate::record::RecordIntent::new(
        "other.local",
        crate::record::RecordType::A,
        "10.0.0.9",
        "host-b",
        "other",
    );
    registry.register(&foreign_intent).await.unwrap();

    let (_tx, source) = ChannelEventSource::new_pair(8);
    let deriver = Arc::new(LabelBasedIntentDeriver::new("dns-sync.register", "local"));
    let settings = test_settings();

    let engine = SyncEngine::new(
        registry.clone() as Arc<dyn Registry>,
        Arc::new(source),
        deriver as Arc<dyn IntentDeriver>,
        settings,
    );

    engine.tick().await.unwrap();

    let records = registry.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].owner_hostname, "host-b");
}
