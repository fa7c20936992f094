use super::*;
use crate::events::ContainerEventKind;
use std::collections::HashMap;

fn deriver() -> LabelBasedIntentDeriver {
    LabelBasedIntentDeriver::new("dns-sync.register", "local")
}

fn event_with_labels(labels: HashMap<String, String>, ip: Option<&str>) -> ContainerEvent {
    ContainerEvent {
        kind: ContainerEventKind::Started,
        container_id: "abc123".to_string(),
        container_name: "web".to_string(),
        labels,
        ip_address: ip.map(str::to_string),
    }
}

#[test]
fn opted_in_container_produces_an_a_record() {
    let mut labels = HashMap::new();
    labels.insert("dns-sync.register".to_string(), "true".to_string());
    let event = event_with_labels(labels, Some("10.0.0.5"));

    let intents = deriver().derive(&event, "host-a");
    assert_eq!(intents.len(), 1);
    let intent = &intents[0];
    assert_eq!(intent.name, "web.local");
    assert_eq!(intent.record_type, RecordType::A);
    assert_eq!(intent.host, "10.0.0.5");
    assert_eq!(intent.owner_hostname, "host-a");
    assert_eq!(intent.owner_container_name, "web");
}

#[test]
fn missing_label_opts_out() {
    let event = event_with_labels(HashMap::new(), Some("10.0.0.5"));
    assert!(deriver().derive(&event, "host-a").is_empty());
}

#[test]
fn label_set_to_false_opts_out() {
    let mut labels = HashMap::new();
    labels.insert("dns-sync.register".to_string(), "false".to_string());
    let event = event_with_labels(labels, Some("10.0.0.5"));
    assert!(deriver().derive(&event, "host-a").is_empty());
}

#[test]
fn missing_ip_address_yields_no_intent() {
    let mut labels = HashMap::new();
    labels.insert("dns-sync.register".to_string(), "true".to_string());
    let event = event_with_labels(labels, None);
    assert!(deriver().derive(&event, "host-a").is_empty());
}
