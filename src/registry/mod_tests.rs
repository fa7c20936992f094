use super::*;

#[test]
fn encode_key_reverses_labels_under_prefix() {
    let key = encode_key("/records", "web.example.com");
    assert_eq!(key, "/records/com/example/web");
}

#[test]
fn encode_key_strips_leading_and_trailing_dots() {
    let key = encode_key("/r", ".a.b.c.");
    assert_eq!(key, "/r/c/b/a");
}

#[test]
fn decode_key_is_the_inverse_of_encode_key() {
    let key = encode_key("/records", "a.b.example.com");
    let name = decode_key("/records", &key).unwrap();
    assert_eq!(name, "a.b.example.com");
}

#[test]
fn decode_key_rejects_keys_outside_the_prefix() {
    let result = decode_key("/records", "/other/com/example/web");
    assert!(result.is_err());
}

#[test]
fn decode_key_rejects_empty_segments() {
    let result = decode_key("/records", "/records/com//web");
    assert!(result.is_err());
}

#[test]
fn value_round_trips_through_json() {
    let intent = RecordIntent::new("web.local", RecordType::A, "10.0.0.5", "host-a", "web");
    let created = Utc::now();
    let raw = encode_value(&intent, created).unwrap();
    let decoded = decode_value("/records/local/web", "web.local", &raw).unwrap();
    assert_eq!(decoded, intent);
}

#[test]
fn malformed_value_json_is_rejected() {
    let result = decode_value("/records/local/web", "web.local", "{not json");
    assert!(result.is_err());
}

#[test]
fn canonical_lock_keys_sorts_and_dedupes() {
    let keys = canonical_lock_keys(vec![
        "b".to_string(),
        "a".to_string(),
        "b".to_string(),
        "c".to_string(),
    ]);
    assert_eq!(keys, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}
