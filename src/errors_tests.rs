use super::*;

#[test]
fn lock_timeout_is_transient() {
    let err = SyncError::LockTimeout {
        keys: vec!["sync".to_string()],
        elapsed_secs: 30,
    };
    assert!(err.is_transient());
}

#[test]
fn malformed_value_is_not_transient() {
    let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err = SyncError::MalformedValue {
        key: "/records/com/example/a".to_string(),
        source,
    };
    assert!(!err.is_transient());
}

#[test]
fn lock_not_held_is_not_transient() {
    let err = SyncError::LockNotHeld("sync".to_string());
    assert!(!err.is_transient());
}

#[test]
fn display_messages_are_descriptive() {
    let err = SyncError::MalformedKey("/records/bogus".to_string());
    assert!(err.to_string().contains("/records/bogus"));

    let err = SyncError::LockTimeout {
        keys: vec!["sync".to_string(), "com/example/a".to_string()],
        elapsed_secs: 12,
    };
    let msg = err.to_string();
    assert!(msg.contains("12s"));
}
