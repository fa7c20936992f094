use super::*;
use crate::record::RecordType;
use chrono::Duration as ChronoDuration;

fn intent(name: &str) -> RecordIntent {
    RecordIntent::new(name, RecordType::A, "10.0.0.5", "host-a", "web")
}

#[tokio::test]
async fn upsert_then_list_returns_the_intent() {
    let tracker = StateTracker::new();
    tracker.upsert("c1", vec![intent("web.local")]).await;
    let intents = tracker.get_all_desired_record_intents().await;
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].name, "web.local");
}

#[tokio::test]
async fn upsert_supports_multiple_intents_per_container() {
    let tracker = StateTracker::new();
    let cname = RecordIntent::new(
        "alias.local",
        RecordType::Cname,
        "web.local",
        "host-a",
        "web",
    );
    tracker
        .upsert("c1", vec![intent("web.local"), cname.clone()])
        .await;

    let mut intents = tracker.get_all_desired_record_intents().await;
    intents.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(intents.len(), 2);
    assert_eq!(intents[0].name, "alias.local");
    assert_eq!(intents[1].name, "web.local");
}

#[tokio::test]
async fn marked_removed_entry_is_excluded_from_desired_but_still_tracked() {
    let tracker = StateTracker::new();
    let now = Utc::now();
    tracker.upsert("c1", vec![intent("web.local")]).await;
    tracker.mark_removed("c1", now).await;

    assert!(tracker.get_all_desired_record_intents().await.is_empty());
    assert_eq!(tracker.len().await, 1);
}

#[tokio::test]
async fn remove_stale_reaps_entries_past_the_ttl() {
    let tracker = StateTracker::new();
    let removed_at = Utc::now() - ChronoDuration::seconds(120);
    tracker.upsert("c1", vec![intent("web.local")]).await;
    tracker.mark_removed("c1", removed_at).await;

    let reaped = tracker.remove_stale(Utc::now(), 60).await;
    assert_eq!(reaped, 1);
    assert_eq!(tracker.len().await, 0);
}

#[tokio::test]
async fn remove_stale_keeps_entries_within_the_grace_period() {
    let tracker = StateTracker::new();
    let removed_at = Utc::now() - ChronoDuration::seconds(5);
    tracker.upsert("c1", vec![intent("web.local")]).await;
    tracker.mark_removed("c1", removed_at).await;

    let reaped = tracker.remove_stale(Utc::now(), 60).await;
    assert_eq!(reaped, 0);
    assert_eq!(tracker.len().await, 1);
}

#[tokio::test]
async fn reflap_clears_pending_removal() {
    let tracker = StateTracker::new();
    tracker.upsert("c1", vec![intent("web.local")]).await;
    tracker.mark_removed("c1", Utc::now()).await;
    tracker.upsert("c1", vec![intent("web.local")]).await;

    let intents = tracker.get_all_desired_record_intents().await;
    assert_eq!(intents.len(), 1);
}
