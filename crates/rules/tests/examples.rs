//! The shipped rule file and bookings fixture under `data/` load, validate and
//! run a full cycle.

use std::sync::Arc;

use chrono::DateTime;

use bookwatch_core::{Booking, FixedClock, MemoryRepository};
use bookwatch_notify::{Dispatcher, RecordingSender};
use bookwatch_rules::{
    ActionRegistry, BookingContext, ConditionRegistry, CycleSummary, RecordOutcome, RuleEngine,
    RuleStore, Services,
};

/// Integration tests run from the crate directory, so go up two levels.
fn data_dir() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data")
}

fn open_store() -> RuleStore {
    RuleStore::open(
        data_dir().join("rules/booking-rules.yml"),
        &ConditionRegistry::builtins(),
        &ActionRegistry::builtins(),
    )
    .unwrap_or_else(|e| panic!("shipped rules must validate: {e}"))
}

fn bookings() -> Vec<Booking> {
    let raw = std::fs::read_to_string(data_dir().join("bookings.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

async fn cycle(
    engine: &RuleEngine,
    services: &Services,
    now: &str,
) -> Vec<RecordOutcome> {
    let clock = FixedClock(DateTime::parse_from_rfc3339(now).unwrap());
    let mut contexts = Vec::new();
    for booking in bookings() {
        contexts.push(BookingContext::load(booking, &clock, services.clone()).await.unwrap());
    }
    engine.process_batch(contexts).await
}

#[test]
fn shipped_rules_load_in_order() {
    let store = open_store();
    let rules = store.current();
    let names: Vec<_> = rules.rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["new-booking", "reminder", "option-notice", "cancelled"]);
    assert_eq!(rules.enabled_count(), 3);
    assert_eq!(rules.templates.len(), 3);
    assert!(rules.store("store-02").is_some());
}

#[tokio::test]
async fn shipped_rules_run_a_cycle_once() {
    let store = open_store();
    let engine = RuleEngine::new(
        store.current(),
        store.conditions().clone(),
        store.actions().clone(),
    );
    let sender = Arc::new(RecordingSender::new("gateway"));
    let services = Services::new(
        Arc::new(MemoryRepository::new()),
        Arc::new(Dispatcher::with_default(sender.clone())),
    );

    let outcomes = cycle(&engine, &services, "2026-03-01T20:00:00+09:00").await;
    assert_eq!(outcomes.len(), 2);

    // R-1001: new, within two hours, asked for a cake during the 20:00 run.
    assert_eq!(
        outcomes[0].fired_rules(),
        vec!["new-booking", "reminder", "option-notice"]
    );
    // R-1002: new, tomorrow, no options.
    assert_eq!(outcomes[1].fired_rules(), vec!["new-booking"]);

    let summary = CycleSummary::from_outcomes(&outcomes);
    assert_eq!(summary.actions, 12);
    assert_eq!(summary.failures, 0, "{}", summary.render());

    let sent = sender.sent();
    assert_eq!(sent.len(), 4);
    assert!(sent[1].body.contains("Shibuya"));
    assert_eq!(sent[2].target, "shibuya-frontdesk");
    assert!(sent[2].body.contains("***-****-5678"));
    assert!(sent[3].body.contains("partner car park"));

    // Same cycle again: every notification is already flagged.
    let again = cycle(&engine, &services, "2026-03-01T20:00:00+09:00").await;
    assert!(again.iter().all(|o| o.results.is_empty()));
    assert_eq!(sender.sent().len(), 4);
}
