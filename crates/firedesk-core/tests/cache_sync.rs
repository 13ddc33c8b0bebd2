#![allow(clippy::unwrap_used)]
// Integration tests for the cache components against a scripted store.

mod common;

use pretty_assertions::assert_eq;

use common::{FakeStore, fault_alarm, fire_alarm};
use firedesk_core::{AlarmDiffer, Bootstrap, CoreError, EventCache, Refresh, Theme, ThemeSettings};
use firedesk_core::{Rgb, store::EVENT_BATCH_LIMIT};

fn ids(cache: &EventCache) -> Vec<i64> {
    cache.events().iter().map(|e| e.id).collect()
}

// ── Event cache ─────────────────────────────────────────────────────

#[tokio::test]
async fn first_poll_only_establishes_watermark() {
    let store = FakeStore::new("a");
    store.push_events(1..=100);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);

    let first = cache.poll(&store).await.unwrap();
    assert_eq!(first, Refresh::Done(Vec::new()));
    assert_eq!(cache.watermark(), Some(100));
    assert!(cache.events().is_empty());
    assert_eq!(store.calls("events_since"), 0);
}

#[tokio::test]
async fn watermark_advances_and_history_is_never_reread() {
    let store = FakeStore::new("a");
    store.push_events(1..=100);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();

    store.push_events(101..=110);
    let batch = cache.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(batch.len(), 10);
    assert_eq!(batch.first().unwrap().id, 110);
    assert_eq!(cache.watermark(), Some(110));

    let empty = cache.poll(&store).await.unwrap().done().unwrap();
    assert!(empty.is_empty());
    assert_eq!(cache.watermark(), Some(110));
    assert_eq!(store.since_args(), vec![100, 110]);
}

#[tokio::test]
async fn merged_batches_leave_no_gaps() {
    let store = FakeStore::new("a");
    store.push_events(1..=100);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();

    store.push_events(101..=105);
    let _ = cache.poll(&store).await.unwrap();
    store.push_events(106..=110);
    let _ = cache.poll(&store).await.unwrap();

    assert_eq!(ids(&cache), (101..=110).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn cache_stays_bounded_and_keeps_newest() {
    let store = FakeStore::new("a");
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();
    assert_eq!(cache.watermark(), Some(0));

    store.push_events(1..=2500);
    let first = cache.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(first.len(), EVENT_BATCH_LIMIT);
    let second = cache.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(second.len(), 500);

    let cached = ids(&cache);
    assert_eq!(cached.len(), 2000);
    assert_eq!(cached.first().copied(), Some(2500));
    assert_eq!(cached.last().copied(), Some(501));
    assert!(cached.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn failed_poll_changes_nothing() {
    let store = FakeStore::new("a");
    store.push_events(1..=10);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();
    store.push_events(11..=12);
    let _ = cache.poll(&store).await.unwrap();

    store.push_events(13..=15);
    store.set_failing(true);
    let err = cache.poll(&store).await.unwrap_err();
    assert!(matches!(err, CoreError::StoreConnection { .. }));
    assert_eq!(cache.watermark(), Some(12));
    assert_eq!(ids(&cache), vec![12, 11]);

    store.set_failing(false);
    let batch = cache.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(ids(&cache), vec![15, 14, 13, 12, 11]);
}

#[tokio::test]
async fn backfill_bootstrap_loads_recent_history() {
    let store = FakeStore::new("a");
    store.push_events(1..=50);
    let cache = EventCache::new(20, Bootstrap::Backfill);

    let _ = cache.poll(&store).await.unwrap();
    assert_eq!(cache.watermark(), Some(30));
    let _ = cache.poll(&store).await.unwrap();
    assert_eq!(ids(&cache), (31..=50).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn reset_forgets_watermark() {
    let store = FakeStore::new("a");
    store.push_events(1..=5);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();
    store.push_events(6..=7);
    let _ = cache.poll(&store).await.unwrap();

    cache.reset();
    assert_eq!(cache.watermark(), None);
    assert!(cache.events().is_empty());

    let _ = cache.poll(&store).await.unwrap();
    assert_eq!(cache.watermark(), Some(7));
}

#[tokio::test]
async fn concurrent_poll_is_skipped_with_one_store_call() {
    let store = FakeStore::new("a");
    store.push_events(1..=3);
    let cache = EventCache::new(2000, Bootstrap::FromLatest);
    let _ = cache.poll(&store).await.unwrap();
    store.push_events(4..=5);

    store.hold();
    let first = cache.poll(&store);
    let second = async {
        tokio::task::yield_now().await;
        let outcome = cache.poll(&store).await;
        store.release();
        outcome
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap().done().map(|b| b.len()), Some(2));
    assert!(second.unwrap().is_skipped());
    assert_eq!(store.calls("events_since"), 1);
    assert_eq!(cache.watermark(), Some(5));
}

// ── Alarm differ ────────────────────────────────────────────────────

#[tokio::test]
async fn newly_appeared_alarm_is_reported_once() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();

    store.set_alarms(&[1, 2, 3]);
    let _ = differ.poll(&store).await.unwrap();

    store.set_alarms(&[2, 3, 4, 5]);
    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(poll.newly_appeared.map(|a| a.id), Some(4));
    assert_eq!(poll.snapshot.total, 4);
    assert_eq!(poll.snapshot.fire_count, 4);

    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    assert!(poll.newly_appeared.is_none());
}

#[tokio::test]
async fn failed_alarm_poll_keeps_last_known_set() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();
    store.set_alarms(&[1]);
    let _ = differ.poll(&store).await.unwrap();

    store.set_failing(true);
    store.set_alarms(&[1, 2]);
    assert!(differ.poll(&store).await.is_err());
    assert_eq!(differ.snapshot().total, 1);

    store.set_failing(false);
    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(poll.newly_appeared.map(|a| a.id), Some(2));
}

#[tokio::test]
async fn local_processing_survives_polls_until_alarm_clears() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();
    store.set_alarms(&[7, 8]);
    let _ = differ.poll(&store).await.unwrap();

    differ
        .process(7, "Оператор", firedesk_core::ProcessAction::FalseAlarm, "перевірено")
        .await
        .unwrap();
    assert_eq!(differ.snapshot().fire_count, 1);

    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    let seven = poll.snapshot.alarms.iter().find(|a| a.id == 7).unwrap();
    assert!(seven.is_processed());

    store.set_alarms(&[8]);
    let _ = differ.poll(&store).await.unwrap();
    store.set_alarms(&[7, 8]);
    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    let seven = poll.snapshot.alarms.iter().find(|a| a.id == 7).unwrap();
    assert!(!seven.is_processed());
    assert_eq!(poll.newly_appeared.map(|a| a.id), Some(7));
}

#[tokio::test]
async fn new_fault_is_not_reported_as_new_fire() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();
    store.set_alarms(&[1, 2, 3]);
    let _ = differ.poll(&store).await.unwrap();

    // The fault comes first in store order and is skipped anyway.
    store.set_alarm_rows(vec![fault_alarm(5), fire_alarm(2), fire_alarm(3), fire_alarm(4)]);
    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(poll.newly_appeared.map(|a| a.id), Some(4));
    assert_eq!(poll.snapshot.total, 4);
    assert_eq!(poll.snapshot.fire_count, 3);
}

#[tokio::test]
async fn reset_drops_marks_and_identities() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();
    store.set_alarms(&[7]);
    let _ = differ.poll(&store).await.unwrap();
    differ
        .process(7, "Оператор", firedesk_core::ProcessAction::FalseAlarm, "")
        .await
        .unwrap();

    differ.reset().await;
    assert_eq!(differ.snapshot().total, 0);

    let poll = differ.poll(&store).await.unwrap().done().unwrap();
    assert_eq!(poll.newly_appeared.map(|a| a.id), Some(7));
    assert_eq!(poll.snapshot.fire_count, 1);
}

#[tokio::test]
async fn alarm_poll_spanning_a_reset_is_dropped() {
    let store = FakeStore::new("a");
    let differ = AlarmDiffer::new();
    store.set_alarms(&[7]);
    store.hold();

    let reset = async {
        tokio::task::yield_now().await;
        differ.reset().await;
        store.release();
    };
    let (polled, ()) = tokio::join!(differ.poll(&store), reset);

    assert!(polled.unwrap().is_skipped());
    assert_eq!(differ.snapshot().total, 0);
}

#[tokio::test]
async fn processing_an_absent_alarm_is_not_found() {
    let differ = AlarmDiffer::new();
    let err = differ
        .process(99, "Оператор", firedesk_core::ProcessAction::Other, "")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── Severity ────────────────────────────────────────────────────────

#[test]
fn set_color_then_reset_restores_builtin() {
    let settings = ThemeSettings::new(Theme::Dark);
    let builtin = settings.classify(12, Theme::Dark);
    let row: Rgb = "#102030".parse().unwrap();

    settings.set_color(12, Theme::Dark, row);
    let edited = settings.classify(12, Theme::Dark);
    assert_eq!(edited.row, row);
    assert_eq!(edited.text, builtin.text);
    assert_eq!(settings.classify(12, Theme::Light), ThemeSettings::new(Theme::Light).classify(12, Theme::Light));

    settings.reset_to_default(Theme::Dark);
    assert_eq!(settings.classify(12, Theme::Dark), builtin);
}
