#![allow(clippy::unwrap_used)]
// Integration tests for the `Console` hub: publishing, selection and reconnect.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::FakeStore;
use firedesk_core::{
    ConnectionState, Console, ConsoleOptions, ConsoleUpdate, CoreError, ObjectId, ProcessAction,
    Theme, ThemeSettings,
};

fn console(store: &Arc<FakeStore>) -> Console {
    Console::new(
        Arc::clone(store) as Arc<dyn firedesk_core::store::LegacyStore>,
        Arc::new(ThemeSettings::new(Theme::Dark)),
        ConsoleOptions::default(),
    )
}

#[tokio::test]
async fn alarm_refresh_publishes_snapshot_then_new_fire() {
    let store = Arc::new(FakeStore::new("a"));
    store.set_alarms(&[1002]);
    let console = console(&store);
    let mut updates = console.take_updates();

    let _ = console.refresh_alarms().await.unwrap();

    assert!(matches!(updates.try_recv().unwrap(), ConsoleUpdate::Alarms(s) if s.total == 1));
    assert!(matches!(updates.try_recv().unwrap(), ConsoleUpdate::NewFireAlarm(a) if a.id == 1002));
    assert!(updates.try_recv().is_err());
}

#[tokio::test]
async fn refresh_all_attempts_every_cache() {
    let store = Arc::new(FakeStore::new("a"));
    store.set_failing(true);
    let console = console(&store);

    assert!(console.refresh_all().await.is_err());
    assert_eq!(store.calls("list_objects"), 1);
    assert_eq!(store.calls("active_alarms"), 1);
    assert_eq!(store.calls("last_event_id"), 1);
}

#[tokio::test]
async fn refresh_all_succeeds_when_every_cache_does() {
    let store = Arc::new(FakeStore::new("a"));
    store.set_objects(&[1, 2]);
    store.set_alarms(&[2]);
    let console = console(&store);

    console.refresh_all().await.unwrap();
    assert_eq!(console.objects().snapshot().len(), 2);
    assert_eq!(console.alarms().snapshot().total, 1);
    assert_eq!(store.calls("last_event_id"), 1);
}

#[tokio::test]
async fn selecting_a_vanished_object_keeps_selection() {
    let store = Arc::new(FakeStore::new("a"));
    store.set_objects(&[1, 2]);
    let console = console(&store);
    let _ = console.refresh_objects().await.unwrap();

    let details = console.select_object(ObjectId(1)).await.unwrap().unwrap();
    assert_eq!(details.object.id, ObjectId(1));
    assert!(console.objects().get(ObjectId(1)).unwrap().detail.is_some());

    assert!(console.select_object(ObjectId(9)).await.unwrap().is_none());
    assert_eq!(console.selected(), Some(ObjectId(1)));
}

#[tokio::test]
async fn failed_reconnect_keeps_working_store() {
    let a = Arc::new(FakeStore::new("a"));
    a.set_objects(&[1, 2, 3]);
    let b = Arc::new(FakeStore::new("b"));
    b.set_unreachable(true);
    let console = console(&a);
    let _ = console.refresh_objects().await.unwrap();

    let err = console.reconnect(Arc::clone(&b) as _).await.unwrap_err();
    assert!(matches!(err, CoreError::StoreConnection { .. }));
    assert_eq!(console.store().describe(), "a");

    let polled = console.refresh_objects().await.unwrap().done();
    assert_eq!(polled, Some(3));
    assert_eq!(a.calls("list_objects"), 2);
    assert_eq!(b.calls("list_objects"), 0);
}

#[tokio::test]
async fn successful_reconnect_swaps_store_and_resets_events() {
    let a = Arc::new(FakeStore::new("a"));
    a.push_events(1..=500);
    let b = Arc::new(FakeStore::new("b"));
    b.push_events(1..=20);
    b.set_objects(&[7]);
    let console = console(&a);
    let _ = console.refresh_events().await.unwrap();
    assert_eq!(console.events().watermark(), Some(500));

    let mut updates = console.take_updates();
    console.reconnect(Arc::clone(&b) as _).await.unwrap();

    assert_eq!(console.store().describe(), "b");
    assert_eq!(console.events().watermark(), Some(20));
    assert_eq!(console.objects().snapshot().len(), 1);
    assert_eq!(*console.connection_state().borrow(), ConnectionState::Connected);

    let mut saw_reset = false;
    let mut saw_reconnected = false;
    while let Ok(update) = updates.try_recv() {
        match update {
            ConsoleUpdate::EventsReset => saw_reset = true,
            ConsoleUpdate::Reconnected { target } => {
                assert!(saw_reset);
                assert_eq!(target, "b");
                saw_reconnected = true;
            }
            _ => {}
        }
    }
    assert!(saw_reconnected);
    console.shutdown().await;
}

#[tokio::test]
async fn reconnect_forgets_alarm_marks_from_the_old_store() {
    let a = Arc::new(FakeStore::new("a"));
    a.set_alarms(&[1002]);
    let b = Arc::new(FakeStore::new("b"));
    b.set_alarms(&[1002]);
    let console = console(&a);
    let _ = console.refresh_alarms().await.unwrap();
    console
        .process_alarm(1002, "Оператор", ProcessAction::FalseAlarm, "")
        .await
        .unwrap();
    assert_eq!(console.alarms().snapshot().fire_count, 0);

    let mut updates = console.take_updates();
    console.reconnect(Arc::clone(&b) as _).await.unwrap();

    let snapshot = console.alarms().snapshot();
    assert_eq!(snapshot.fire_count, 1);
    assert!(!snapshot.alarms[0].is_processed());

    let mut new_fire = None;
    while let Ok(update) = updates.try_recv() {
        if let ConsoleUpdate::NewFireAlarm(alarm) = update {
            new_fire = Some(alarm.id);
        }
    }
    assert_eq!(new_fire, Some(1002));
    console.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn pollers_merge_new_events_on_the_fast_tick() {
    let store = Arc::new(FakeStore::new("a"));
    store.push_events(1..=10);
    let console = console(&store);
    console.start().await;
    assert_eq!(console.events().watermark(), Some(10));

    store.push_events(11..=12);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(console.events().watermark(), Some(12));

    console.shutdown().await;
    assert_eq!(*console.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn failed_pings_degrade_then_disconnect() {
    let store = Arc::new(FakeStore::new("a"));
    let console = console(&store);
    console.start().await;
    let state = console.connection_state();
    assert_eq!(*state.borrow(), ConnectionState::Connected);

    store.set_unreachable(true);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(*state.borrow(), ConnectionState::Degraded { failures: 1 });
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(*state.borrow(), ConnectionState::Disconnected);

    store.set_unreachable(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(*state.borrow(), ConnectionState::Connected);
    console.shutdown().await;
}
