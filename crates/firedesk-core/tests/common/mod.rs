// Scripted in-memory store shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Notify;

use firedesk_core::store::{
    AlarmProvider, AlarmRow, ContactRow, DetailProvider, EventProvider, EventRow, LegacyStore,
    ObjectDetailRow, ObjectProvider, ObjectRow, StoreError, TestControlRow, TestMessageRow, ZoneRow,
};

pub fn at(minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(10, minute % 60, 0)
        .unwrap()
}

pub fn event(id: i64) -> EventRow {
    EventRow {
        id,
        time: Some(at(0)),
        short_name: Some(format!("Об'єкт {}", id % 7)),
        object_number: Some(1000 + id % 7),
        code: Some(6),
        message: Some("Тест".into()),
        ..EventRow::default()
    }
}

pub fn fire_alarm(object: i64) -> AlarmRow {
    AlarmRow {
        time: Some(at(1)),
        object_number: Some(object),
        short_name: Some(format!("Об'єкт {object}")),
        code: Some(1),
        message: Some("Пожежа".into()),
        ..AlarmRow::default()
    }
}

pub fn fault_alarm(object: i64) -> AlarmRow {
    AlarmRow {
        code: Some(2),
        message: Some("Несправність шлейфу".into()),
        ..fire_alarm(object)
    }
}

pub fn object(number: i64) -> ObjectRow {
    ObjectRow {
        uin: number,
        number,
        short_name: Some(format!("Об'єкт {number}")),
        guard_state: Some(1),
        conn_state: Some(1),
        ..ObjectRow::default()
    }
}

/// A store whose contents, failures and latency the test controls.
pub struct FakeStore {
    name: &'static str,
    pub objects: Mutex<Vec<ObjectRow>>,
    pub events: Mutex<Vec<EventRow>>,
    pub alarms: Mutex<Vec<AlarmRow>>,
    fail: AtomicBool,
    ping_fails: AtomicBool,
    gated: AtomicBool,
    gate: Notify,
    calls: Mutex<HashMap<&'static str, usize>>,
    since: Mutex<Vec<i64>>,
}

impl FakeStore {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            objects: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            alarms: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            ping_fails: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Notify::new(),
            calls: Mutex::new(HashMap::new()),
            since: Mutex::new(Vec::new()),
        }
    }

    pub fn push_events(&self, ids: impl IntoIterator<Item = i64>) {
        self.events.lock().unwrap().extend(ids.into_iter().map(event));
    }

    pub fn set_alarms(&self, objects: &[i64]) {
        *self.alarms.lock().unwrap() = objects.iter().copied().map(fire_alarm).collect();
    }

    /// Replace the active set with exact rows, in store order.
    pub fn set_alarm_rows(&self, rows: Vec<AlarmRow>) {
        *self.alarms.lock().unwrap() = rows;
    }

    pub fn set_objects(&self, numbers: &[i64]) {
        *self.objects.lock().unwrap() = numbers.iter().copied().map(object).collect();
    }

    /// Every query fails with a connection error until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, down: bool) {
        self.ping_fails.store(down, Ordering::SeqCst);
    }

    /// Queries block until [`release`](Self::release).
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.notify_waiters();
        self.gate.notify_one();
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Watermarks passed to `events_since`, in call order.
    pub fn since_args(&self) -> Vec<i64> {
        self.since.lock().unwrap().clone()
    }

    async fn enter(&self, op: &'static str) -> Result<(), StoreError> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(format!("{} is down", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectProvider for FakeStore {
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, StoreError> {
        self.enter("list_objects").await?;
        Ok(self.objects.lock().unwrap().clone())
    }

    async fn object_detail(&self, number: i64) -> Result<ObjectDetailRow, StoreError> {
        self.enter("object_detail").await?;
        let objects = self.objects.lock().unwrap();
        let row = objects
            .iter()
            .find(|o| o.number == number)
            .ok_or(StoreError::NotFound {
                entity: "object",
                id: number,
            })?;
        Ok(ObjectDetailRow {
            uin: row.uin,
            number: row.number,
            short_name: row.short_name.clone(),
            guard_state: row.guard_state,
            conn_state: row.conn_state,
            ..ObjectDetailRow::default()
        })
    }
}

#[async_trait]
impl DetailProvider for FakeStore {
    async fn object_zones(&self, _number: i64) -> Result<Vec<ZoneRow>, StoreError> {
        self.enter("object_zones").await?;
        Ok(Vec::new())
    }

    async fn object_contacts(&self, _number: i64) -> Result<Vec<ContactRow>, StoreError> {
        self.enter("object_contacts").await?;
        Ok(Vec::new())
    }

    async fn test_messages(&self, _number: i64) -> Result<Vec<TestMessageRow>, StoreError> {
        self.enter("test_messages").await?;
        Ok(Vec::new())
    }

    async fn test_control(&self, _number: i64) -> Result<Option<TestControlRow>, StoreError> {
        self.enter("test_control").await?;
        Ok(None)
    }
}

#[async_trait]
impl EventProvider for FakeStore {
    async fn last_event_id(&self) -> Result<i64, StoreError> {
        self.enter("last_event_id").await?;
        Ok(self.events.lock().unwrap().iter().map(|e| e.id).max().unwrap_or(0))
    }

    async fn events_since(&self, last_id: i64, limit: usize) -> Result<Vec<EventRow>, StoreError> {
        self.since.lock().unwrap().push(last_id);
        self.enter("events_since").await?;
        let mut rows: Vec<EventRow> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.id > last_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn object_events(&self, number: i64) -> Result<Vec<EventRow>, StoreError> {
        self.enter("object_events").await?;
        let mut rows: Vec<EventRow> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.object_number == Some(number))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }
}

#[async_trait]
impl AlarmProvider for FakeStore {
    async fn active_alarms(&self) -> Result<Vec<AlarmRow>, StoreError> {
        self.enter("active_alarms").await?;
        Ok(self.alarms.lock().unwrap().clone())
    }
}

#[async_trait]
impl LegacyStore for FakeStore {
    async fn ping(&self) -> Result<(), StoreError> {
        *self.calls.lock().unwrap().entry("ping").or_default() += 1;
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(format!("{} unreachable", self.name)));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.to_owned()
    }
}
