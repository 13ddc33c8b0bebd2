// ── Provider traits ──
//
// Narrow, read-only capability sets. The console depends only on these,
// so the Firebird store, the demo store and test fakes are interchangeable.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::rows::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};

/// Upper bound on rows returned by one incremental event fetch.
pub const EVENT_BATCH_LIMIT: usize = 2000;

#[async_trait]
pub trait ObjectProvider: Send + Sync {
    /// Full object snapshot. No pagination, no incremental mode.
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, StoreError>;

    /// Single object by number; [`StoreError::NotFound`] on a miss.
    async fn object_detail(&self, number: i64) -> Result<ObjectDetailRow, StoreError>;
}

#[async_trait]
pub trait DetailProvider: Send + Sync {
    async fn object_zones(&self, number: i64) -> Result<Vec<ZoneRow>, StoreError>;

    async fn object_contacts(&self, number: i64) -> Result<Vec<ContactRow>, StoreError>;

    /// Test messages from the object's transport database, newest first.
    async fn test_messages(&self, number: i64) -> Result<Vec<TestMessageRow>, StoreError>;

    /// Test-control timestamps, if the object has a transport database.
    async fn test_control(&self, number: i64) -> Result<Option<TestControlRow>, StoreError>;
}

#[async_trait]
pub trait EventProvider: Send + Sync {
    /// Highest event ID currently in the log (0 for an empty log).
    async fn last_event_id(&self) -> Result<i64, StoreError>;

    /// Events with `id > last_id`, ascending by ID, at most `limit` rows.
    async fn events_since(&self, last_id: i64, limit: usize) -> Result<Vec<EventRow>, StoreError>;

    /// A bounded recent window of one object's events, newest first.
    async fn object_events(&self, number: i64) -> Result<Vec<EventRow>, StoreError>;
}

#[async_trait]
pub trait AlarmProvider: Send + Sync {
    /// Full snapshot of currently active alarms.
    async fn active_alarms(&self) -> Result<Vec<AlarmRow>, StoreError>;
}

/// Everything the console consumes, plus connection liveness.
#[async_trait]
pub trait LegacyStore: ObjectProvider + DetailProvider + EventProvider + AlarmProvider {
    /// Cheap round trip proving the connection is usable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Human-readable target, safe to log (never contains credentials).
    fn describe(&self) -> String;
}
