// firedesk-store: read-only access to the legacy alarm-monitoring database.

pub mod demo;
pub mod error;
pub mod firebird;
pub mod provider;
pub mod rows;

// ── Primary re-exports ──────────────────────────────────────────────
pub use demo::DemoStore;
pub use error::StoreError;
pub use firebird::{FirebirdConfig, FirebirdStore, QueryTimeouts};
pub use provider::{
    AlarmProvider, DetailProvider, EVENT_BATCH_LIMIT, EventProvider, LegacyStore, ObjectProvider,
};
pub use rows::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};
