// firedesk-core: Caching and classification layer between firedesk-store and the consoles (CLI/TUI).

pub mod cache;
pub mod classify;
pub mod console;
pub mod convert;
pub mod detail;
pub mod error;
pub mod model;
pub mod refresh;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{
    AlarmDiffer, AlarmPoll, AlarmSnapshot, Bootstrap, DEFAULT_EVENT_CAPACITY, EventCache,
    EventFilter, EventLog, FilterCounts, ObjectCache, ObjectFilter, ObjectQuery, ObjectView,
    Period, ProcessOutcome,
};
pub use classify::{
    COLOR_GROUPS, ColorGroup, ColorPair, MessageCategory, ObjectStatus, Rgb, RowRule,
    SeverityTable, Theme, ThemeSettings, map_status, row_colors, row_rule, status_label,
};
pub use console::{ConnectionState, Console, ConsoleOptions, ConsoleUpdate};
pub use detail::{ObjectDetails, load_details};
pub use error::CoreError;
pub use refresh::{Refresh, SingleFlight};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Objects
    Contact, ExternalData, Object, ObjectDetail, ObjectId, PowerSource, StatusFlags, TestMessage,
    Zone, ZoneStatus, parse_object_id,
    // Events / alarms
    Alarm, AlarmKind, Event, EventKind, ProcessAction, Processing,
};

// The store layer, so consumers need a single dependency.
pub use firedesk_store as store;
