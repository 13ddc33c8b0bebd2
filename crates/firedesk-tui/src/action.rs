//! Everything that can change TUI state flows through [`Action`].

use std::sync::Arc;

use firedesk_core::{
    Alarm, AlarmSnapshot, ConnectionState, Event, Object, ObjectDetails, ObjectId, ProcessAction,
};

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Layout ──
    FocusNext,
    FocusPrev,
    ToggleHelp,
    /// Esc outside of search: close the topmost overlay.
    CloseOverlay,

    // ── Object list ──
    OpenSearch,
    SearchInput(String),
    /// Close the search bar, keeping the query.
    SearchSubmit,
    /// Close the search bar and clear the query.
    CloseSearch,
    CycleObjectFilter,
    /// Cursor moved in the object list; drives "current object only".
    ObjectHighlighted(Option<ObjectId>),
    /// Load and open the detail view.
    SelectObject(ObjectId),

    // ── Event log ──
    ToggleImportant,
    ToggleCurrentObject,
    CyclePeriod,

    // ── Alarms ──
    OpenProcess(Arc<Alarm>),
    ProcessAlarm {
        alarm_id: i64,
        action: ProcessAction,
        note: String,
    },

    // ── Console ──
    ToggleTheme,
    RefreshNow,
    /// Re-read the config and switch to a freshly opened database.
    Reconnect,

    // ── Data from the console ──
    ObjectsUpdated(Arc<Vec<Arc<Object>>>),
    AlarmsUpdated(AlarmSnapshot),
    /// Full newest-first event list after a merge.
    EventsUpdated(Arc<Vec<Arc<Event>>>),
    EventsReset,
    DetailsLoaded(Arc<ObjectDetails>),
    NewFireAlarm(Arc<Alarm>),
    Connection(ConnectionState),

    // ── Notifications ──
    Notify(Notification),
    DismissNotification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }

    /// How long the toast stays up. Errors, fire alarms included, linger.
    pub fn lifetime(&self) -> std::time::Duration {
        match self.level {
            NotificationLevel::Error => std::time::Duration::from_secs(15),
            NotificationLevel::Warning => std::time::Duration::from_secs(6),
            NotificationLevel::Info | NotificationLevel::Success => std::time::Duration::from_secs(3),
        }
    }
}
