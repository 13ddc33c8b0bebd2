// ── Event log entries ──

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::ObjectId;

/// Semantic kind of a log row, derived from its message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Fire,
    Fault,
    Restore,
    Arm,
    Disarm,
    Offline,
    System,
}

impl EventKind {
    /// Map a message code from the store.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Fire,
            2 | 3 => Self::Fault,
            5 | 9 | 13 | 17 => Self::Restore,
            10 => Self::Arm,
            11 | 14 | 18 => Self::Disarm,
            12 => Self::Offline,
            _ => Self::System,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fire => "ПОЖЕЖА",
            Self::Fault => "НЕСПРАВНІСТЬ",
            Self::Restore => "ВІДНОВЛЕННЯ",
            Self::Arm => "ПОСТАНОВКА",
            Self::Disarm => "ЗНЯТТЯ",
            Self::Offline => "ВТРАТА ЗВ'ЯЗКУ",
            Self::System => "ПОДІЯ",
        }
    }

    pub fn is_critical(self) -> bool {
        matches!(self, Self::Fire | Self::Fault | Self::Offline)
    }
}

/// One row of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned, strictly increasing. The only ordering guarantee.
    pub id: i64,
    pub time: NaiveDateTime,
    pub object_id: ObjectId,
    pub object_name: String,
    pub kind: EventKind,
    /// Raw message code; drives severity colors.
    pub code: i64,
    pub zone: Option<i64>,
    pub details: String,
}

impl Event {
    pub fn is_critical(&self) -> bool {
        self.kind.is_critical()
    }

    /// What the "important only" filter keeps.
    pub fn is_important(&self) -> bool {
        self.is_critical()
    }

    pub fn time_display(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }

    pub fn date_time_display(&self) -> String {
        self.time.format("%d.%m.%Y %H:%M:%S").to_string()
    }
}
