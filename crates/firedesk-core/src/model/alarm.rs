// ── Active alarms ──

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use super::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    Fire,
    Fault,
}

impl AlarmKind {
    /// Category code 1 is fire; everything else the store reports as
    /// active is treated as a fault.
    pub fn from_code(code: i64) -> Self {
        if code == 1 { Self::Fire } else { Self::Fault }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fire => "ПОЖЕЖА",
            Self::Fault => "НЕСПРАВНІСТЬ",
        }
    }
}

/// What the dispatcher did about an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr)]
pub enum ProcessAction {
    #[strum(serialize = "Виклик пожежників")]
    FireBrigade,
    #[strum(serialize = "Виклик ГШР")]
    RapidResponse,
    #[strum(serialize = "Помилкова тривога")]
    FalseAlarm,
    #[strum(serialize = "Технічна несправність")]
    TechnicalFault,
    #[strum(serialize = "Контрольна перевірка")]
    Drill,
    #[strum(serialize = "Інше")]
    Other,
}

impl ProcessAction {
    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// Local processing mark. Never written back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processing {
    pub by: String,
    pub action: ProcessAction,
    pub note: String,
    pub at: NaiveDateTime,
}

/// A currently active alarm condition, recomputed on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    /// Borrowed from the owning object; one active alarm per object.
    pub id: i64,
    pub object_id: ObjectId,
    pub object_name: String,
    pub address: String,
    pub time: NaiveDateTime,
    pub kind: AlarmKind,
    pub code: i64,
    pub zone: Option<i64>,
    pub details: String,
    pub processing: Option<Processing>,
}

impl Alarm {
    pub fn is_processed(&self) -> bool {
        self.processing.is_some()
    }

    pub fn is_unprocessed_fire(&self) -> bool {
        self.kind == AlarmKind::Fire && !self.is_processed()
    }

    pub fn time_display(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn six_processing_actions_with_labels() {
        let labels: Vec<&str> = ProcessAction::iter().map(ProcessAction::label).collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], "Виклик пожежників");
        assert_eq!(labels[5], "Інше");
    }
}
