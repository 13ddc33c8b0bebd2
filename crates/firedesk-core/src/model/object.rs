// ── Monitored objects ──

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classify::status::{ObjectStatus, map_status, status_label};
use crate::error::CoreError;

/// Store-assigned object number. Stable across polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub i64);

impl ObjectId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for ObjectId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed.parse().map_err(|e| CoreError::InvalidIdentifier {
            input: s.to_owned(),
            reason: format!("{e}"),
        })?;
        if value <= 0 {
            return Err(CoreError::InvalidIdentifier {
                input: s.to_owned(),
                reason: "object numbers are positive".into(),
            });
        }
        Ok(Self(value))
    }
}

/// Parse an object number typed by the operator.
pub fn parse_object_id(input: &str) -> Result<ObjectId, CoreError> {
    input.parse()
}

/// Raw per-object state flags as the store reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusFlags {
    pub alarm: i64,
    pub guard: i64,
    pub tech_alarm: i64,
    pub conn: i64,
}

impl StatusFlags {
    pub fn is_armed(&self) -> bool {
        self.guard != 0
    }

    pub fn is_connected(&self) -> bool {
        self.conn != 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSource {
    #[default]
    Mains,
    Battery,
}

impl PowerSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mains => "220В",
            Self::Battery => "АКБ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneStatus {
    Normal,
    Fire,
}

impl ZoneStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "НОРМА",
            Self::Fire => "ПОЖЕЖА",
        }
    }
}

/// A monitored loop within an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub number: i64,
    pub name: String,
    pub sensor_type: String,
    pub status: ZoneStatus,
}

/// A responsible person to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub position: String,
    pub phone: String,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMessage {
    pub time: Option<NaiveDateTime>,
    pub info: String,
    pub details: String,
}

/// Data read from the object's transport databases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalData {
    /// Parsed from the newest test message: `[-61 dBm]`, `GPRS`, `AVD`
    /// or `—`.
    pub signal: String,
    pub last_test: Option<NaiveDateTime>,
    pub last_message: Option<NaiveDateTime>,
    pub test_messages: Vec<TestMessage>,
}

/// Fields only the single-object query provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDetail {
    pub device_type: String,
    pub panel_mark: String,
    pub phone: String,
    pub notes: String,
    pub location: String,
    pub channel: i64,
    pub power: PowerSource,
    pub battery_state: i64,
    pub auto_test_hours: i64,
}

/// A monitored site.
///
/// Recreated wholesale by every list poll; a detail fetch fills
/// [`Object::detail`] without changing identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,
    pub address: String,
    pub contract: String,
    pub sim1: String,
    pub sim2: String,
    pub flags: StatusFlags,
    pub detail: Option<ObjectDetail>,
}

impl Object {
    /// Derived from the flags on every call, never stored.
    pub fn status(&self) -> ObjectStatus {
        map_status(self.flags.alarm, self.flags.tech_alarm, self.flags.conn)
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.flags.alarm, self.flags.tech_alarm, self.flags.conn)
    }

    pub fn phone(&self) -> &str {
        self.detail.as_ref().map_or("", |d| d.phone.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_positive_numbers() {
        assert_eq!(parse_object_id(" 1002 ").unwrap(), ObjectId(1002));
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for bad in ["", "abc", "12x", "-5", "0"] {
            let err = parse_object_id(bad).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidIdentifier { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }
}
