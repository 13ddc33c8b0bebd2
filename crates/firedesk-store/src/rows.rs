// ── Raw store rows ──
//
// One struct per query shape. Columns that the database may return as
// NULL stay `Option`; mapping to domain types happens in firedesk-core.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One row of the full object list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRow {
    pub uin: i64,
    pub number: i64,
    pub full_name: Option<String>,
    pub short_name: Option<String>,
    pub address: Option<String>,
    pub contract: Option<String>,
    pub gsm_phone: Option<String>,
    pub gsm_phone2: Option<String>,
    pub alarm_state: Option<i64>,
    pub guard_state: Option<i64>,
    pub tech_alarm_state: Option<i64>,
    pub conn_state: Option<i64>,
}

/// The wider single-object row behind the detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDetailRow {
    pub uin: i64,
    pub number: i64,
    pub full_name: Option<String>,
    pub short_name: Option<String>,
    pub address: Option<String>,
    pub contract: Option<String>,
    pub phones: Option<String>,
    pub notes: Option<String>,
    pub reserve_text: Option<String>,
    pub gsm_phone: Option<String>,
    pub gsm_phone2: Option<String>,
    pub location: Option<String>,
    pub object_type: Option<String>,
    pub alarm_state: Option<i64>,
    pub guard_state: Option<i64>,
    pub tech_alarm_state: Option<i64>,
    pub conn_state: Option<i64>,
    pub battery_state: Option<i64>,
    pub test_control: Option<i64>,
    pub test_time: Option<i64>,
    pub power_fault: Option<i64>,
    pub channel: Option<i64>,
    pub panel_mark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRow {
    pub id: i64,
    pub number: Option<i64>,
    pub description: Option<String>,
    pub zone_type: Option<i64>,
    pub alarm_state: Option<i64>,
    pub tech_alarm_state: Option<i64>,
}

/// A responsible person attached to an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: i64,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub second_name: Option<String>,
    pub address: Option<String>,
    pub phones: Option<String>,
    pub position: Option<String>,
    pub order: Option<i64>,
}

/// One currently active alarm. The store query already filters to active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRow {
    pub time: Option<NaiveDateTime>,
    pub object_number: Option<i64>,
    pub short_name: Option<String>,
    pub address: Option<String>,
    pub zone: Option<i64>,
    pub info: Option<String>,
    pub message: Option<String>,
    pub code: Option<i64>,
}

/// One row of the append-only event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: i64,
    pub time: Option<NaiveDateTime>,
    pub short_name: Option<String>,
    pub object_number: Option<i64>,
    pub zone: Option<i64>,
    pub message: Option<String>,
    pub info: Option<String>,
    pub code: Option<i64>,
    pub channel: Option<i64>,
}

/// A test message read from the per-subsystem transport database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestMessageRow {
    pub time: Option<NaiveDateTime>,
    pub info: Option<String>,
    pub text: Option<String>,
}

/// Test-control timestamps read from the per-subsystem main database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestControlRow {
    pub conn_state: Option<i64>,
    pub last_test: Option<NaiveDateTime>,
    pub last_message: Option<NaiveDateTime>,
}
