// ── Row-to-domain conversions ──
//
// Bridges raw `firedesk_store` rows into `firedesk_core::model` types.
// NULL text becomes empty, NULL flags become their quiet value (a NULL
// connection flag counts as connected), NULL times become the poll time.

use chrono::{Local, NaiveDateTime};

use firedesk_store::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};

use crate::model::{
    Alarm, AlarmKind, Contact, Event, EventKind, ExternalData, Object, ObjectDetail, ObjectId,
    PowerSource, StatusFlags, TestMessage, Zone, ZoneStatus,
};

// ── Helpers ────────────────────────────────────────────────────────

fn text(value: Option<String>) -> String {
    value.map(|s| s.trim().to_owned()).unwrap_or_default()
}

fn time_or_now(value: Option<NaiveDateTime>) -> NaiveDateTime {
    value.unwrap_or_else(|| Local::now().naive_local())
}

/// Message text with the info field appended in parentheses.
pub fn compose_details(message: &str, info: &str) -> String {
    match (message.is_empty(), info.is_empty()) {
        (_, true) => message.to_owned(),
        (true, false) => info.to_owned(),
        (false, false) => format!("{message} ({info})"),
    }
}

fn flags(alarm: Option<i64>, guard: Option<i64>, tech: Option<i64>, conn: Option<i64>) -> StatusFlags {
    StatusFlags {
        alarm: alarm.unwrap_or(0),
        guard: guard.unwrap_or(0),
        tech_alarm: tech.unwrap_or(0),
        conn: conn.unwrap_or(1),
    }
}

fn display_name(short: Option<String>, full: Option<String>) -> String {
    let short = text(short);
    if short.is_empty() { text(full) } else { short }
}

// ── Objects ────────────────────────────────────────────────────────

impl From<ObjectRow> for Object {
    fn from(row: ObjectRow) -> Self {
        Self {
            id: ObjectId(row.number),
            name: display_name(row.short_name, row.full_name),
            address: text(row.address),
            contract: text(row.contract),
            sim1: text(row.gsm_phone),
            sim2: text(row.gsm_phone2),
            flags: flags(
                row.alarm_state,
                row.guard_state,
                row.tech_alarm_state,
                row.conn_state,
            ),
            detail: None,
        }
    }
}

impl From<ObjectDetailRow> for Object {
    fn from(row: ObjectDetailRow) -> Self {
        let power_fault = row.power_fault.unwrap_or(0);
        let detail = ObjectDetail {
            device_type: text(row.object_type),
            panel_mark: text(row.panel_mark),
            phone: text(row.phones),
            notes: [text(row.notes), text(row.reserve_text)]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            location: text(row.location),
            channel: row.channel.unwrap_or(0),
            power: if power_fault > 0 {
                PowerSource::Battery
            } else {
                PowerSource::Mains
            },
            battery_state: row.battery_state.unwrap_or(0),
            auto_test_hours: row.test_time.unwrap_or(0) / 60,
        };
        Self {
            id: ObjectId(row.number),
            name: display_name(row.short_name, row.full_name),
            address: text(row.address),
            contract: text(row.contract),
            sim1: text(row.gsm_phone),
            sim2: text(row.gsm_phone2),
            flags: flags(
                row.alarm_state,
                row.guard_state,
                row.tech_alarm_state,
                row.conn_state,
            ),
            detail: Some(detail),
        }
    }
}

/// Display text for a zone sensor type code.
pub fn sensor_type(code: Option<i64>) -> &'static str {
    match code {
        None => "Невідомо",
        Some(1) => "Димовий",
        Some(2) => "Тепловий",
        Some(_) => "Ручний/Інше",
    }
}

impl From<ZoneRow> for Zone {
    fn from(row: ZoneRow) -> Self {
        Self {
            number: row.number.unwrap_or(0),
            name: text(row.description),
            sensor_type: sensor_type(row.zone_type).to_owned(),
            status: match row.alarm_state {
                None | Some(0) => ZoneStatus::Normal,
                Some(_) => ZoneStatus::Fire,
            },
        }
    }
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        let name = [text(row.surname), text(row.name)]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            name,
            position: text(row.position),
            phone: text(row.phones),
            priority: row.order.unwrap_or(0),
        }
    }
}

// ── Events and alarms ──────────────────────────────────────────────

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        let code = row.code.unwrap_or(0);
        let message = text(row.message);
        let info = text(row.info);
        Self {
            id: row.id,
            time: time_or_now(row.time),
            object_id: ObjectId(row.object_number.unwrap_or(0)),
            object_name: text(row.short_name),
            kind: row.code.map_or(EventKind::System, EventKind::from_code),
            code,
            zone: row.zone.filter(|z| *z > 0),
            details: compose_details(&message, &info),
        }
    }
}

impl From<AlarmRow> for Alarm {
    fn from(row: AlarmRow) -> Self {
        let number = row.object_number.unwrap_or(0);
        let code = row.code.unwrap_or(0);
        let message = text(row.message);
        let info = text(row.info);
        Self {
            id: number,
            object_id: ObjectId(number),
            object_name: text(row.short_name),
            address: text(row.address),
            time: time_or_now(row.time),
            kind: AlarmKind::from_code(code),
            code,
            zone: row.zone.filter(|z| *z > 0),
            details: compose_details(&message, &info),
            processing: None,
        }
    }
}

// ── External test data ─────────────────────────────────────────────

impl From<TestMessageRow> for TestMessage {
    fn from(row: TestMessageRow) -> Self {
        Self {
            time: row.time,
            info: text(row.info),
            details: text(row.text),
        }
    }
}

/// Signal indicator derived from the newest test message's info text.
pub fn parse_signal(messages: &[TestMessage]) -> String {
    let Some(newest) = messages.first() else {
        return "—".to_owned();
    };
    let info = newest.info.as_str();
    let upper = info.to_uppercase();

    if info.contains("dBm") {
        if let (Some(start), Some(end)) = (info.rfind('['), info.rfind(']')) {
            if let Some(bracketed) = info.get(start..=end).filter(|_| end > start) {
                return bracketed.to_owned();
            }
        }
        info.to_owned()
    } else if upper.contains("GPRS") {
        "GPRS".to_owned()
    } else if info.is_empty() || upper.contains("AVD") {
        "AVD".to_owned()
    } else {
        info.to_owned()
    }
}

pub fn external_data(messages: Vec<TestMessageRow>, control: Option<TestControlRow>) -> ExternalData {
    let test_messages: Vec<TestMessage> = messages.into_iter().map(TestMessage::from).collect();
    let (last_test, last_message) = control.map_or((None, None), |c| (c.last_test, c.last_message));
    ExternalData {
        signal: parse_signal(&test_messages),
        last_test,
        last_message,
        test_messages,
    }
}
