// ── Demo store ──
//
// In-memory LegacyStore with a handful of sample objects, a few active
// alarms and an event log that grows on a fixed script. Backs `--demo`
// and the integration tests; never touches a database.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::error::StoreError;
use crate::provider::{AlarmProvider, DetailProvider, EventProvider, LegacyStore, ObjectProvider};
use crate::rows::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};

/// Minimum spacing between scripted events.
const SCRIPT_STEP: Duration = Duration::from_secs(3);

struct SampleObject {
    number: i64,
    name: &'static str,
    address: &'static str,
    contract: &'static str,
    phone: &'static str,
    sim1: &'static str,
    sim2: &'static str,
    device: &'static str,
    /// (alarm, guard, tech_alarm, conn)
    flags: (i64, i64, i64, i64),
    on_battery: bool,
    test_hours: i64,
    zones: &'static [(i64, &'static str, i64)],
    contacts: &'static [(&'static str, &'static str, &'static str, &'static str)],
}

const OBJECTS: &[SampleObject] = &[
    SampleObject {
        number: 1001,
        name: "ТОВ \"Ромашка\"",
        address: "вул. Шевченка, 15",
        contract: "ПС-2024-001",
        phone: "+380501234567",
        sim1: "+380671111111",
        sim2: "+380672222222",
        device: "Тірас-16П",
        flags: (0, 1, 0, 1),
        on_battery: false,
        test_hours: 24,
        zones: &[(1, "Склад 1 поверх", 1), (2, "Офіс", 1), (3, "Коридор", 2)],
        contacts: &[
            ("Петренко", "Іван", "Директор", "+380501234567"),
            ("Коваленко", "Марія", "Охоронець", "+380671234567"),
        ],
    },
    SampleObject {
        number: 1002,
        name: "Супермаркет \"Продукти\"",
        address: "пр. Перемоги, 100",
        contract: "ПС-2024-002",
        phone: "+380509876543",
        sim1: "+380673333333",
        sim2: "",
        device: "Тірас-8П",
        flags: (1, 1, 0, 1),
        on_battery: false,
        test_hours: 24,
        zones: &[
            (1, "Торговий зал", 1),
            (2, "Склад продуктів", 1),
            (3, "Підсобка", 2),
            (4, "Кабінет директора", 1),
        ],
        contacts: &[
            ("Сидоренко", "Олег", "Директор", "+380509876543"),
            ("Бондаренко", "Анна", "Бухгалтер", "+380679876543"),
        ],
    },
    SampleObject {
        number: 1003,
        name: "Школа №25",
        address: "вул. Лесі Українки, 42",
        contract: "ПС-2024-003",
        phone: "+380442223344",
        sim1: "+380674444444",
        sim2: "+380675555555",
        device: "Тірас-32П",
        flags: (0, 1, 1, 1),
        on_battery: true,
        test_hours: 12,
        zones: &[
            (1, "Спортзал", 2),
            (2, "Їдальня", 1),
            (3, "Актова зала", 1),
            (4, "Бібліотека", 1),
        ],
        contacts: &[
            ("Мельник", "Наталія", "Директор", "+380442223344"),
            ("Кравченко", "Сергій", "Завгосп", "+380674445566"),
        ],
    },
    SampleObject {
        number: 1004,
        name: "Аптека \"Здоров'я\"",
        address: "вул. Хрещатик, 5",
        contract: "ПС-2024-004",
        phone: "+380445556677",
        sim1: "+380676666666",
        sim2: "",
        device: "Тірас-4П",
        flags: (0, 1, 0, 1),
        on_battery: false,
        test_hours: 24,
        zones: &[(1, "Торговий зал", 1), (2, "Склад ліків", 1)],
        contacts: &[("Лисенко", "Тетяна", "Завідуюча", "+380445556677")],
    },
    SampleObject {
        number: 1005,
        name: "Готель \"Центральний\"",
        address: "пл. Незалежності, 1",
        contract: "ПС-2024-005",
        phone: "+380447778899",
        sim1: "+380677777777",
        sim2: "+380678888888",
        device: "Тірас-64П",
        flags: (0, 1, 0, 0),
        on_battery: false,
        test_hours: 6,
        zones: &[(1, "Рецепція", 1), (2, "Ресторан", 2), (3, "Підвал", 2)],
        contacts: &[
            ("Гончаренко", "Віктор", "Директор", "+380447778899"),
            ("Савченко", "Олена", "Адміністратор", "+380679998877"),
        ],
    },
    SampleObject {
        number: 1006,
        name: "Бізнес-центр \"Олімп\"",
        address: "вул. Грушевського, 28",
        contract: "ПС-2024-006",
        phone: "+380441112233",
        sim1: "+380679999999",
        sim2: "+380670000000",
        device: "Тірас-48П",
        flags: (0, 0, 0, 1),
        on_battery: false,
        test_hours: 12,
        zones: &[(1, "Хол", 1), (2, "Офіс 101", 1), (3, "Офіс 102", 1)],
        contacts: &[("Романенко", "Андрій", "Керуючий", "+380441112233")],
    },
    SampleObject {
        number: 1007,
        name: "Дитячий садок \"Веселка\"",
        address: "вул. Квіткова, 10",
        contract: "ПС-2024-007",
        phone: "+380443334455",
        sim1: "+380671234321",
        sim2: "",
        device: "Тірас-16П",
        flags: (0, 1, 0, 1),
        on_battery: false,
        test_hours: 24,
        zones: &[(1, "Група \"Сонечко\"", 1), (2, "Кухня", 2)],
        contacts: &[("Іваненко", "Світлана", "Завідуюча", "+380443334455")],
    },
];

/// (object number, zone, message, code, minutes ago)
const SEED_EVENTS: &[(i64, i64, &str, i64, i64)] = &[
    (1002, 0, "Постановка під охорону", 10, 120),
    (1004, 0, "Зняття з охорони", 11, 90),
    (1007, 0, "Постановка під охорону", 10, 80),
    (1003, 0, "Тест", 6, 70),
    (1001, 2, "Норма шлейфу", 5, 60),
    (1006, 0, "Зняття з охорони", 11, 55),
    (1005, 0, "Втрата зв'язку", 12, 18),
    (1003, 1, "Обрив шлейфу", 2, 8),
    (1004, 0, "Постановка під охорону", 10, 6),
    (1001, 0, "Тест", 6, 5),
    (1002, 2, "Пожежа", 1, 1),
];

/// Events appended one per [`SCRIPT_STEP`], cycling.
const SCRIPT: &[(i64, i64, &str, i64)] = &[
    (1001, 0, "Тест", 6),
    (1008, 0, "Постановка під охорону", 10),
    (1004, 1, "Несправність шлейфу", 2),
    (1004, 1, "Норма шлейфу", 5),
    (1007, 0, "Часткова постановка", 7),
    (1001, 3, "Пожежа", 1),
    (1001, 3, "Відновлення", 9),
];

struct EventLog {
    rows: Vec<EventRow>,
    script_pos: usize,
    last_step: Instant,
}

/// Sample data source for demos and tests.
pub struct DemoStore {
    events: Mutex<EventLog>,
    scripted: bool,
}

impl Default for DemoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoStore {
    /// A store whose event log keeps growing while polled.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A store with a fixed event log, for deterministic output.
    pub fn frozen() -> Self {
        Self::build(false)
    }

    fn build(scripted: bool) -> Self {
        let now = now();
        let rows = SEED_EVENTS
            .iter()
            .enumerate()
            .map(|(i, &(number, zone, message, code, ago))| {
                event_row(
                    i as i64 + 1,
                    now - chrono::Duration::minutes(ago),
                    number,
                    zone,
                    message,
                    code,
                )
            })
            .collect();
        Self {
            events: Mutex::new(EventLog {
                rows,
                script_pos: 0,
                last_step: Instant::now(),
            }),
            scripted,
        }
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut EventLog) -> T) -> Result<T, StoreError> {
        let mut log = self.events.lock().map_err(|_| StoreError::Unavailable)?;
        if self.scripted && log.last_step.elapsed() >= SCRIPT_STEP {
            let (number, zone, message, code) = SCRIPT[log.script_pos % SCRIPT.len()];
            let id = log.rows.last().map_or(1, |r| r.id + 1);
            log.rows.push(event_row(id, now(), number, zone, message, code));
            log.script_pos += 1;
            log.last_step = Instant::now();
        }
        Ok(f(&mut log))
    }

    fn find(number: i64) -> Result<&'static SampleObject, StoreError> {
        OBJECTS
            .iter()
            .find(|o| o.number == number)
            .ok_or(StoreError::NotFound {
                entity: "object",
                id: number,
            })
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn text(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

fn object_name(number: i64) -> Option<String> {
    OBJECTS
        .iter()
        .find(|o| o.number == number)
        .map(|o| o.name.to_owned())
        .or_else(|| Some(format!("Об'єкт {number}")))
}

fn event_row(
    id: i64,
    time: NaiveDateTime,
    number: i64,
    zone: i64,
    message: &str,
    code: i64,
) -> EventRow {
    EventRow {
        id,
        time: Some(time),
        short_name: object_name(number),
        object_number: Some(number),
        zone: Some(zone),
        message: text(message),
        info: None,
        code: Some(code),
        channel: Some(1),
    }
}

fn object_row(o: &SampleObject) -> ObjectRow {
    let (alarm, guard, tech, conn) = o.flags;
    ObjectRow {
        uin: o.number * 10,
        number: o.number,
        full_name: text(o.name),
        short_name: text(o.name),
        address: text(o.address),
        contract: text(o.contract),
        gsm_phone: text(o.sim1),
        gsm_phone2: text(o.sim2),
        alarm_state: Some(alarm),
        guard_state: Some(guard),
        tech_alarm_state: Some(tech),
        conn_state: Some(conn),
    }
}

#[async_trait]
impl ObjectProvider for DemoStore {
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, StoreError> {
        Ok(OBJECTS.iter().map(object_row).collect())
    }

    async fn object_detail(&self, number: i64) -> Result<ObjectDetailRow, StoreError> {
        let o = Self::find(number)?;
        let (alarm, guard, tech, conn) = o.flags;
        Ok(ObjectDetailRow {
            uin: o.number * 10,
            number: o.number,
            full_name: text(o.name),
            short_name: text(o.name),
            address: text(o.address),
            contract: text(o.contract),
            phones: text(o.phone),
            notes: None,
            reserve_text: None,
            gsm_phone: text(o.sim1),
            gsm_phone2: text(o.sim2),
            location: None,
            object_type: Some("Пожежна сигналізація".to_owned()),
            alarm_state: Some(alarm),
            guard_state: Some(guard),
            tech_alarm_state: Some(tech),
            conn_state: Some(conn),
            battery_state: Some(i64::from(o.on_battery)),
            test_control: Some(1),
            test_time: Some(o.test_hours * 60),
            power_fault: Some(i64::from(o.on_battery)),
            channel: Some(1),
            panel_mark: text(o.device),
        })
    }
}

#[async_trait]
impl DetailProvider for DemoStore {
    async fn object_zones(&self, number: i64) -> Result<Vec<ZoneRow>, StoreError> {
        let o = Self::find(number)?;
        let (alarm, _, tech, _) = o.flags;
        Ok(o.zones
            .iter()
            .map(|&(zone, name, kind)| ZoneRow {
                id: o.number * 100 + zone,
                number: Some(zone),
                description: text(name),
                zone_type: Some(kind),
                // First zone carries the object's alarm bits.
                alarm_state: Some(if zone == 1 { alarm } else { 0 }),
                tech_alarm_state: Some(if zone == 1 { tech } else { 0 }),
            })
            .collect())
    }

    async fn object_contacts(&self, number: i64) -> Result<Vec<ContactRow>, StoreError> {
        let o = Self::find(number)?;
        Ok(o.contacts
            .iter()
            .enumerate()
            .map(|(i, &(surname, name, position, phone))| ContactRow {
                id: o.number * 100 + i as i64,
                surname: text(surname),
                name: text(name),
                second_name: None,
                address: None,
                phones: text(phone),
                position: text(position),
                order: Some(i as i64 + 1),
            })
            .collect())
    }

    async fn test_messages(&self, number: i64) -> Result<Vec<TestMessageRow>, StoreError> {
        let o = Self::find(number)?;
        let now = now();
        Ok((0..3)
            .map(|i| TestMessageRow {
                time: Some(now - chrono::Duration::hours(o.test_hours * i)),
                info: Some("Автоматичний тест".to_owned()),
                text: Some(format!("TEST {}", o.number)),
            })
            .collect())
    }

    async fn test_control(&self, number: i64) -> Result<Option<TestControlRow>, StoreError> {
        let o = Self::find(number)?;
        let now = now();
        Ok(Some(TestControlRow {
            conn_state: Some(o.flags.3),
            last_test: Some(now - chrono::Duration::minutes(37)),
            last_message: Some(now - chrono::Duration::minutes(4)),
        }))
    }
}

#[async_trait]
impl EventProvider for DemoStore {
    async fn last_event_id(&self) -> Result<i64, StoreError> {
        self.with_log(|log| log.rows.last().map_or(0, |r| r.id))
    }

    async fn events_since(&self, last_id: i64, limit: usize) -> Result<Vec<EventRow>, StoreError> {
        self.with_log(|log| {
            log.rows
                .iter()
                .filter(|r| r.id > last_id)
                .take(limit)
                .cloned()
                .collect()
        })
    }

    async fn object_events(&self, number: i64) -> Result<Vec<EventRow>, StoreError> {
        self.with_log(|log| {
            log.rows
                .iter()
                .rev()
                .filter(|r| r.object_number == Some(number))
                .take(500)
                .cloned()
                .collect()
        })
    }
}

#[async_trait]
impl AlarmProvider for DemoStore {
    async fn active_alarms(&self) -> Result<Vec<AlarmRow>, StoreError> {
        let now = now();
        let alarm = |number: i64, zone: i64, message: &str, code: i64, ago: i64| {
            let o = OBJECTS.iter().find(|o| o.number == number);
            AlarmRow {
                time: Some(now - chrono::Duration::minutes(ago)),
                object_number: Some(number),
                short_name: o.map(|o| o.name.to_owned()),
                address: o.map(|o| o.address.to_owned()),
                zone: Some(zone),
                info: None,
                message: text(message),
                code: Some(code),
            }
        };
        Ok(vec![
            alarm(1002, 2, "Пожежа", 1, 2),
            alarm(1003, 1, "Обрив шлейфу", 2, 15),
            alarm(1005, 0, "Втрата зв'язку", 12, 30),
        ])
    }
}

#[async_trait]
impl LegacyStore for DemoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "demo".to_owned()
    }
}
