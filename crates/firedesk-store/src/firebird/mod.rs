// ── Firebird store ──
//
// LegacyStore over the monitoring service's Firebird database. Queries
// run on a small pool of blocking worker threads; every call carries its
// own deadline so a stalled server degrades into timeouts, not hangs.

mod sql;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rsfbclient::Charset;
use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::provider::{AlarmProvider, DetailProvider, EventProvider, LegacyStore, ObjectProvider};
use crate::rows::{
    AlarmRow, ContactRow, EventRow, ObjectDetailRow, ObjectRow, TestControlRow, TestMessageRow,
    ZoneRow,
};

use self::worker::{ConnectTarget, Pool};

/// Subsystem type whose transport databases use the AVD file names.
const SUBSYSTEM_AVD: i64 = 4;

/// Per-query deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    pub connect: Duration,
    pub ping: Duration,
    pub objects: Duration,
    pub object_detail: Duration,
    pub details: Duration,
    pub events: Duration,
    pub object_events: Duration,
    pub alarms: Duration,
    pub external: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            ping: Duration::from_secs(5),
            objects: Duration::from_secs(5),
            object_detail: Duration::from_secs(2),
            details: Duration::from_secs(2),
            events: Duration::from_secs(5),
            object_events: Duration::from_secs(3),
            alarms: Duration::from_secs(3),
            external: Duration::from_secs(3),
        }
    }
}

/// Connection parameters for [`FirebirdStore::open`].
#[derive(Debug, Clone)]
pub struct FirebirdConfig {
    pub host: String,
    pub port: u16,
    /// Database file path as the server sees it.
    pub path: String,
    pub user: String,
    pub password: SecretString,
    /// Firebird character set name, e.g. `WIN1251`.
    pub charset: String,
    pub pool_size: usize,
    pub timeouts: QueryTimeouts,
}

/// Map a Firebird character set name onto the client's decoder.
fn charset_by_name(name: &str) -> Charset {
    match name.trim().to_ascii_uppercase().as_str() {
        "WIN1251" | "WIN_1251" | "CP1251" => rsfbclient::charset::WIN_1251,
        "UTF8" | "UTF-8" | "UNICODE_FSS" => rsfbclient::charset::UTF_8,
        other => {
            warn!(charset = other, "unsupported charset, falling back to UTF8");
            rsfbclient::charset::UTF_8
        }
    }
}

/// Path of a per-subsystem database file next to the subsystem directory.
fn external_path(directory: &str, file: &str) -> String {
    format!("{}{file}", directory.trim()).replace('\\', "/")
}

/// Read-only Firebird implementation of [`LegacyStore`].
pub struct FirebirdStore {
    pool: Pool,
    target: Arc<ConnectTarget>,
    timeouts: QueryTimeouts,
    label: String,
}

impl FirebirdStore {
    /// Connect every pooled worker. Fails without side effects if the
    /// server is unreachable or rejects the credentials.
    pub async fn open(config: FirebirdConfig) -> Result<Self, StoreError> {
        let label = format!("{}:{}/{}", config.host, config.port, config.path);
        let target = Arc::new(ConnectTarget {
            host: config.host,
            port: config.port,
            user: config.user,
            password: config.password,
            charset: charset_by_name(&config.charset),
        });

        debug!(db = %label, pool_size = config.pool_size, "opening database pool");
        let pool = Pool::open(
            Arc::clone(&target),
            &config.path,
            config.pool_size,
            config.timeouts.connect,
        )
        .await?;
        info!(db = %label, "database pool ready");

        Ok(Self {
            pool,
            target,
            timeouts: config.timeouts,
            label,
        })
    }

    /// Directory and subsystem type of the object's transport databases.
    async fn external_location(&self, number: i64) -> Result<Option<(String, i64)>, StoreError> {
        let rows = self
            .pool
            .call("external_location", self.timeouts.details, move |s| {
                s.rows(sql::EXTERNAL_PATH, Some(number))
            })
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let directory: Option<String> = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
        let subsystem: Option<i64> = row.get(1).map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(directory.map(|d| (d, subsystem.unwrap_or_default())))
    }
}

#[async_trait]
impl ObjectProvider for FirebirdStore {
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, StoreError> {
        let objects = self
            .pool
            .call("list_objects", self.timeouts.objects, |s| {
                sql::decode_all(&s.rows(sql::OBJECTS, None)?, sql::object_row)
            })
            .await?;
        debug!(count = objects.len(), "object list loaded");
        Ok(objects)
    }

    async fn object_detail(&self, number: i64) -> Result<ObjectDetailRow, StoreError> {
        let rows = self
            .pool
            .call("object_detail", self.timeouts.object_detail, move |s| {
                sql::decode_all(&s.rows(sql::OBJECT_DETAIL, Some(number))?, sql::object_detail_row)
            })
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "object",
            id: number,
        })
    }
}

#[async_trait]
impl DetailProvider for FirebirdStore {
    async fn object_zones(&self, number: i64) -> Result<Vec<ZoneRow>, StoreError> {
        self.pool
            .call("object_zones", self.timeouts.details, move |s| {
                sql::decode_all(&s.rows(sql::ZONES, Some(number))?, sql::zone_row)
            })
            .await
    }

    async fn object_contacts(&self, number: i64) -> Result<Vec<ContactRow>, StoreError> {
        self.pool
            .call("object_contacts", self.timeouts.details, move |s| {
                sql::decode_all(&s.rows(sql::CONTACTS, Some(number))?, sql::contact_row)
            })
            .await
    }

    async fn test_messages(&self, number: i64) -> Result<Vec<TestMessageRow>, StoreError> {
        let Some((directory, subsystem)) = self.external_location(number).await? else {
            return Ok(Vec::new());
        };
        let file = if subsystem == SUBSYSTEM_AVD {
            "AVD_TRP.FDB"
        } else {
            "GPRS_TRP.FDB"
        };
        let rows = self
            .target
            .query_once(
                "test_messages",
                external_path(&directory, file),
                sql::TEST_MESSAGES,
                number,
                self.timeouts.external,
            )
            .await?;
        sql::decode_all(&rows, sql::test_message_row).map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn test_control(&self, number: i64) -> Result<Option<TestControlRow>, StoreError> {
        let Some((directory, subsystem)) = self.external_location(number).await? else {
            return Ok(None);
        };
        let file = if subsystem == SUBSYSTEM_AVD {
            "AVD_MAIN.FDB"
        } else {
            "GPRS_TC.FDB"
        };
        let rows = self
            .target
            .query_once(
                "test_control",
                external_path(&directory, file),
                sql::TEST_CONTROL,
                number,
                self.timeouts.external,
            )
            .await?;
        let decoded = sql::decode_all(&rows, sql::test_control_row)
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(decoded.into_iter().next())
    }
}

#[async_trait]
impl EventProvider for FirebirdStore {
    async fn last_event_id(&self) -> Result<i64, StoreError> {
        let rows = self
            .pool
            .call("last_event_id", self.timeouts.events, |s| {
                s.rows(sql::LAST_EVENT_ID, None)
            })
            .await?;
        match rows.first() {
            Some(row) => row.get(0).map_err(|e| StoreError::Query(e.to_string())),
            None => Ok(0),
        }
    }

    async fn events_since(&self, last_id: i64, limit: usize) -> Result<Vec<EventRow>, StoreError> {
        let statement = sql::events_since(limit);
        let events = self
            .pool
            .call("events_since", self.timeouts.events, move |s| {
                sql::decode_all(&s.rows(&statement, Some(last_id))?, sql::event_row)
            })
            .await?;
        debug!(last_id, count = events.len(), "incremental events fetched");
        Ok(events)
    }

    async fn object_events(&self, number: i64) -> Result<Vec<EventRow>, StoreError> {
        self.pool
            .call("object_events", self.timeouts.object_events, move |s| {
                sql::decode_all(&s.rows(sql::OBJECT_EVENTS, Some(number))?, sql::event_row)
            })
            .await
    }
}

#[async_trait]
impl AlarmProvider for FirebirdStore {
    async fn active_alarms(&self) -> Result<Vec<AlarmRow>, StoreError> {
        self.pool
            .call("active_alarms", self.timeouts.alarms, |s| {
                sql::decode_all(&s.rows(sql::ACTIVE_ALARMS, None)?, sql::alarm_row)
            })
            .await
    }
}

#[async_trait]
impl LegacyStore for FirebirdStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.pool
            .call("ping", self.timeouts.ping, |s| s.rows(sql::PING, None).map(drop))
            .await
            .map_err(|e| match e {
                StoreError::Query(msg) => StoreError::Connection(msg),
                other => other,
            })
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
