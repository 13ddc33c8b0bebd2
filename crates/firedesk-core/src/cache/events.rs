// ── Event cache ──
//
// Incremental sync of the append-only event log. The watermark is the
// highest event ID already merged; each poll asks the store only for
// rows above it. The merged list is kept newest-first and bounded.
//
// State lives in a `watch` channel: readers borrow the latest snapshot,
// the single in-flight poll replaces it in one step after the store
// query succeeds, so a failed or cancelled poll never leaves a partial
// merge behind.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tokio::sync::watch;
use tracing::{debug, info};

use firedesk_store::{EVENT_BATCH_LIMIT, EventProvider};

use crate::error::CoreError;
use crate::model::{Event, ObjectId};
use crate::refresh::{Refresh, SingleFlight};

pub const DEFAULT_EVENT_CAPACITY: usize = 2000;

/// Where the watermark starts on the first poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Bootstrap {
    /// Start at the newest existing event; show only what happens next.
    #[default]
    FromLatest,
    /// Start `capacity` IDs back so the cache opens with recent history.
    Backfill,
}

impl FromStr for Bootstrap {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from-latest" | "latest" => Ok(Self::FromLatest),
            "backfill" => Ok(Self::Backfill),
            other => Err(CoreError::Config {
                message: format!("unknown event bootstrap '{other}', expected from-latest or backfill"),
            }),
        }
    }
}

/// Snapshot published to readers.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Strictly descending by ID.
    pub events: Arc<Vec<Arc<Event>>>,
    /// `None` until the first successful poll.
    pub watermark: Option<i64>,
    /// Bumped by [`EventCache::reset`]; stale polls check it before
    /// committing.
    epoch: u64,
}

pub struct EventCache {
    log: watch::Sender<EventLog>,
    capacity: usize,
    bootstrap: Bootstrap,
    flight: SingleFlight,
}

impl EventCache {
    pub fn new(capacity: usize, bootstrap: Bootstrap) -> Self {
        let (log, _) = watch::channel(EventLog::default());
        Self {
            log,
            capacity: capacity.max(1),
            bootstrap,
            flight: SingleFlight::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> EventLog {
        self.log.borrow().clone()
    }

    pub fn events(&self) -> Arc<Vec<Arc<Event>>> {
        Arc::clone(&self.log.borrow().events)
    }

    pub fn watermark(&self) -> Option<i64> {
        self.log.borrow().watermark
    }

    pub fn subscribe(&self) -> watch::Receiver<EventLog> {
        self.log.subscribe()
    }

    /// Forget everything, including the watermark. Used when the store
    /// behind the cache changes, since IDs from two databases are not
    /// comparable.
    pub fn reset(&self) {
        self.log.send_modify(|log| {
            *log = EventLog {
                epoch: log.epoch + 1,
                ..EventLog::default()
            };
        });
        info!("event cache reset");
    }

    /// Fetch and merge events above the watermark.
    ///
    /// Returns the newly merged events (newest first), `Refresh::Skipped`
    /// if another poll is running, or the store error with the cache
    /// left exactly as it was.
    pub async fn poll(
        &self,
        store: &dyn EventProvider,
    ) -> Result<Refresh<Vec<Arc<Event>>>, CoreError> {
        let Some(_guard) = self.flight.try_begin() else {
            debug!("event poll already in flight");
            return Ok(Refresh::Skipped);
        };

        let (watermark, epoch) = {
            let log = self.log.borrow();
            (log.watermark, log.epoch)
        };

        let Some(watermark) = watermark else {
            let start = self.bootstrap_watermark(store).await?;
            self.log.send_if_modified(|log| {
                if log.epoch != epoch || log.watermark.is_some() {
                    return false;
                }
                log.watermark = Some(start);
                true
            });
            info!(watermark = start, bootstrap = %self.bootstrap, "event watermark established");
            return Ok(Refresh::Done(Vec::new()));
        };

        let rows = store.events_since(watermark, EVENT_BATCH_LIMIT).await?;
        let mut batch: Vec<Arc<Event>> = rows
            .into_iter()
            .filter(|row| row.id > watermark)
            .map(|row| Arc::new(Event::from(row)))
            .collect();
        batch.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        batch.dedup_by_key(|e| e.id);

        let Some(newest) = batch.first().map(|e| e.id) else {
            return Ok(Refresh::Done(batch));
        };

        let capacity = self.capacity;
        let committed = self.log.send_if_modified(|log| {
            if log.epoch != epoch || log.watermark != Some(watermark) {
                return false;
            }
            let mut merged = Vec::with_capacity((batch.len() + log.events.len()).min(capacity));
            merged.extend(batch.iter().cloned());
            merged.extend(log.events.iter().cloned());
            merged.truncate(capacity);
            log.events = Arc::new(merged);
            log.watermark = Some(newest.max(watermark));
            true
        });

        if committed {
            debug!(count = batch.len(), watermark = newest, "events merged");
            Ok(Refresh::Done(batch))
        } else {
            debug!("event cache reset during poll, batch dropped");
            Ok(Refresh::Done(Vec::new()))
        }
    }

    async fn bootstrap_watermark(&self, store: &dyn EventProvider) -> Result<i64, CoreError> {
        let last = store.last_event_id().await?;
        Ok(match self.bootstrap {
            Bootstrap::FromLatest => last,
            Bootstrap::Backfill => {
                let back = i64::try_from(self.capacity).unwrap_or(i64::MAX);
                last.saturating_sub(back).max(0)
            }
        })
    }
}

// ── Derived views ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum Period {
    LastHour,
    #[default]
    Today,
    All,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Self::LastHour => "Остання година",
            Self::Today => "Сьогодні",
            Self::All => "Все",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::LastHour => Self::Today,
            Self::Today => Self::All,
            Self::All => Self::LastHour,
        }
    }

    /// Oldest timestamp inside the window, if bounded.
    pub fn cutoff(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Self::LastHour => Some(now - Duration::hours(1)),
            Self::Today => now.date().and_hms_opt(0, 0, 0),
            Self::All => None,
        }
    }
}

/// Read-only filter over the newest-first event list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub period: Period,
    pub important_only: bool,
    pub object: Option<ObjectId>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        (!self.important_only || event.is_important())
            && self.object.is_none_or(|id| event.object_id == id)
    }

    /// Filter `events`, stopping at the first row older than the period
    /// cutoff.
    pub fn apply(&self, events: &[Arc<Event>], now: NaiveDateTime) -> Vec<Arc<Event>> {
        let cutoff = self.period.cutoff(now);
        let mut out = Vec::new();
        for event in events {
            if cutoff.is_some_and(|c| event.time < c) {
                break;
            }
            if self.matches(event) {
                out.push(Arc::clone(event));
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EventKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(id: i64, time: NaiveDateTime, kind: EventKind, object: i64) -> Arc<Event> {
        Arc::new(Event {
            id,
            time,
            object_id: ObjectId(object),
            object_name: String::new(),
            kind,
            code: 0,
            zone: None,
            details: String::new(),
        })
    }

    #[test]
    fn window_filter_stops_at_first_old_row() {
        let now = at(12, 0);
        let events = vec![
            event(5, at(11, 50), EventKind::Fire, 1),
            event(4, at(11, 10), EventKind::Arm, 2),
            event(3, at(10, 30), EventKind::Fire, 1),
            // skewed device clock: in-window time behind an old row
            event(2, at(11, 55), EventKind::Fire, 1),
        ];
        let filter = EventFilter {
            period: Period::LastHour,
            ..EventFilter::default()
        };
        let ids: Vec<i64> = filter.apply(&events, now).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn important_and_object_filters_combine() {
        let now = at(12, 0);
        let events = vec![
            event(4, at(11, 59), EventKind::Fire, 1),
            event(3, at(11, 58), EventKind::Arm, 1),
            event(2, at(11, 57), EventKind::Fault, 2),
            event(1, at(0, 1), EventKind::Offline, 1),
        ];
        let filter = EventFilter {
            period: Period::Today,
            important_only: true,
            object: Some(ObjectId(1)),
        };
        let ids: Vec<i64> = filter.apply(&events, now).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 1]);
    }

    #[test]
    fn bootstrap_parses_config_values() {
        assert_eq!("from-latest".parse::<Bootstrap>().unwrap(), Bootstrap::FromLatest);
        assert_eq!("Backfill".parse::<Bootstrap>().unwrap(), Bootstrap::Backfill);
        assert!("history".parse::<Bootstrap>().is_err());
        assert_eq!(Bootstrap::FromLatest.to_string(), "from-latest");
    }

    #[test]
    fn period_cycle() {
        assert_eq!(Period::LastHour.next(), Period::Today);
        assert_eq!(Period::All.next(), Period::LastHour);
        assert_eq!(Period::All.cutoff(at(1, 0)), None);
        assert_eq!(Period::Today.cutoff(at(9, 30)), Some(at(0, 0)));
    }
}
