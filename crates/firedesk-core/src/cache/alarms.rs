// ── Alarm snapshot differ ──
//
// The store only offers the full active-alarm set. Each poll replaces
// the snapshot wholesale and compares identities with the previous
// successful poll to find alarms that just appeared.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use firedesk_store::AlarmProvider;

use crate::error::CoreError;
use crate::model::{Alarm, ProcessAction, Processing};
use crate::refresh::{Refresh, SingleFlight};

/// Published alarm state.
#[derive(Debug, Clone, Default)]
pub struct AlarmSnapshot {
    /// In store order.
    pub alarms: Arc<Vec<Arc<Alarm>>>,
    pub total: usize,
    /// Unprocessed fire alarms.
    pub fire_count: usize,
}

/// Result of one successful alarm poll.
#[derive(Debug, Clone)]
pub struct AlarmPoll {
    pub snapshot: AlarmSnapshot,
    /// First unprocessed fire alarm absent from the previous poll. At
    /// most one per poll.
    pub newly_appeared: Option<Arc<Alarm>>,
}

/// How an alarm processing request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Marked in this console's memory only. The store still reports
    /// the alarm as active, so other consoles and a restarted one will
    /// see it unprocessed.
    LocalOnly,
}

#[derive(Default)]
struct DiffState {
    known: HashSet<i64>,
    marks: HashMap<i64, Processing>,
    /// Bumped by [`AlarmDiffer::reset`]; a poll started before the
    /// reset must not commit.
    epoch: u64,
}

pub struct AlarmDiffer {
    snapshot: watch::Sender<AlarmSnapshot>,
    state: Mutex<DiffState>,
    flight: SingleFlight,
}

impl Default for AlarmDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmDiffer {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(AlarmSnapshot::default());
        Self {
            snapshot,
            state: Mutex::new(DiffState::default()),
            flight: SingleFlight::new(),
        }
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlarmSnapshot> {
        self.snapshot.subscribe()
    }

    /// Forget the identity set, the local marks and the published
    /// snapshot. Alarm identity is the object number, which means
    /// nothing once the store behind the differ changes.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = DiffState {
            epoch: state.epoch + 1,
            ..DiffState::default()
        };
        self.snapshot.send_replace(AlarmSnapshot::default());
        info!("alarm differ reset");
    }

    /// Fetch the active set, publish it and report the newest fire.
    ///
    /// On a store error nothing changes: the next successful poll is
    /// compared with the last known-good identity set.
    pub async fn poll(&self, store: &dyn AlarmProvider) -> Result<Refresh<AlarmPoll>, CoreError> {
        let Some(_guard) = self.flight.try_begin() else {
            debug!("alarm poll already in flight");
            return Ok(Refresh::Skipped);
        };

        let epoch = self.state.lock().await.epoch;
        let rows = store.active_alarms().await?;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("alarm differ reset during poll, result dropped");
            return Ok(Refresh::Skipped);
        }
        let mut alarms: Vec<Alarm> = rows.into_iter().map(Alarm::from).collect();
        let current: HashSet<i64> = alarms.iter().map(|a| a.id).collect();

        // Marks live only as long as their alarm stays active.
        state.marks.retain(|id, _| current.contains(id));
        for alarm in &mut alarms {
            alarm.processing = state.marks.get(&alarm.id).cloned();
        }

        let alarms: Vec<Arc<Alarm>> = alarms.into_iter().map(Arc::new).collect();
        let newly_appeared = alarms
            .iter()
            .find(|a| !state.known.contains(&a.id) && a.is_unprocessed_fire())
            .cloned();
        state.known = current;

        let snapshot = summarize(alarms);
        self.snapshot.send_replace(snapshot.clone());
        drop(state);

        if let Some(ref alarm) = newly_appeared {
            info!(alarm = alarm.id, object = %alarm.object_name, "new fire alarm");
        }
        debug!(total = snapshot.total, fire = snapshot.fire_count, "alarms refreshed");

        Ok(Refresh::Done(AlarmPoll {
            snapshot,
            newly_appeared,
        }))
    }

    /// Mark an active alarm as handled by this dispatcher.
    ///
    /// The mark is not written to the store; see [`ProcessOutcome`].
    pub async fn process(
        &self,
        alarm_id: i64,
        by: &str,
        action: ProcessAction,
        note: &str,
    ) -> Result<ProcessOutcome, CoreError> {
        let mut state = self.state.lock().await;
        let present = self
            .snapshot
            .borrow()
            .alarms
            .iter()
            .any(|a| a.id == alarm_id);
        if !present {
            return Err(CoreError::NotFound {
                entity: "alarm",
                identifier: alarm_id.to_string(),
            });
        }

        let processing = Processing {
            by: by.to_owned(),
            action,
            note: note.to_owned(),
            at: Local::now().naive_local(),
        };
        state.marks.insert(alarm_id, processing.clone());

        self.snapshot.send_modify(|snap| {
            let alarms: Vec<Arc<Alarm>> = snap
                .alarms
                .iter()
                .map(|a| {
                    if a.id == alarm_id {
                        Arc::new(Alarm {
                            processing: Some(processing.clone()),
                            ..Alarm::clone(a)
                        })
                    } else {
                        Arc::clone(a)
                    }
                })
                .collect();
            *snap = summarize(alarms);
        });

        info!(
            alarm = alarm_id,
            by,
            action = action.label(),
            "alarm processed locally; not written to the store"
        );
        Ok(ProcessOutcome::LocalOnly)
    }
}

fn summarize(alarms: Vec<Arc<Alarm>>) -> AlarmSnapshot {
    AlarmSnapshot {
        total: alarms.len(),
        fire_count: alarms.iter().filter(|a| a.is_unprocessed_fire()).count(),
        alarms: Arc::new(alarms),
    }
}
