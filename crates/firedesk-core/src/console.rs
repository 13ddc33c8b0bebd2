// ── Console hub ──
//
// Owns the current store, the three cache components and the theme
// settings. Background pollers drive the caches; every completed
// refresh is published as a `ConsoleUpdate` for the single UI consumer.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use firedesk_store::LegacyStore;

use crate::cache::{
    AlarmDiffer, AlarmSnapshot, Bootstrap, DEFAULT_EVENT_CAPACITY, EventCache, ObjectCache,
    ProcessOutcome,
};
use crate::classify::ThemeSettings;
use crate::detail::{ObjectDetails, load_details};
use crate::error::CoreError;
use crate::model::{Alarm, Event, Object, ObjectId, ProcessAction};
use crate::refresh::Refresh;

/// Consecutive failed pings before the connection counts as lost.
const DISCONNECT_AFTER: u32 = 3;

// ── Options ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConsoleOptions {
    /// Alarms, events and the object list.
    pub fast_interval: Duration,
    /// Full object list plus the selected object's detail.
    pub slow_interval: Duration,
    pub health_interval: Duration,
    pub event_capacity: usize,
    pub bootstrap: Bootstrap,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(2),
            slow_interval: Duration::from_secs(60),
            health_interval: Duration::from_secs(30),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            bootstrap: Bootstrap::default(),
        }
    }
}

// ── ConnectionState ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    /// At least one recent ping failed.
    Degraded { failures: u32 },
    Disconnected,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "БД: підключено",
            Self::Degraded { .. } => "БД: нестабільно",
            Self::Disconnected => "БД: немає зв'язку",
        }
    }
}

// ── Updates ──────────────────────────────────────────────────────

/// One completed change, in the order it happened.
#[derive(Debug, Clone)]
pub enum ConsoleUpdate {
    Objects(Arc<Vec<Arc<Object>>>),
    Alarms(AlarmSnapshot),
    /// An unprocessed fire alarm that was not active on the previous poll.
    NewFireAlarm(Arc<Alarm>),
    /// Newly merged events, newest first. Never empty.
    Events(Vec<Arc<Event>>),
    /// The event cache was cleared (store switched).
    EventsReset,
    Details(Arc<ObjectDetails>),
    Connection(ConnectionState),
    Reconnected { target: String },
}

// ── Console ──────────────────────────────────────────────────────

/// Cheaply cloneable handle to the dispatcher state.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    store: ArcSwap<Arc<dyn LegacyStore>>,
    theme: Arc<ThemeSettings>,
    objects: ObjectCache,
    alarms: AlarmDiffer,
    events: EventCache,
    selected: watch::Sender<Option<ObjectId>>,
    connection: watch::Sender<ConnectionState>,
    updates: ArcSwapOption<mpsc::UnboundedSender<ConsoleUpdate>>,
    options: ConsoleOptions,
    cancel: CancellationToken,
    health_cancel: Mutex<CancellationToken>,
    reconnect_lock: Mutex<()>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Console {
    /// Create a console over `store`. Nothing is polled until
    /// [`start()`](Self::start) or an explicit refresh.
    pub fn new(store: Arc<dyn LegacyStore>, theme: Arc<ThemeSettings>, options: ConsoleOptions) -> Self {
        let (selected, _) = watch::channel(None);
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let health_cancel = cancel.child_token();

        Self {
            inner: Arc::new(ConsoleInner {
                store: ArcSwap::from_pointee(store),
                theme,
                objects: ObjectCache::new(),
                alarms: AlarmDiffer::new(),
                events: EventCache::new(options.event_capacity, options.bootstrap),
                selected,
                connection,
                updates: ArcSwapOption::empty(),
                options,
                cancel,
                health_cancel: Mutex::new(health_cancel),
                reconnect_lock: Mutex::new(()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The store currently in use.
    pub fn store(&self) -> Arc<dyn LegacyStore> {
        let slot = self.inner.store.load();
        Arc::clone(&**slot)
    }

    pub fn theme(&self) -> &Arc<ThemeSettings> {
        &self.inner.theme
    }

    pub fn objects(&self) -> &ObjectCache {
        &self.inner.objects
    }

    pub fn alarms(&self) -> &AlarmDiffer {
        &self.inner.alarms
    }

    pub fn events(&self) -> &EventCache {
        &self.inner.events
    }

    pub fn options(&self) -> &ConsoleOptions {
        &self.inner.options
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        *self.inner.selected.borrow()
    }

    /// Open the update channel. A second call replaces the first
    /// receiver; updates are dropped while nobody listens.
    pub fn take_updates(&self) -> mpsc::UnboundedReceiver<ConsoleUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.updates.store(Some(Arc::new(tx)));
        rx
    }

    fn publish(&self, update: ConsoleUpdate) {
        let guard = self.inner.updates.load();
        if let Some(tx) = &*guard {
            if tx.send(update).is_err() {
                debug!("update receiver dropped");
                self.inner.updates.store(None);
            }
        }
    }

    fn set_connection(&self, state: ConnectionState) {
        let changed = self.inner.connection.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            self.publish(ConsoleUpdate::Connection(state));
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Ping, load everything once, then spawn the pollers and the
    /// health check. An unreachable store is reported through the
    /// connection state; the pollers keep retrying.
    pub async fn start(&self) {
        let store = self.store();
        match store.ping().await {
            Ok(()) => self.set_connection(ConnectionState::Connected),
            Err(e) => {
                warn!(error = %e, db = %store.describe(), "initial ping failed");
                self.set_connection(ConnectionState::Degraded { failures: 1 });
            }
        }
        if let Err(e) = self.refresh_all().await {
            warn!(error = %e, "initial refresh failed");
        }

        let options = &self.inner.options;
        {
            let mut handles = self.inner.task_handles.lock().await;
            handles.push(tokio::spawn(poll_task(
                self.clone(),
                Schedule::Fast,
                options.fast_interval,
                self.inner.cancel.child_token(),
            )));
            handles.push(tokio::spawn(poll_task(
                self.clone(),
                Schedule::Slow,
                options.slow_interval,
                self.inner.cancel.child_token(),
            )));
        }
        self.restart_health(store).await;
        info!(db = %self.store().describe(), "console started");
    }

    /// Cancel every background task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.set_connection(ConnectionState::Disconnected);
        debug!("console stopped");
    }

    async fn restart_health(&self, store: Arc<dyn LegacyStore>) {
        let token = {
            let mut slot = self.inner.health_cancel.lock().await;
            slot.cancel();
            *slot = self.inner.cancel.child_token();
            slot.clone()
        };
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(tokio::spawn(health_task(
            self.clone(),
            store,
            self.inner.options.health_interval,
            token,
        )));
    }

    /// Switch to `candidate`.
    ///
    /// The candidate is pinged first. If that fails the error is
    /// returned and the current store, its health check and all cached
    /// data stay exactly as they were.
    pub async fn reconnect(&self, candidate: Arc<dyn LegacyStore>) -> Result<(), CoreError> {
        let _serial = self.inner.reconnect_lock.lock().await;
        let db = candidate.describe();
        warn!(%db, "reconnecting to database");

        if let Err(e) = candidate.ping().await {
            error!(error = %e, %db, "new database unreachable, keeping current connection");
            return Err(e.into());
        }

        {
            let slot = self.inner.health_cancel.lock().await;
            slot.cancel();
        }
        let previous = self.inner.store.swap(Arc::new(Arc::clone(&candidate)));
        debug!(previous = %previous.describe(), "store swapped");
        drop(previous);

        self.inner.events.reset();
        self.publish(ConsoleUpdate::EventsReset);
        self.inner.alarms.reset().await;
        self.publish(ConsoleUpdate::Alarms(self.inner.alarms.snapshot()));
        self.restart_health(Arc::clone(&candidate)).await;
        self.set_connection(ConnectionState::Connected);

        if let Err(e) = self.refresh_all().await {
            warn!(error = %e, "refresh after reconnect failed");
        }
        if let Some(id) = self.selected() {
            if let Err(e) = self.reload_details(id).await {
                warn!(error = %e, object = %id, "detail reload after reconnect failed");
            }
        }

        info!(%db, "reconnected");
        self.publish(ConsoleUpdate::Reconnected { target: db });
        Ok(())
    }

    // ── Refresh ──────────────────────────────────────────────────

    pub async fn refresh_objects(&self) -> Result<Refresh<usize>, CoreError> {
        let store = self.store();
        let outcome = self.inner.objects.poll(store.as_ref()).await?;
        if !outcome.is_skipped() {
            self.publish(ConsoleUpdate::Objects(self.inner.objects.snapshot()));
        }
        Ok(outcome)
    }

    pub async fn refresh_alarms(&self) -> Result<Refresh<AlarmSnapshot>, CoreError> {
        let store = self.store();
        let outcome = self.inner.alarms.poll(store.as_ref()).await?;
        Ok(outcome.map(|poll| {
            self.publish(ConsoleUpdate::Alarms(poll.snapshot.clone()));
            if let Some(alarm) = poll.newly_appeared {
                self.publish(ConsoleUpdate::NewFireAlarm(alarm));
            }
            poll.snapshot
        }))
    }

    /// Returns the number of newly merged events.
    pub async fn refresh_events(&self) -> Result<Refresh<usize>, CoreError> {
        let store = self.store();
        let outcome = self.inner.events.poll(store.as_ref()).await?;
        Ok(outcome.map(|batch| {
            let count = batch.len();
            if count > 0 {
                self.publish(ConsoleUpdate::Events(batch));
            }
            count
        }))
    }

    /// Refresh all three caches concurrently. Every cache is attempted;
    /// the first failure is returned.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        let (objects, alarms, events) = tokio::join!(
            self.refresh_objects(),
            self.refresh_alarms(),
            self.refresh_events(),
        );
        objects.map(drop)?;
        alarms.map(drop)?;
        events.map(drop)?;
        Ok(())
    }

    // ── Selection and actions ────────────────────────────────────

    /// Make `id` the current object and load its detail view.
    ///
    /// A vanished object yields `Ok(None)` and leaves the previous
    /// selection in place.
    pub async fn select_object(&self, id: ObjectId) -> Result<Option<Arc<ObjectDetails>>, CoreError> {
        let Some(details) = load_details(self.store().as_ref(), id).await? else {
            return Ok(None);
        };
        self.inner.selected.send_replace(Some(id));
        Ok(Some(self.apply_details(details)))
    }

    pub fn clear_selection(&self) {
        self.inner.selected.send_replace(None);
    }

    async fn reload_details(&self, id: ObjectId) -> Result<(), CoreError> {
        let Some(details) = load_details(self.store().as_ref(), id).await? else {
            return Ok(());
        };
        // The operator may have moved on while the queries ran.
        if self.selected() == Some(id) {
            self.apply_details(details);
        }
        Ok(())
    }

    fn apply_details(&self, details: ObjectDetails) -> Arc<ObjectDetails> {
        let details = Arc::new(details);
        if self.inner.objects.apply_detail(Object::clone(&details.object)) {
            self.publish(ConsoleUpdate::Objects(self.inner.objects.snapshot()));
        }
        self.publish(ConsoleUpdate::Details(Arc::clone(&details)));
        details
    }

    /// Mark an active alarm as handled. Local to this console; see
    /// [`ProcessOutcome`].
    pub async fn process_alarm(
        &self,
        alarm_id: i64,
        by: &str,
        action: ProcessAction,
        note: &str,
    ) -> Result<ProcessOutcome, CoreError> {
        let outcome = self.inner.alarms.process(alarm_id, by, action, note).await?;
        self.publish(ConsoleUpdate::Alarms(self.inner.alarms.snapshot()));
        Ok(outcome)
    }
}

// ── Background tasks ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Schedule {
    Fast,
    Slow,
}

async fn poll_task(console: Console, schedule: Schedule, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => match schedule {
                Schedule::Fast => {
                    let (alarms, events, objects) = tokio::join!(
                        console.refresh_alarms(),
                        console.refresh_events(),
                        console.refresh_objects(),
                    );
                    if let Err(e) = alarms {
                        warn!(error = %e, "alarm poll failed");
                    }
                    if let Err(e) = events {
                        warn!(error = %e, "event poll failed");
                    }
                    if let Err(e) = objects {
                        warn!(error = %e, "object poll failed");
                    }
                }
                Schedule::Slow => {
                    if let Err(e) = console.refresh_objects().await {
                        warn!(error = %e, "object list refresh failed");
                    }
                    if let Some(id) = console.selected() {
                        if let Err(e) = console.reload_details(id).await {
                            warn!(error = %e, object = %id, "detail refresh failed");
                        }
                    }
                }
            },
        }
    }
    debug!(?schedule, "poller stopped");
}

/// Ping the store it was started for until cancelled.
async fn health_task(
    console: Console,
    store: Arc<dyn LegacyStore>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick
    let mut failures: u32 = 0;
    info!(db = %store.describe(), every = ?period, "health check started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => match store.ping().await {
                Ok(()) => {
                    if failures > 0 {
                        info!(failures, "database connection restored");
                    }
                    failures = 0;
                    console.set_connection(ConnectionState::Connected);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(error = %e, failures, "database ping failed");
                    let state = if failures >= DISCONNECT_AFTER {
                        ConnectionState::Disconnected
                    } else {
                        ConnectionState::Degraded { failures }
                    };
                    // A cancelled checker must not overwrite the state of its successor.
                    if !cancel.is_cancelled() {
                        console.set_connection(state);
                    }
                }
            },
        }
    }
    debug!(db = %store.describe(), "health check stopped");
}
