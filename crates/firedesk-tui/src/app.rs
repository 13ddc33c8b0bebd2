//! Application core: event loop, focus, overlays and action dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tui_input::Input;

use firedesk_core::{ConnectionState, Console, ObjectId, ProcessAction, ProcessOutcome, Theme};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::connect;
use crate::event::{Event, EventReader};
use crate::panes::alarms::AlarmsPane;
use crate::panes::detail::DetailView;
use crate::panes::events::EventsPane;
use crate::panes::objects::ObjectsPane;
use crate::panes::process::ProcessDialog;
use crate::panes::{PaneId, centered, input_request};
use crate::theme;
use crate::tui::Tui;

/// At most one popup is open; it captures all keys.
enum Overlay {
    Help,
    Detail(DetailView),
    Process(ProcessDialog),
}

pub struct App {
    console: Console,
    /// Written into local alarm processing marks.
    operator: String,
    config_path: PathBuf,
    /// Reconnects open demo data instead of the database.
    demo: bool,
    /// Percent of the width given to the object list.
    split: u16,

    focus: PaneId,
    objects: ObjectsPane,
    alarms: AlarmsPane,
    events: EventsPane,
    overlay: Option<Overlay>,
    /// Object whose detail view opens when its details arrive.
    pending_detail: Option<ObjectId>,

    search: Input,
    searching: bool,
    running: bool,
    connection: ConnectionState,
    notification: Option<(Notification, Instant)>,
    last_update: Option<Instant>,

    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(console: Console, operator: String, config_path: PathBuf, demo: bool, object_list_split: f32) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let settings = console.theme();
        let objects = ObjectsPane::new(Arc::clone(settings));
        let alarms = AlarmsPane::new(Arc::clone(settings));
        let events = EventsPane::new(Arc::clone(settings));

        Self {
            operator,
            config_path,
            demo,
            split: split_percent(object_list_split),
            focus: PaneId::Objects,
            objects,
            alarms,
            events,
            overlay: None,
            pending_detail: None,
            search: Input::default(),
            searching: false,
            running: true,
            connection: *console.connection_state().borrow(),
            notification: None,
            last_update: None,
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            console,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge = tokio::spawn(crate::data_bridge::run_data_bridge(
            self.console.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(50));
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        // The bridge stops the console pollers on its way out.
        if let Err(e) = bridge.await {
            warn!(error = %e, "data bridge task failed");
        }
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Keys ──────────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.searching {
            return Ok(match key.code {
                KeyCode::Esc => Some(Action::CloseSearch),
                KeyCode::Enter => Some(Action::SearchSubmit),
                _ => input_request(key)
                    .and_then(|request| self.search.handle(request))
                    .map(|_| Action::SearchInput(self.search.value().to_owned())),
            });
        }

        if let Some(overlay) = &mut self.overlay {
            return match (overlay, key.code) {
                (Overlay::Help, KeyCode::Esc | KeyCode::Char('?' | 'q')) => Ok(Some(Action::ToggleHelp)),
                (Overlay::Help, _) => Ok(None),
                (_, KeyCode::Esc) => Ok(Some(Action::CloseOverlay)),
                (Overlay::Detail(_), KeyCode::Char('q')) => Ok(Some(Action::CloseOverlay)),
                (Overlay::Detail(view), _) => view.handle_key_event(key),
                (Overlay::Process(dialog), _) => dialog.handle_key_event(key),
            };
        }

        let action = match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Char('/') => Action::OpenSearch,
            KeyCode::Char('f') => Action::CycleObjectFilter,
            KeyCode::Tab => Action::FocusNext,
            KeyCode::BackTab => Action::FocusPrev,
            KeyCode::Char('t') => Action::ToggleTheme,
            KeyCode::Char('i') => Action::ToggleImportant,
            KeyCode::Char('c') => Action::ToggleCurrentObject,
            KeyCode::Char('P') => Action::CyclePeriod,
            KeyCode::Char('r') => Action::RefreshNow,
            KeyCode::Char('R') => Action::Reconnect,
            KeyCode::Char('p') => self.alarms.process_target(),
            KeyCode::Esc if self.notification.is_some() => Action::DismissNotification,
            _ => return self.focused_pane_mut().handle_key_event(key),
        };
        Ok(Some(action))
    }

    fn focused_pane_mut(&mut self) -> &mut dyn Component {
        match self.focus {
            PaneId::Objects => &mut self.objects,
            PaneId::Alarms => &mut self.alarms,
            PaneId::Events => &mut self.events,
        }
    }

    fn set_focus(&mut self, focus: PaneId) {
        self.focused_pane_mut().set_focused(false);
        self.focus = focus;
        self.focused_pane_mut().set_focused(true);
    }

    // ── Actions ───────────────────────────────────────────────────────

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(n, shown)| shown.elapsed() > n.lifetime())
                {
                    self.notification = None;
                }
            }

            Action::Resize(w, h) => debug!(w, h, "terminal resized"),

            Action::FocusNext => self.set_focus(self.focus.next()),
            Action::FocusPrev => self.set_focus(self.focus.prev()),

            Action::ToggleHelp => {
                self.overlay = match self.overlay {
                    Some(Overlay::Help) => None,
                    _ => Some(Overlay::Help),
                };
            }

            Action::CloseOverlay => {
                if let Some(Overlay::Detail(_)) = self.overlay.take() {
                    // Stops the slow poller reloading a closed card.
                    self.console.clear_selection();
                }
            }

            Action::OpenSearch => {
                self.searching = true;
                self.search = Input::new(self.objects.query().search.clone());
                self.set_focus(PaneId::Objects);
            }
            Action::SearchSubmit => self.searching = false,
            Action::CloseSearch => {
                self.searching = false;
                self.search.reset();
            }

            Action::SelectObject(id) => self.open_detail(*id),

            Action::DetailsLoaded(details) => {
                self.last_update = Some(Instant::now());
                if self.pending_detail == Some(details.object.id) {
                    self.pending_detail = None;
                    let view = DetailView::new(Arc::clone(details), Arc::clone(self.console.theme()));
                    self.overlay = Some(Overlay::Detail(view));
                } else if let Some(Overlay::Detail(view)) = &mut self.overlay {
                    view.update(action)?;
                }
            }

            Action::OpenProcess(alarm) => {
                self.overlay = Some(Overlay::Process(ProcessDialog::new(Arc::clone(alarm))));
            }

            Action::ProcessAlarm { alarm_id, action, note } => {
                self.overlay = None;
                self.process_alarm(*alarm_id, *action, note.clone());
            }

            Action::ToggleTheme => self.toggle_theme(),
            Action::RefreshNow => self.refresh_now(),
            Action::Reconnect => self.reconnect(),

            Action::ObjectsUpdated(_) | Action::AlarmsUpdated(_) | Action::EventsUpdated(_) => {
                self.last_update = Some(Instant::now());
            }

            Action::NewFireAlarm(alarm) => {
                warn!(object = %alarm.object_id, alarm = alarm.id, "new fire alarm");
                self.notification = Some((
                    Notification::error(format!("ПОЖЕЖА: №{} {}  {}", alarm.object_id, alarm.object_name, alarm.details)),
                    Instant::now(),
                ));
            }

            Action::Connection(state) => self.connection_changed(*state),

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),
            Action::DismissNotification => self.notification = None,

            _ => {}
        }

        self.forward(action)
    }

    /// Offer `action` to the panes and queue whatever they answer.
    fn forward(&mut self, action: &Action) -> Result<()> {
        let follow_ups = [
            self.objects.update(action)?,
            self.alarms.update(action)?,
            self.events.update(action)?,
        ];
        for follow_up in follow_ups.into_iter().flatten() {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        let previous = std::mem::replace(&mut self.connection, state);
        match (previous, state) {
            (ConnectionState::Connected, ConnectionState::Connected) => {}
            (_, ConnectionState::Disconnected) if previous != ConnectionState::Disconnected => {
                self.notify(Notification::error("Немає зв'язку з базою даних"));
            }
            (ConnectionState::Disconnected | ConnectionState::Degraded { .. }, ConnectionState::Connected) => {
                self.notify(Notification::success("Зв'язок з базою даних відновлено"));
            }
            _ => {}
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    /// Load `id` in the background; the card opens when the details
    /// come back through the bridge.
    fn open_detail(&mut self, id: ObjectId) {
        self.pending_detail = Some(id);
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match console.select_object(id).await {
                Ok(Some(_)) => debug!(object = %id, "details loaded"),
                Ok(None) => {
                    let _ = tx.send(Action::Notify(Notification::warning(format!("Об'єкт №{id} не знайдено"))));
                }
                Err(e) => {
                    warn!(error = %e, object = %id, "detail load failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("Не вдалося завантажити №{id}: {e}"))));
                }
            }
        });
    }

    fn process_alarm(&self, alarm_id: i64, action: ProcessAction, note: String) {
        let console = self.console.clone();
        let operator = self.operator.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match console.process_alarm(alarm_id, &operator, action, &note).await {
                Ok(ProcessOutcome::LocalOnly) => {
                    info!(alarm_id, action = action.label(), "alarm marked locally");
                    let _ = tx.send(Action::Notify(Notification::success(format!(
                        "{}: позначено лише в цій консолі",
                        action.label()
                    ))));
                }
                Err(e) => {
                    warn!(error = %e, alarm_id, "alarm processing failed");
                    let _ = tx.send(Action::Notify(Notification::error(e.to_string())));
                }
            }
        });
    }

    fn refresh_now(&self) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match console.refresh_all().await {
                Ok(()) => {
                    let _ = tx.send(Action::Notify(Notification::info("Оновлено")));
                }
                Err(e) => {
                    warn!(error = %e, "manual refresh failed");
                    let _ = tx.send(Action::Notify(Notification::error(format!("Оновлення не вдалося: {e}"))));
                }
            }
        });
    }

    /// Reopen the database from the config file. Success is announced
    /// by the console itself; a failure keeps the old connection.
    fn reconnect(&mut self) {
        self.notify(Notification::info("Перепідключення…"));
        let console = self.console.clone();
        let config_path = self.config_path.clone();
        let demo = self.demo;
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = connect::reconnect_from(&console, &config_path, demo).await {
                warn!(error = %e, "reconnect failed");
                let _ = tx.send(Action::Notify(Notification::error(format!(
                    "Перепідключення не вдалося: {e}"
                ))));
            }
        });
    }

    /// Flip the active table and remember the choice in the config file.
    fn toggle_theme(&mut self) {
        let theme = self.console.theme().toggle();
        let saved = firedesk_config::load_config_from(&self.config_path).and_then(|mut prefs| {
            prefs.ui.dark_theme = theme == Theme::Dark;
            firedesk_config::save_config_to(&prefs, &self.config_path)
        });
        match saved {
            Ok(()) => self.notify(Notification::info(format!("Тема: {theme}"))),
            Err(e) => {
                warn!(error = %e, path = %self.config_path.display(), "theme not saved");
                self.notify(Notification::warning(format!("Тема: {theme} (не збережено: {e})")));
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content, status] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
        let [left, right] = Layout::horizontal([
            Constraint::Percentage(self.split),
            Constraint::Percentage(100 - self.split),
        ])
        .areas(content);
        let [alarms, events] =
            Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(right);

        self.objects.render(frame, left);
        self.alarms.render(frame, alarms);
        self.events.render(frame, events);
        self.render_status_bar(frame, status);

        match &self.overlay {
            Some(Overlay::Help) => render_help(frame, area),
            Some(Overlay::Detail(view)) => view.render(frame, area),
            Some(Overlay::Process(dialog)) => dialog.render(frame, area),
            None => {}
        }

        if let Some((notification, _)) = &self.notification {
            render_notification(frame, area, notification);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.searching {
            let line = Line::from(vec![
                Span::styled(" / ", theme::key_hint_key()),
                Span::styled(self.search.value(), Style::default().fg(theme::STEEL_CYAN)),
                Span::styled("█", Style::default().fg(theme::STEEL_CYAN)),
                Span::styled("  Esc скасувати  Enter застосувати", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let color = match self.connection {
            ConnectionState::Connected => theme::SAFE_GREEN,
            ConnectionState::Degraded { .. } => theme::AMBER,
            ConnectionState::Disconnected => theme::SIGNAL_RED,
        };
        let updated = self.last_update.map_or_else(
            || "очікування даних".to_owned(),
            |at| {
                let ago = Duration::from_secs(at.elapsed().as_secs());
                format!("оновлено {} тому", humantime::format_duration(ago))
            },
        );

        let line = Line::from(vec![
            Span::styled(format!(" ● {}", self.connection.label()), Style::default().fg(color)),
            Span::styled(format!(" │ {updated}"), theme::value()),
            Span::styled(format!(" │ події: {}", self.events.filter().period.label()), theme::value()),
            Span::styled(format!(" │ тема: {}", self.console.theme().active()), theme::value()),
            Span::styled(" │ ? довідка  / пошук  p обробка  q вихід", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Config already clamps the ratio; clamp again for hand-built values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn split_percent(ratio: f32) -> u16 {
    (ratio.clamp(0.1, 0.9) * 100.0).round() as u16
}

const HELP: &[(&str, &str)] = &[
    ("Tab / Shift+Tab", "наступна / попередня панель"),
    ("j/k ↑/↓", "рух по списку"),
    ("g/G PgUp/PgDn", "початок / кінець / сторінка"),
    ("Enter", "картка об'єкта"),
    ("/", "пошук об'єктів"),
    ("f", "фільтр стану об'єктів"),
    ("p", "обробити тривогу"),
    ("i", "лише важливі події"),
    ("c", "події лише поточного об'єкта"),
    ("P", "період журналу подій"),
    ("t", "темна / світла тема"),
    ("r", "оновити зараз"),
    ("R", "перепідключитися до бази"),
    ("Esc", "закрити вікно / сповіщення"),
    ("q", "вихід"),
];

fn render_help(frame: &mut Frame, area: Rect) {
    let height = u16::try_from(HELP.len()).unwrap_or(14) + 4;
    let popup = centered(area, 56, height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Клавіші ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));

    let mut lines = vec![Line::default()];
    lines.extend(HELP.iter().map(|(keys, what)| {
        Line::from(vec![
            Span::styled(format!("  {keys:<17}"), theme::key_hint_key()),
            Span::styled(*what, theme::value()),
        ])
    }));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SAFE_GREEN, "✓"),
        NotificationLevel::Error => (theme::SIGNAL_RED, "✗"),
        NotificationLevel::Warning => (theme::AMBER, "!"),
        NotificationLevel::Info => (theme::STEEL_CYAN, "·"),
    };

    let text_width = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = text_width.saturating_add(6).clamp(20, area.width.saturating_sub(2).max(20));
    let height = 3;
    let toast = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 1),
        width.min(area.width),
        height.min(area.height),
    );

    frame.render_widget(Clear, toast);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notification.message.as_str(), theme::value()),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), toast);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use firedesk_core::store::DemoStore;
    use firedesk_core::{ConsoleOptions, ThemeSettings};

    use super::*;
    use crate::panes::fixtures::alarm;

    fn app() -> App {
        let console = Console::new(
            Arc::new(DemoStore::frozen()),
            Arc::new(ThemeSettings::default()),
            ConsoleOptions::default(),
        );
        App::new(console, "Оператор".into(), PathBuf::from("/nonexistent/config.toml"), false, 0.32)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[test]
    fn split_ratio_becomes_percent() {
        assert_eq!(split_percent(0.32), 32);
        assert_eq!(split_percent(5.0), 90);
    }

    #[tokio::test]
    async fn global_keys_map_to_actions() {
        let mut app = app();
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap(), Some(Action::Quit)));
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('P'))).unwrap(), Some(Action::CyclePeriod)));
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('i'))).unwrap(), Some(Action::ToggleImportant)));
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('R'))).unwrap(), Some(Action::Reconnect)));
        // Nothing to process yet.
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('p'))).unwrap(), Some(Action::Notify(_))));
    }

    #[tokio::test]
    async fn search_mode_captures_letters() {
        let mut app = app();
        app.process_action(&Action::OpenSearch).unwrap();
        let action = app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert!(matches!(action, Some(Action::SearchInput(ref q)) if q == "q"));
        assert!(app.running);

        app.process_action(&Action::CloseSearch).unwrap();
        assert!(!app.searching);
        assert_eq!(app.search.value(), "");
    }

    #[tokio::test]
    async fn overlays_capture_escape() {
        let mut app = app();
        app.process_action(&Action::OpenProcess(alarm(1002, 1))).unwrap();
        assert!(matches!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap(), None));
        assert!(matches!(app.handle_key_event(key(KeyCode::Esc)).unwrap(), Some(Action::CloseOverlay)));
        app.process_action(&Action::CloseOverlay).unwrap();
        assert!(app.overlay.is_none());
    }

    #[tokio::test]
    async fn focus_cycles_and_fire_alarm_raises_toast() {
        let mut app = app();
        app.process_action(&Action::FocusNext).unwrap();
        assert_eq!(app.focus, PaneId::Alarms);
        app.process_action(&Action::FocusPrev).unwrap();
        assert_eq!(app.focus, PaneId::Objects);

        app.process_action(&Action::NewFireAlarm(alarm(1002, 1))).unwrap();
        let (toast, _) = app.notification.as_ref().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert!(toast.message.contains("1002"));
    }

    #[tokio::test]
    async fn losing_the_database_is_announced_once() {
        let mut app = app();
        app.process_action(&Action::Connection(ConnectionState::Connected)).unwrap();
        assert!(app.notification.is_some());
        app.notification = None;

        app.process_action(&Action::Connection(ConnectionState::Degraded { failures: 1 })).unwrap();
        assert!(app.notification.is_none());
        app.process_action(&Action::Connection(ConnectionState::Disconnected)).unwrap();
        assert_eq!(app.notification.as_ref().unwrap().0.level, NotificationLevel::Error);

        app.notification = None;
        app.process_action(&Action::Connection(ConnectionState::Disconnected)).unwrap();
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn failed_reconnect_raises_error_toast_and_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[db]\npath = \"\"\n").unwrap();

        let mut app = app();
        app.config_path = config_path;
        app.process_action(&Action::Reconnect).unwrap();
        assert_eq!(app.notification.as_ref().unwrap().0.level, NotificationLevel::Info);

        let reply = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match app.action_rx.recv().await {
                    Some(Action::Notify(n)) => break n,
                    Some(_) => {}
                    None => panic!("action channel closed"),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(reply.level, NotificationLevel::Error);
        assert_eq!(app.console.store().describe(), "demo");
    }
}
