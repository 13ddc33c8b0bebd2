//! Active alarm panel.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use firedesk_core::{Alarm, AlarmSnapshot, ThemeSettings};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;

use super::{apply_nav, nav_key};

pub struct AlarmsPane {
    focused: bool,
    settings: Arc<ThemeSettings>,
    snapshot: AlarmSnapshot,
    table_state: TableState,
}

impl AlarmsPane {
    pub fn new(settings: Arc<ThemeSettings>) -> Self {
        Self {
            focused: false,
            settings,
            snapshot: AlarmSnapshot::default(),
            table_state: TableState::default(),
        }
    }

    pub fn selected(&self) -> Option<&Arc<Alarm>> {
        self.table_state.selected().and_then(|i| self.snapshot.alarms.get(i))
    }

    /// `p` works from any pane: the highlighted alarm, or the first
    /// unprocessed one.
    pub fn process_target(&self) -> Action {
        let target = self
            .selected()
            .filter(|a| !a.is_processed())
            .or_else(|| self.snapshot.alarms.iter().find(|a| !a.is_processed()));
        match target {
            Some(alarm) => Action::OpenProcess(Arc::clone(alarm)),
            None if self.snapshot.alarms.is_empty() => Action::Notify(Notification::info("Активних тривог немає")),
            None => Action::Notify(Notification::info("Усі тривоги вже оброблено")),
        }
    }

    fn title(&self) -> String {
        if self.snapshot.fire_count > 0 {
            format!(" Тривоги ({}, пожеж: {}) ", self.snapshot.total, self.snapshot.fire_count)
        } else {
            format!(" Тривоги ({}) ", self.snapshot.total)
        }
    }
}

impl Component for AlarmsPane {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(nav) = nav_key(key) {
            apply_nav(&mut self.table_state, self.snapshot.alarms.len(), nav);
            return Ok(None);
        }
        if key.code == KeyCode::Enter {
            return Ok(self.selected().map(|a| Action::SelectObject(a.object_id)));
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::AlarmsUpdated(snapshot) = action {
            // Keep the cursor on the same alarm when the list reorders.
            let keep = self.selected().map(|a| a.id);
            self.snapshot = snapshot.clone();
            let index = keep
                .and_then(|id| self.snapshot.alarms.iter().position(|a| a.id == id))
                .or_else(|| (!self.snapshot.alarms.is_empty()).then_some(0));
            self.table_state.select(index);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let border = if self.snapshot.fire_count > 0 {
            Style::default().fg(theme::SIGNAL_RED)
        } else {
            theme::border(self.focused)
        };
        let block = Block::default()
            .title(self.title())
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.snapshot.alarms.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  Активних тривог немає", theme::key_hint())),
                inner,
            );
            return;
        }

        let header = Row::new(
            ["Час", "№", "Об'єкт", "Тип", "Зона", "Опис", "Обробка"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows = self.snapshot.alarms.iter().map(|a| {
            let mut style = theme::pair_style(self.settings.classify_active(a.code));
            let handled = match &a.processing {
                Some(p) => {
                    style = style.add_modifier(Modifier::DIM);
                    format!("✓ {}: {}", p.by, p.action.label())
                }
                None => String::new(),
            };
            Row::new([
                Cell::from(a.time_display()),
                Cell::from(a.object_id.to_string()),
                Cell::from(a.object_name.as_str()),
                Cell::from(a.kind.label()),
                Cell::from(a.zone.map(|z| z.to_string()).unwrap_or_default()),
                Cell::from(a.details.as_str()),
                Cell::from(handled),
            ])
            .style(style)
        });
        let widths = [
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Length(13),
            Constraint::Length(4),
            Constraint::Fill(3),
            Constraint::Fill(2),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, inner, &mut state);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
