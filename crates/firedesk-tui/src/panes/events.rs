//! Event log with period, important-only and current-object filters.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use firedesk_core::{Event, EventFilter, ObjectId, ThemeSettings};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

use super::{apply_nav, nav_key};

pub struct EventsPane {
    focused: bool,
    settings: Arc<ThemeSettings>,
    /// Whole cached log, newest first.
    events: Arc<Vec<Arc<Event>>>,
    shown: Vec<Arc<Event>>,
    filter: EventFilter,
    /// Only applied while `current_only` is on.
    highlighted: Option<ObjectId>,
    current_only: bool,
    table_state: TableState,
}

impl EventsPane {
    pub fn new(settings: Arc<ThemeSettings>) -> Self {
        Self {
            focused: false,
            settings,
            events: Arc::new(Vec::new()),
            shown: Vec::new(),
            filter: EventFilter::default(),
            highlighted: None,
            current_only: false,
            table_state: TableState::default(),
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Re-apply the filter. The newest row stays in view unless the
    /// operator has scrolled down into the history.
    fn refilter(&mut self) {
        let pinned = self.table_state.selected().is_none_or(|i| i == 0);
        let keep = self.table_state.selected().and_then(|i| self.shown.get(i)).map(|e| e.id);

        self.filter.object = if self.current_only { self.highlighted } else { None };
        self.shown = self.filter.apply(&self.events, chrono::Local::now().naive_local());

        let index = if pinned {
            (!self.shown.is_empty()).then_some(0)
        } else {
            keep.and_then(|id| self.shown.iter().position(|e| e.id == id))
                .or_else(|| (!self.shown.is_empty()).then_some(0))
        };
        self.table_state.select(index);
    }

    fn status_line(&self) -> Line<'_> {
        let mut spans = vec![
            Span::styled(" P ", theme::key_hint_key()),
            Span::styled(self.filter.period.label(), theme::value()),
        ];
        if self.filter.important_only {
            spans.push(Span::styled("  ·  ", theme::key_hint()));
            spans.push(Span::styled("лише важливі", theme::value()));
        }
        if self.current_only {
            spans.push(Span::styled("  ·  ", theme::key_hint()));
            let label = match self.highlighted {
                Some(id) => format!("лише об'єкт №{id}"),
                None => "лише поточний об'єкт".into(),
            };
            spans.push(Span::styled(label, theme::value()));
        }
        Line::from(spans)
    }
}

impl Component for EventsPane {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(nav) = nav_key(key) {
            apply_nav(&mut self.table_state, self.shown.len(), nav);
            return Ok(None);
        }
        if key.code == KeyCode::Enter {
            let selected = self.table_state.selected().and_then(|i| self.shown.get(i));
            return Ok(selected.map(|e| Action::SelectObject(e.object_id)));
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::EventsUpdated(events) => {
                self.events = Arc::clone(events);
                self.refilter();
            }
            Action::EventsReset => {
                self.events = Arc::new(Vec::new());
                self.refilter();
            }
            Action::ToggleImportant => {
                self.filter.important_only = !self.filter.important_only;
                self.refilter();
            }
            Action::ToggleCurrentObject => {
                self.current_only = !self.current_only;
                self.refilter();
            }
            Action::CyclePeriod => {
                self.filter.period = self.filter.period.next();
                self.refilter();
            }
            Action::ObjectHighlighted(id) => {
                self.highlighted = *id;
                if self.current_only {
                    self.refilter();
                }
            }
            // The period window slides with the clock.
            Action::Tick => self.refilter(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Події ({}/{}) ", self.shown.len(), self.events.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [status, table_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(inner);
        frame.render_widget(Paragraph::new(self.status_line()), status);

        if self.shown.is_empty() {
            let text = if self.events.is_empty() {
                "  Очікування подій..."
            } else {
                "  Немає подій за цими фільтрами"
            };
            frame.render_widget(Paragraph::new(Span::styled(text, theme::key_hint())), table_area);
            return;
        }

        let header = Row::new(
            ["Час", "№", "Об'єкт", "Подія", "Зона", "Опис"].map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows = self.shown.iter().map(|e| {
            Row::new([
                Cell::from(e.date_time_display()),
                Cell::from(e.object_id.to_string()),
                Cell::from(e.object_name.as_str()),
                Cell::from(e.kind.label()),
                Cell::from(e.zone.map(|z| z.to_string()).unwrap_or_default()),
                Cell::from(e.details.as_str()),
            ])
            .style(theme::pair_style(self.settings.classify_active(e.code)))
        });
        let widths = [
            Constraint::Length(19),
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Length(14),
            Constraint::Length(4),
            Constraint::Fill(3),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use firedesk_core::Period;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::panes::fixtures::event;

    fn pane() -> EventsPane {
        let mut pane = EventsPane::new(Arc::new(ThemeSettings::default()));
        // Newest first: fire at 1002, restore at 1001, arm at 1003 two hours ago.
        let events = vec![event(3, 1002, 1, 1), event(2, 1001, 5, 10), event(1, 1003, 10, 120)];
        pane.update(&Action::EventsUpdated(Arc::new(events))).unwrap();
        pane
    }

    fn ids(pane: &EventsPane) -> Vec<i64> {
        pane.shown.iter().map(|e| e.id).collect()
    }

    #[test]
    fn period_cycle_widens_window() {
        let mut pane = pane();
        pane.filter.period = Period::LastHour;
        pane.refilter();
        assert_eq!(ids(&pane), vec![3, 2]);

        pane.update(&Action::CyclePeriod).unwrap();
        pane.update(&Action::CyclePeriod).unwrap();
        assert_eq!(pane.filter().period, Period::All);
        assert_eq!(ids(&pane), vec![3, 2, 1]);
    }

    #[test]
    fn important_only_keeps_critical_kinds() {
        let mut pane = pane();
        pane.filter.period = Period::All;
        pane.update(&Action::ToggleImportant).unwrap();
        assert_eq!(ids(&pane), vec![3]);
    }

    #[test]
    fn current_object_follows_highlight() {
        let mut pane = pane();
        pane.filter.period = Period::All;
        pane.update(&Action::ObjectHighlighted(Some(ObjectId(1001)))).unwrap();
        assert_eq!(ids(&pane).len(), 3);

        pane.update(&Action::ToggleCurrentObject).unwrap();
        assert_eq!(ids(&pane), vec![2]);

        pane.update(&Action::ObjectHighlighted(Some(ObjectId(1003)))).unwrap();
        assert_eq!(ids(&pane), vec![1]);
    }

    #[test]
    fn reset_empties_log() {
        let mut pane = pane();
        pane.update(&Action::EventsReset).unwrap();
        assert!(ids(&pane).is_empty());
        assert_eq!(pane.table_state.selected(), None);
    }
}
