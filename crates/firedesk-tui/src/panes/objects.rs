//! Object list: search, status filter with per-filter counts, rows
//! colored by the status decision table.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use strum::IntoEnumIterator;

use firedesk_core::{Object, ObjectFilter, ObjectId, ObjectQuery, ObjectView, ThemeSettings, row_colors};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

use super::{apply_nav, nav_key};

pub struct ObjectsPane {
    focused: bool,
    settings: Arc<ThemeSettings>,
    objects: Arc<Vec<Arc<Object>>>,
    query: ObjectQuery,
    view: ObjectView,
    table_state: TableState,
    /// Selection is tracked by ID so refreshes do not move the cursor.
    selected_id: Option<ObjectId>,
    searching: bool,
}

impl ObjectsPane {
    pub fn new(settings: Arc<ThemeSettings>) -> Self {
        Self {
            focused: true,
            settings,
            objects: Arc::new(Vec::new()),
            query: ObjectQuery::default(),
            view: ObjectView::default(),
            table_state: TableState::default(),
            selected_id: None,
            searching: false,
        }
    }

    pub fn selected(&self) -> Option<&Arc<Object>> {
        self.table_state.selected().and_then(|i| self.view.objects.get(i))
    }

    pub fn query(&self) -> &ObjectQuery {
        &self.query
    }

    /// Rebuild the view and re-find the selected object. Returns the
    /// new selection when it changed.
    fn recompute(&mut self) -> Option<Action> {
        self.view = ObjectView::build(&self.objects, &self.query);
        let index = self
            .selected_id
            .and_then(|id| self.view.objects.iter().position(|o| o.id == id))
            .or_else(|| (!self.view.objects.is_empty()).then_some(0));
        self.table_state.select(index);
        self.sync_selection()
    }

    fn sync_selection(&mut self) -> Option<Action> {
        let id = self.selected().map(|o| o.id);
        if id == self.selected_id {
            return None;
        }
        self.selected_id = id;
        Some(Action::ObjectHighlighted(id))
    }

    fn filter_line(&self) -> Line<'_> {
        let mut spans = Vec::new();
        for filter in ObjectFilter::iter() {
            let style = if filter == self.query.filter {
                Style::default().fg(theme::AMBER).add_modifier(Modifier::BOLD)
            } else {
                theme::key_hint()
            };
            spans.push(Span::styled(
                format!(" {} {} ", filter.label(), self.view.counts.get(filter)),
                style,
            ));
        }
        Line::from(spans)
    }

    fn search_line(&self) -> Line<'_> {
        let cursor = if self.searching { "█" } else { "" };
        Line::from(vec![
            Span::styled(" / ", theme::key_hint_key()),
            Span::styled(self.query.search.as_str(), theme::value()),
            Span::styled(cursor, Style::default().fg(theme::STEEL_CYAN)),
        ])
    }
}

impl Component for ObjectsPane {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(nav) = nav_key(key) {
            apply_nav(&mut self.table_state, self.view.objects.len(), nav);
            return Ok(self.sync_selection());
        }
        if key.code == KeyCode::Enter {
            return Ok(self.selected().map(|o| Action::SelectObject(o.id)));
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        Ok(match action {
            Action::ObjectsUpdated(objects) => {
                self.objects = Arc::clone(objects);
                self.recompute()
            }
            Action::SearchInput(text) => {
                self.query.search.clone_from(text);
                self.recompute()
            }
            Action::OpenSearch => {
                self.searching = true;
                None
            }
            Action::SearchSubmit => {
                self.searching = false;
                None
            }
            Action::CloseSearch => {
                self.searching = false;
                self.query.search.clear();
                self.recompute()
            }
            Action::CycleObjectFilter => {
                self.query.filter = self.query.filter.next();
                self.recompute()
            }
            _ => None,
        })
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Об'єкти ({}) ", self.view.objects.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_search = self.searching || !self.query.search.is_empty();
        let [filters, search, table_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(u16::from(show_search)),
            Constraint::Min(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(self.filter_line()), filters);
        if show_search {
            frame.render_widget(Paragraph::new(self.search_line()), search);
        }

        if self.view.objects.is_empty() {
            let text = if self.objects.is_empty() {
                "  Завантаження..."
            } else {
                "  Нічого не знайдено"
            };
            frame.render_widget(Paragraph::new(Span::styled(text, theme::key_hint())), table_area);
            return;
        }

        let active = self.settings.active();
        let header = Row::new(["№", "Назва", "Адреса", "Стан"].map(|h| Cell::from(h).style(theme::table_header())));
        let rows = self.view.objects.iter().map(|o| {
            let colors = row_colors(o.flags, &self.settings, active);
            Row::new([
                Cell::from(o.id.to_string()),
                Cell::from(o.name.as_str()),
                Cell::from(o.address.as_str()),
                Cell::from(o.status_label()),
            ])
            .style(theme::pair_style(colors))
        });
        let widths = [
            Constraint::Length(6),
            Constraint::Fill(3),
            Constraint::Fill(3),
            Constraint::Length(14),
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
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::panes::fixtures::object;

    fn pane() -> ObjectsPane {
        let mut pane = ObjectsPane::new(Arc::new(ThemeSettings::default()));
        let objects = vec![
            object(1001, "Ромашка", (1, 0, 1, 0)),
            object(1002, "Супермаркет", (1, 1, 1, 0)),
            object(1003, "Школа №25", (1, 0, 1, 1)),
            object(1006, "Бізнес-центр", (1, 0, 0, 0)),
        ];
        pane.update(&Action::ObjectsUpdated(Arc::new(objects))).unwrap();
        pane
    }

    fn ids(pane: &ObjectsPane) -> Vec<i64> {
        pane.view.objects.iter().map(|o| o.id.get()).collect()
    }

    #[test]
    fn first_load_highlights_first_row() {
        let mut pane = ObjectsPane::new(Arc::new(ThemeSettings::default()));
        let action = pane
            .update(&Action::ObjectsUpdated(Arc::new(vec![object(7, "A", (1, 0, 1, 0))])))
            .unwrap();
        assert!(matches!(action, Some(Action::ObjectHighlighted(Some(ObjectId(7))))));
    }

    #[test]
    fn filter_cycle_narrows_and_counts_follow_search() {
        let mut pane = pane();
        pane.update(&Action::CycleObjectFilter).unwrap();
        assert_eq!(pane.query().filter, ObjectFilter::WithAlarms);
        assert_eq!(ids(&pane), vec![1002, 1003]);
        assert_eq!(pane.view.counts.all, 4);
        assert_eq!(pane.view.counts.disarmed, 1);

        pane.update(&Action::SearchInput("школа".into())).unwrap();
        assert_eq!(ids(&pane), vec![1003]);
        assert_eq!(pane.view.counts.all, 1);
    }

    #[test]
    fn selection_survives_refresh_by_id() {
        let mut pane = pane();
        let down = KeyEvent::new(KeyCode::Down, KeyModifiers::NONE);
        pane.handle_key_event(down).unwrap();
        pane.handle_key_event(down).unwrap();
        assert_eq!(pane.selected().unwrap().id, ObjectId(1003));

        // 1001 disappears; the cursor stays on 1003.
        let refreshed = vec![
            object(1002, "Супермаркет", (1, 1, 1, 0)),
            object(1003, "Школа №25", (1, 0, 1, 1)),
        ];
        let action = pane.update(&Action::ObjectsUpdated(Arc::new(refreshed))).unwrap();
        assert!(action.is_none());
        assert_eq!(pane.selected().unwrap().id, ObjectId(1003));
    }

    #[test]
    fn enter_opens_selected_object() {
        let mut pane = pane();
        let action = pane
            .handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(action, Some(Action::SelectObject(ObjectId(1001)))));
    }

    #[test]
    fn closing_search_clears_query() {
        let mut pane = pane();
        pane.update(&Action::OpenSearch).unwrap();
        pane.update(&Action::SearchInput("ромашка".into())).unwrap();
        assert_eq!(ids(&pane), vec![1001]);
        pane.update(&Action::CloseSearch).unwrap();
        assert_eq!(ids(&pane).len(), 4);
        assert!(!pane.searching);
    }
}
