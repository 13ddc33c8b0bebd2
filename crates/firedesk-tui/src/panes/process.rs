//! Alarm processing popup: pick what was done, add an optional note.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};
use strum::IntoEnumIterator;
use tui_input::Input;

use firedesk_core::{Alarm, ProcessAction};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

use super::{centered, input_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Action,
    Note,
}

pub struct ProcessDialog {
    alarm: Arc<Alarm>,
    actions: Vec<ProcessAction>,
    list_state: ListState,
    note: Input,
    field: Field,
}

impl ProcessDialog {
    pub fn new(alarm: Arc<Alarm>) -> Self {
        Self {
            alarm,
            actions: ProcessAction::iter().collect(),
            list_state: ListState::default().with_selected(Some(0)),
            note: Input::default(),
            field: Field::Action,
        }
    }

    fn chosen(&self) -> Option<ProcessAction> {
        self.list_state.selected().and_then(|i| self.actions.get(i)).copied()
    }

    fn step(&mut self, delta: isize) {
        let last = self.actions.len().saturating_sub(1);
        let current = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(current.saturating_add_signed(delta).min(last)));
    }

    fn submit(&self) -> Option<Action> {
        self.chosen().map(|action| Action::ProcessAlarm {
            alarm_id: self.alarm.id,
            action,
            note: self.note.value().trim().to_owned(),
        })
    }
}

impl Component for ProcessDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (self.field, key.code) {
            (_, KeyCode::Enter) => return Ok(self.submit()),
            (_, KeyCode::Tab | KeyCode::BackTab) => {
                self.field = match self.field {
                    Field::Action => Field::Note,
                    Field::Note => Field::Action,
                };
            }
            (Field::Action, KeyCode::Char('j') | KeyCode::Down) => self.step(1),
            (Field::Action, KeyCode::Char('k') | KeyCode::Up) => self.step(-1),
            (Field::Action, KeyCode::Char(c @ '1'..='9')) => {
                let index = usize::from(u8::try_from(c).unwrap_or(b'1') - b'1');
                if index < self.actions.len() {
                    self.list_state.select(Some(index));
                }
            }
            (Field::Note, _) => {
                if let Some(request) = input_request(key) {
                    self.note.handle(request);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let height = u16::try_from(self.actions.len()).unwrap_or(6) + 9;
        let popup = centered(area, 64, height);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(format!(" Обробка тривоги: №{} {} ", self.alarm.object_id, self.alarm.object_name))
            .title_bottom(Line::from(vec![
                Span::styled(" Enter ", theme::key_hint_key()),
                Span::styled("зберегти  ", theme::key_hint()),
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("примітка  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("скасувати ", theme::key_hint()),
            ]))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::SIGNAL_RED))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [summary, list_area, note_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .areas(inner);

        let summary_text = vec![
            Line::from(vec![
                Span::styled(format!(" {} ", self.alarm.kind.label()), Style::default().fg(theme::SIGNAL_RED).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}  {}", self.alarm.time_display(), self.alarm.details), theme::value()),
            ]),
            Line::from(Span::styled(format!(" {}", self.alarm.address), theme::label())),
        ];
        frame.render_widget(Paragraph::new(summary_text), summary);

        let items: Vec<ListItem> = self
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| ListItem::new(format!(" {}  {}", i + 1, a.label())))
            .collect();
        let highlight = if self.field == Field::Action {
            theme::table_selected().fg(theme::AMBER)
        } else {
            theme::table_selected()
        };
        let list = List::new(items).style(theme::value()).highlight_style(highlight);
        let mut state = self.list_state;
        frame.render_stateful_widget(list, list_area, &mut state);

        let note_block = Block::default()
            .title(" Примітка ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.field == Field::Note));
        let note_inner = note_block.inner(note_area);
        let width = usize::from(note_inner.width.max(1));
        let offset = self.note.visual_scroll(width.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(self.note.value())
                .style(theme::value())
                .scroll((0, u16::try_from(offset).unwrap_or(0)))
                .block(note_block),
            note_area,
        );
        if self.field == Field::Note {
            let cursor = self.note.visual_cursor().saturating_sub(offset);
            frame.set_cursor_position((
                note_inner.x + u16::try_from(cursor).unwrap_or(0),
                note_inner.y,
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::panes::fixtures::alarm;

    fn press(dialog: &mut ProcessDialog, code: KeyCode) -> Option<Action> {
        dialog.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    #[test]
    fn submit_carries_choice_and_trimmed_note() {
        let mut dialog = ProcessDialog::new(alarm(1002, 1));
        press(&mut dialog, KeyCode::Down);
        press(&mut dialog, KeyCode::Down);
        press(&mut dialog, KeyCode::Tab);
        for c in " сусіди ".chars() {
            press(&mut dialog, KeyCode::Char(c));
        }

        let Some(Action::ProcessAlarm { alarm_id, action, note }) = press(&mut dialog, KeyCode::Enter) else {
            panic!("expected a process request");
        };
        assert_eq!(alarm_id, 1002);
        assert_eq!(action, ProcessAction::FalseAlarm);
        assert_eq!(note, "сусіди");
    }

    #[test]
    fn digits_pick_actions_only_in_list() {
        let mut dialog = ProcessDialog::new(alarm(1002, 1));
        press(&mut dialog, KeyCode::Char('6'));
        assert_eq!(dialog.chosen(), Some(ProcessAction::Other));
        press(&mut dialog, KeyCode::Char('9'));
        assert_eq!(dialog.chosen(), Some(ProcessAction::Other));

        press(&mut dialog, KeyCode::Tab);
        press(&mut dialog, KeyCode::Char('1'));
        assert_eq!(dialog.chosen(), Some(ProcessAction::Other));
        assert_eq!(dialog.note.value(), "1");
    }
}
