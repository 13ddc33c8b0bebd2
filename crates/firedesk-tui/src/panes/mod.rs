//! The three focusable panes and the two popups.

pub mod alarms;
pub mod detail;
pub mod events;
pub mod objects;
pub mod process;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::widgets::TableState;
use tui_input::InputRequest;

/// Pane that receives non-global keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneId {
    Objects,
    Alarms,
    Events,
}

impl PaneId {
    #[cfg(test)]
    pub const ALL: [Self; 3] = [Self::Objects, Self::Alarms, Self::Events];

    pub fn next(self) -> Self {
        match self {
            Self::Objects => Self::Alarms,
            Self::Alarms => Self::Events,
            Self::Events => Self::Objects,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Objects => Self::Events,
            Self::Alarms => Self::Objects,
            Self::Events => Self::Alarms,
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────

/// Text-field editing keys shared by the search bar and the note field.
pub fn input_request(key: KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

/// List navigation keys shared by the table panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    By(isize),
    First,
    Last,
}

pub fn nav_key(key: KeyEvent) -> Option<Nav> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Nav::By(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(Nav::By(-1)),
        KeyCode::PageDown => Some(Nav::By(10)),
        KeyCode::PageUp => Some(Nav::By(-10)),
        KeyCode::Char('g') | KeyCode::Home => Some(Nav::First),
        KeyCode::Char('G') | KeyCode::End => Some(Nav::Last),
        _ => None,
    }
}

/// Move a table selection over `len` rows; an empty table has none.
pub fn apply_nav(state: &mut TableState, len: usize, nav: Nav) {
    if len == 0 {
        state.select(None);
        return;
    }
    let last = len - 1;
    let current = state.selected().unwrap_or(0).min(last);
    let next = match nav {
        Nav::By(delta) => current.saturating_add_signed(delta).min(last),
        Nav::First => 0,
        Nav::Last => last,
    };
    state.select(Some(next));
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}


#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventKind;

    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut key = KeyEvent::new(code, modifiers);
        key.kind = KeyEventKind::Press;
        key
    }

    #[test]
    fn focus_cycle_visits_every_pane() {
        let mut seen = vec![PaneId::Objects];
        let mut pane = PaneId::Objects;
        for _ in 0..2 {
            pane = pane.next();
            seen.push(pane);
        }
        assert_eq!(seen, PaneId::ALL.to_vec());
        assert_eq!(PaneId::Objects.prev().next(), PaneId::Objects);
    }

    #[test]
    fn navigation_clamps_to_table() {
        let mut state = TableState::default();
        apply_nav(&mut state, 3, Nav::By(-1));
        assert_eq!(state.selected(), Some(0));
        apply_nav(&mut state, 3, Nav::By(10));
        assert_eq!(state.selected(), Some(2));
        apply_nav(&mut state, 3, Nav::First);
        assert_eq!(state.selected(), Some(0));
        apply_nav(&mut state, 0, Nav::Last);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn input_keys_ignore_control_chords() {
        assert_eq!(
            input_request(key(KeyCode::Char('ш'), KeyModifiers::NONE)),
            Some(InputRequest::InsertChar('ш'))
        );
        assert_eq!(
            input_request(key(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            Some(InputRequest::DeletePrevWord)
        );
        assert_eq!(input_request(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn centered_rect_is_clipped() {
        let area = Rect::new(0, 0, 40, 10);
        let inner = centered(area, 20, 4);
        assert_eq!((inner.x, inner.y, inner.width, inner.height), (10, 3, 20, 4));
        assert_eq!(centered(area, 100, 100), area);
    }
}
