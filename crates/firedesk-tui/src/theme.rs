//! Console chrome palette, plus conversion of the severity colors into
//! ratatui styles.
//!
//! Row colors always come from the shared `ThemeSettings`; only borders,
//! titles and hints use the constants below.

use ratatui::style::{Color, Modifier, Style};

use firedesk_core::{ColorPair, Rgb};

// ── Chrome palette ────────────────────────────────────────────────────

pub const SIGNAL_RED: Color = Color::Rgb(255, 85, 85); // #ff5555
pub const AMBER: Color = Color::Rgb(255, 184, 108); // #ffb86c
pub const STEEL_CYAN: Color = Color::Rgb(139, 233, 253); // #8be9fd
pub const SAFE_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Severity colors ───────────────────────────────────────────────────

pub fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Text on row background.
pub fn pair_style(pair: ColorPair) -> Style {
    Style::default().fg(color(pair.text)).bg(color(pair.row))
}

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(STEEL_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(AMBER)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn border(focused: bool) -> Style {
    if focused { border_focused() } else { border_default() }
}

pub fn table_header() -> Style {
    Style::default()
        .fg(STEEL_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Applied on top of the row's own colors, so the severity stays visible.
pub fn table_selected() -> Style {
    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn value() -> Style {
    Style::default().fg(DIM_WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_pair_maps_both_channels() {
        let style = pair_style(ColorPair {
            text: Rgb::new(1, 2, 3),
            row: Rgb::new(4, 5, 6),
        });
        assert_eq!(style.fg, Some(Color::Rgb(1, 2, 3)));
        assert_eq!(style.bg, Some(Color::Rgb(4, 5, 6)));
    }
}
