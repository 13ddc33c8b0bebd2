// ── Severity classification ──
//
// Message code → (text, row) colors, one table per theme. The tables
// live in a `ThemeSettings` value shared by every renderer; readers load
// a snapshot lock-free while the color settings screen swaps in edits.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;

// ── Colors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = CoreError;

    /// Accepts `#rrggbb` or `rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Config {
            message: format!("invalid color '{s}', expected #rrggbb"),
        };
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Foreground and background of one rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorPair {
    pub text: Rgb,
    pub row: Rgb,
}

const fn pair(text: (u8, u8, u8), row: (u8, u8, u8)) -> ColorPair {
    ColorPair {
        text: Rgb::new(text.0, text.1, text.2),
        row: Rgb::new(row.0, row.1, row.2),
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

// ── Message categories ───────────────────────────────────────────────

/// Semantic class of a message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MessageCategory {
    Alarm,
    TechAlarm,
    Restore,
    Info,
    PartArmedOn,
    ArmedOn,
    ConnFailed,
    PartArmedOff,
    Unmapped,
}

impl MessageCategory {
    pub fn of_code(code: i64) -> Self {
        match code {
            1 => Self::Alarm,
            2 => Self::TechAlarm,
            5 | 9 | 13 | 17 => Self::Restore,
            6 => Self::Info,
            7 | 8 => Self::PartArmedOn,
            10 => Self::ArmedOn,
            12 => Self::ConnFailed,
            14 | 18 => Self::PartArmedOff,
            _ => Self::Unmapped,
        }
    }

    pub fn codes(self) -> &'static [i64] {
        match self {
            Self::Alarm => &[1],
            Self::TechAlarm => &[2],
            Self::Restore => &[5, 9, 13, 17],
            Self::Info => &[6],
            Self::PartArmedOn => &[7, 8],
            Self::ArmedOn => &[10],
            Self::ConnFailed => &[12],
            Self::PartArmedOff => &[14, 18],
            Self::Unmapped => &[],
        }
    }

    fn builtin(self, theme: Theme) -> ColorPair {
        match (theme, self) {
            (Theme::Light, Self::Alarm) => pair((255, 245, 245), (200, 45, 45)),
            (Theme::Light, Self::TechAlarm) => pair((30, 30, 30), (245, 180, 90)),
            (Theme::Light, Self::Restore) => pair((30, 30, 30), (190, 195, 205)),
            (Theme::Light, Self::Info | Self::Unmapped) => pair((30, 30, 30), (255, 255, 255)),
            (Theme::Light, Self::PartArmedOn) => pair((0, 95, 65), (245, 247, 248)),
            (Theme::Light, Self::ArmedOn) => pair((240, 255, 245), (90, 160, 120)),
            (Theme::Light, Self::ConnFailed) => pair((40, 40, 40), (255, 230, 140)),
            (Theme::Light, Self::PartArmedOff) => pair((255, 255, 255), (150, 140, 60)),

            (Theme::Dark, Self::Alarm) => pair((255, 220, 220), (140, 30, 30)),
            (Theme::Dark, Self::TechAlarm) => pair((255, 240, 210), (160, 110, 30)),
            (Theme::Dark, Self::Restore) => pair((210, 215, 220), (75, 80, 90)),
            (Theme::Dark, Self::Info | Self::Unmapped) => pair((220, 220, 220), (45, 45, 48)),
            (Theme::Dark, Self::PartArmedOn) => pair((180, 235, 210), (40, 70, 55)),
            (Theme::Dark, Self::ArmedOn) => pair((200, 245, 220), (55, 110, 85)),
            (Theme::Dark, Self::ConnFailed) => pair((255, 245, 210), (125, 105, 35)),
            (Theme::Dark, Self::PartArmedOff) => pair((240, 240, 200), (100, 95, 40)),
        }
    }
}

/// A named set of codes edited together on the color settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorGroup {
    pub name: &'static str,
    pub codes: &'static [i64],
}

pub const COLOR_GROUPS: [ColorGroup; 7] = [
    ColorGroup { name: "Тривога", codes: &[1] },
    ColorGroup { name: "Технічна тривога", codes: &[2] },
    ColorGroup { name: "Відновлення / Норма", codes: &[5, 9, 13, 17] },
    ColorGroup { name: "Інформаційні події", codes: &[6] },
    ColorGroup { name: "Під охороною", codes: &[7, 8, 10] },
    ColorGroup { name: "Немає зв'язку", codes: &[12] },
    ColorGroup { name: "Частково знято / інший стан", codes: &[14, 18] },
];

// ── Tables ───────────────────────────────────────────────────────────

/// One theme's code → colors table plus its fallback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityTable {
    entries: BTreeMap<i64, ColorPair>,
    fallback: ColorPair,
}

impl SeverityTable {
    /// The built-in constants for `theme`.
    pub fn builtin(theme: Theme) -> Self {
        let mut entries = BTreeMap::new();
        for code in [1, 2, 5, 6, 7, 8, 9, 10, 12, 13, 14, 17, 18] {
            entries.insert(code, MessageCategory::of_code(code).builtin(theme));
        }
        Self {
            entries,
            fallback: MessageCategory::Unmapped.builtin(theme),
        }
    }

    pub fn get(&self, code: i64) -> ColorPair {
        self.entries.get(&code).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> ColorPair {
        self.fallback
    }

    pub fn entries(&self) -> impl Iterator<Item = (i64, ColorPair)> + '_ {
        self.entries.iter().map(|(code, colors)| (*code, *colors))
    }
}

/// Process-wide, injectable color preferences.
pub struct ThemeSettings {
    light: ArcSwap<SeverityTable>,
    dark: ArcSwap<SeverityTable>,
    dark_active: AtomicBool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl fmt::Debug for ThemeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeSettings")
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

impl ThemeSettings {
    pub fn new(active: Theme) -> Self {
        Self {
            light: ArcSwap::from_pointee(SeverityTable::builtin(Theme::Light)),
            dark: ArcSwap::from_pointee(SeverityTable::builtin(Theme::Dark)),
            dark_active: AtomicBool::new(active == Theme::Dark),
        }
    }

    fn slot(&self, theme: Theme) -> &ArcSwap<SeverityTable> {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }

    pub fn active(&self) -> Theme {
        if self.dark_active.load(Ordering::Relaxed) {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn set_active(&self, theme: Theme) {
        self.dark_active
            .store(theme == Theme::Dark, Ordering::Relaxed);
    }

    /// Flip between light and dark; returns the new theme.
    pub fn toggle(&self) -> Theme {
        let was_dark = self.dark_active.fetch_xor(true, Ordering::Relaxed);
        if was_dark { Theme::Light } else { Theme::Dark }
    }

    /// Snapshot of one theme's table.
    pub fn table(&self, theme: Theme) -> Arc<SeverityTable> {
        self.slot(theme).load_full()
    }

    pub fn classify(&self, code: i64, theme: Theme) -> ColorPair {
        self.slot(theme).load().get(code)
    }

    /// [`classify`](Self::classify) against the active theme.
    pub fn classify_active(&self, code: i64) -> ColorPair {
        self.classify(code, self.active())
    }

    /// Replace one entry's background. The text color stays, or comes
    /// from the built-in table when the code had no entry yet.
    pub fn set_color(&self, code: i64, theme: Theme, row: Rgb) {
        self.slot(theme).rcu(|current| {
            let mut next = SeverityTable::clone(current);
            let text = next
                .entries
                .get(&code)
                .map_or_else(|| SeverityTable::builtin(theme).get(code).text, |c| c.text);
            next.entries.insert(code, ColorPair { text, row });
            next
        });
    }

    /// [`set_color`](Self::set_color) for every code in a group.
    pub fn set_group_color(&self, group: &ColorGroup, theme: Theme, row: Rgb) {
        for &code in group.codes {
            self.set_color(code, theme, row);
        }
    }

    /// Restore one theme's table to the built-in constants.
    pub fn reset_to_default(&self, theme: Theme) {
        self.slot(theme)
            .store(Arc::new(SeverityTable::builtin(theme)));
    }

    /// Backgrounds that differ from the built-in table, for persisting.
    pub fn overrides(&self, theme: Theme) -> BTreeMap<i64, Rgb> {
        let builtin = SeverityTable::builtin(theme);
        self.table(theme)
            .entries()
            .filter(|(code, colors)| builtin.entries.get(code) != Some(colors))
            .map(|(code, colors)| (code, colors.row))
            .collect()
    }
}
