// ── Object list row colors ──
//
// Priority-ordered decision table over the four raw flags. Cases are
// checked top to bottom and the first match wins; several later cases
// are unreachable behind earlier ones and are kept so the table reads
// the same as the monitoring service's own client.

use super::severity::{ColorPair, Rgb, Theme, ThemeSettings};
use crate::model::StatusFlags;

const ARMED_CODE: i64 = 10;
const ALARM_CODE: i64 = 1;
const TECH_ALARM_CODE: i64 = 2;

/// Fixed palettes that have no message-code equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fixed {
    Disarmed,
    ArmedNoLink,
    AlarmDisarmed,
    Unmatched,
}

impl Fixed {
    fn colors(self, theme: Theme) -> ColorPair {
        let (text, row) = match (self, theme) {
            (Self::Disarmed, Theme::Dark) => ((230, 230, 250), (100, 15, 120)),
            (Self::Disarmed, Theme::Light) => ((255, 255, 255), (170, 14, 201)),
            (Self::ArmedNoLink, Theme::Dark) => ((255, 250, 180), (90, 90, 20)),
            (Self::ArmedNoLink, Theme::Light) => ((0, 0, 0), (225, 235, 35)),
            (Self::AlarmDisarmed, Theme::Dark) => ((200, 150, 210), (100, 15, 120)),
            (Self::AlarmDisarmed, Theme::Light) => ((74, 10, 87), (170, 14, 201)),
            (Self::Unmatched, Theme::Dark) => ((123, 123, 143), (55, 80, 38)),
            (Self::Unmatched, Theme::Light) => ((123, 23, 143), (55, 240, 38)),
        };
        ColorPair {
            text: Rgb::new(text.0, text.1, text.2),
            row: Rgb::new(row.0, row.1, row.2),
        }
    }
}

/// Which rule of the table produced a row's colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRule {
    Armed,
    Alarm,
    Disarmed,
    ArmedNoLink,
    AlarmDisarmed,
    AlarmPartArmed,
    TechAlarm,
    Unmatched,
}

/// Select the rule for a flag vector.
pub fn row_rule(flags: StatusFlags) -> RowRule {
    let StatusFlags {
        alarm,
        guard,
        tech_alarm: tech,
        conn,
    } = flags;

    match () {
        () if conn == 1 && alarm == 0 && (1..=3).contains(&guard) && tech == 0 => RowRule::Armed,
        () if conn == 1 && alarm == 1 && guard == 1 && tech >= 0 => RowRule::Alarm,
        () if conn == 1 && alarm == 0 && guard == 0 && tech == 0 => RowRule::Disarmed,
        () if conn == 0 && alarm == 0 && guard == 0 && tech == 0 => RowRule::Disarmed,
        () if conn == 1 && alarm == 0 && guard == 2 && tech == 0 => RowRule::Armed,
        () if conn == 0 && alarm == 0 && guard >= 1 && tech == 0 => RowRule::ArmedNoLink,
        () if conn == 0 && alarm == 1 && guard == 1 && tech == 0 => RowRule::Alarm,
        () if conn == 0 && alarm == 1 && guard == 0 && tech == 0 => RowRule::AlarmDisarmed,
        () if conn == 1 && alarm == 1 && guard == 2 && tech == 0 => RowRule::AlarmPartArmed,
        () if conn >= 0 && alarm == 0 && guard >= 1 && tech == 1 => RowRule::TechAlarm,
        () => RowRule::Unmatched,
    }
}

/// Row colors for an object, reading message-code palettes from the
/// current (possibly user-edited) severity tables.
pub fn row_colors(flags: StatusFlags, settings: &ThemeSettings, theme: Theme) -> ColorPair {
    match row_rule(flags) {
        RowRule::Armed => settings.classify(ARMED_CODE, theme),
        RowRule::Alarm => settings.classify(ALARM_CODE, theme),
        RowRule::TechAlarm => settings.classify(TECH_ALARM_CODE, theme),
        RowRule::AlarmPartArmed => {
            let armed = settings.classify(ARMED_CODE, theme);
            let text = match theme {
                Theme::Dark => Rgb::new(150, 130, 170),
                Theme::Light => Rgb::new(28, 10, 87),
            };
            ColorPair { text, ..armed }
        }
        RowRule::Disarmed => Fixed::Disarmed.colors(theme),
        RowRule::ArmedNoLink => Fixed::ArmedNoLink.colors(theme),
        RowRule::AlarmDisarmed => Fixed::AlarmDisarmed.colors(theme),
        RowRule::Unmatched => Fixed::Unmatched.colors(theme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flags(conn: i64, alarm: i64, guard: i64, tech: i64) -> StatusFlags {
        StatusFlags {
            alarm,
            guard,
            tech_alarm: tech,
            conn,
        }
    }

    #[test]
    fn decision_table_order() {
        let cases = [
            ((1, 0, 1, 0), RowRule::Armed),
            ((1, 0, 3, 0), RowRule::Armed),
            ((1, 1, 1, 0), RowRule::Alarm),
            // tech alarm does not demote an armed, connected alarm
            ((1, 1, 1, 1), RowRule::Alarm),
            ((1, 0, 0, 0), RowRule::Disarmed),
            ((0, 0, 0, 0), RowRule::Disarmed),
            ((0, 0, 1, 0), RowRule::ArmedNoLink),
            ((0, 0, 4, 0), RowRule::ArmedNoLink),
            ((0, 1, 1, 0), RowRule::Alarm),
            ((0, 1, 0, 0), RowRule::AlarmDisarmed),
            ((1, 1, 2, 0), RowRule::AlarmPartArmed),
            ((1, 0, 1, 1), RowRule::TechAlarm),
            ((0, 0, 1, 1), RowRule::TechAlarm),
            ((1, 0, 0, 1), RowRule::Unmatched),
            ((1, 1, 0, 0), RowRule::Unmatched),
            ((2, 0, 1, 0), RowRule::Unmatched),
        ];
        for ((conn, alarm, guard, tech), expected) in cases {
            assert_eq!(
                row_rule(flags(conn, alarm, guard, tech)),
                expected,
                "conn={conn} alarm={alarm} guard={guard} tech={tech}"
            );
        }
    }

    #[test]
    fn guard_two_is_caught_by_first_rule() {
        // Rule 5 repeats rule 1 for guard 2 and never fires on its own.
        assert_eq!(row_rule(flags(1, 0, 2, 0)), RowRule::Armed);
    }

    #[test]
    fn armed_row_follows_edited_severity_table() {
        let settings = ThemeSettings::new(Theme::Dark);
        let picked = Rgb::new(1, 100, 1);
        settings.set_color(10, Theme::Dark, picked);
        let colors = row_colors(flags(1, 0, 1, 0), &settings, Theme::Dark);
        assert_eq!(colors.row, picked);
    }

    #[test]
    fn alarm_part_armed_overrides_text_only() {
        let settings = ThemeSettings::new(Theme::Light);
        let colors = row_colors(flags(1, 1, 2, 0), &settings, Theme::Light);
        assert_eq!(colors.text, Rgb::new(28, 10, 87));
        assert_eq!(colors.row, settings.classify(10, Theme::Light).row);
    }

    #[test]
    fn unmatched_palette() {
        let settings = ThemeSettings::default();
        let colors = row_colors(flags(1, 0, 0, 1), &settings, Theme::Dark);
        assert_eq!(colors.text, Rgb::new(123, 123, 143));
        assert_eq!(colors.row, Rgb::new(55, 80, 38));
    }
}
