// ── Status vector mapping ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Coarse object status. Precedence: Offline > Fire > Fault > Normal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum ObjectStatus {
    Normal,
    Fault,
    Fire,
    Offline,
}

impl ObjectStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "НОРМА",
            Self::Fault => "НЕСПРАВНІСТЬ",
            Self::Fire => "ПОЖЕЖА",
            Self::Offline => "НЕМАЄ ЗВ'ЯЗКУ",
        }
    }
}

/// Collapse the raw flags into one status.
pub fn map_status(alarm: i64, tech_alarm: i64, conn: i64) -> ObjectStatus {
    if conn == 0 {
        ObjectStatus::Offline
    } else if alarm > 0 {
        ObjectStatus::Fire
    } else if tech_alarm > 0 {
        ObjectStatus::Fault
    } else {
        ObjectStatus::Normal
    }
}

/// Status text for the object list. Derived from the flags directly so
/// it can be checked against [`map_status`].
pub fn status_label(alarm: i64, tech_alarm: i64, conn: i64) -> &'static str {
    match (conn == 0, alarm > 0, tech_alarm > 0) {
        (true, _, _) => "НЕМАЄ ЗВ'ЯЗКУ",
        (false, true, _) => "ПОЖЕЖА",
        (false, false, true) => "НЕСПРАВНІСТЬ",
        (false, false, false) => "НОРМА",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_outranks_alarm_and_fault() {
        assert_eq!(map_status(1, 1, 0), ObjectStatus::Offline);
    }

    #[test]
    fn precedence_over_all_flag_combinations() {
        for alarm in [0, 1] {
            for tech in [0, 1] {
                for conn in [0, 1] {
                    let status = map_status(alarm, tech, conn);
                    let expected = if conn == 0 {
                        ObjectStatus::Offline
                    } else if alarm == 1 {
                        ObjectStatus::Fire
                    } else if tech == 1 {
                        ObjectStatus::Fault
                    } else {
                        ObjectStatus::Normal
                    };
                    assert_eq!(status, expected, "alarm={alarm} tech={tech} conn={conn}");
                    assert_eq!(
                        status_label(alarm, tech, conn),
                        status.label(),
                        "label disagrees for alarm={alarm} tech={tech} conn={conn}"
                    );
                }
            }
        }
    }

    #[test]
    fn bitfield_values_count_as_active() {
        assert_eq!(map_status(4, 0, 3), ObjectStatus::Fire);
        assert_eq!(map_status(0, 2, 1), ObjectStatus::Fault);
    }
}
