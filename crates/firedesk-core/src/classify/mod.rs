// ── Classification ──
//
// Pure mappings from raw store codes to statuses and colors.

pub mod object_colors;
pub mod severity;
pub mod status;

pub use object_colors::{RowRule, row_colors, row_rule};
pub use severity::{
    COLOR_GROUPS, ColorGroup, ColorPair, MessageCategory, Rgb, SeverityTable, Theme, ThemeSettings,
};
pub use status::{ObjectStatus, map_status, status_label};
