// ── Cache components ──
//
// One component per panel. Each owns its state exclusively, guards its
// refresh with a `SingleFlight`, and exposes read-only snapshots.

pub mod alarms;
pub mod events;
pub mod objects;

pub use alarms::{AlarmDiffer, AlarmPoll, AlarmSnapshot, ProcessOutcome};
pub use events::{Bootstrap, DEFAULT_EVENT_CAPACITY, EventCache, EventFilter, EventLog, Period};
pub use objects::{FilterCounts, ObjectCache, ObjectFilter, ObjectQuery, ObjectView};
