// ── Domain model ──

pub mod alarm;
pub mod event;
pub mod object;

pub use alarm::{Alarm, AlarmKind, ProcessAction, Processing};
pub use event::{Event, EventKind};
pub use object::{
    Contact, ExternalData, Object, ObjectDetail, ObjectId, PowerSource, StatusFlags, TestMessage,
    Zone, ZoneStatus, parse_object_id,
};
