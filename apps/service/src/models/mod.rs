pub mod event;
pub mod monitor;

pub use event::{Event, EventKind, NewEvent};
pub use monitor::{Monitor, MonitorStatus, Recipient};
