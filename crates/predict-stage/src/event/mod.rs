//! Bitácora de eventos del stage (append-only, en orden de emisión).

mod store;
mod types;

pub use store::{EventLog, InMemoryEventLog, DEFAULT_RECORD_CAPACITY};
pub use types::{StageEvent, StageEventKind};
