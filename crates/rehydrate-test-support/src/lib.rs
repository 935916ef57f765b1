//! Shared test mocks and utilities for the Rehydrate workspace.

mod clock;
mod log;
mod records;

pub use clock::{FixedClock, fixed_now};
pub use log::{
    ConflictingEventLog, EmptyEventLog, FailingEventLog, RecordedAppend, RecordingEventLog,
    StalledEventLog,
};
pub use records::stored_event;
