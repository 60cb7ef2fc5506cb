pub mod events;
pub mod host;

pub use events::{EventBuffer, EventCursor, SequencedEvent};
pub use host::{MatchHost, RunResult};
