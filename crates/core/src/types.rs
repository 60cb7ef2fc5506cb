/// Simulation step counter. Tick 0 is the state before the first step.
pub type Tick = u64;

/// Identifies a participant that submits actions to a match.
pub type PlayerId = u8;

/// Per-player action sequence number, used to order actions within a tick.
pub type ActionId = u64;
