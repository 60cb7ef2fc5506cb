use crate::envelope::ActionEnvelope;
use crate::types::{PlayerId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminalOutcome {
    Win,
    Lose,
}

/// A deterministic fixed-timestep simulation.
///
/// Implementations must produce identical event streams for identical
/// `(config, seed, actions)` inputs. All randomness is derived from `seed`.
pub trait Game: Sized {
    type Config: Clone + Send + Sync + 'static;
    type Action: Clone + Send + Sync + 'static;
    type Observation: Clone + Send + Sync + 'static;
    type Event: Clone + Send + Sync + 'static;

    fn new(config: Self::Config, seed: u64) -> Self;

    /// Advance the simulation by exactly one tick.
    ///
    /// `actions` are already ordered by `(player_id, action_id)`.
    fn step(
        &mut self,
        tick: Tick,
        actions: &[ActionEnvelope<Self::Action>],
        out_events: &mut Vec<Self::Event>,
    );

    fn observe(&self, tick: Tick, player: PlayerId) -> Self::Observation;

    fn is_terminal(&self) -> Option<TerminalOutcome>;
}
