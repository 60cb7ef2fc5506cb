use crate::types::{ActionId, PlayerId, Tick};

/// An action tagged with its origin and the tick it should apply on.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionEnvelope<A> {
    pub player_id: PlayerId,
    pub action_id: ActionId,
    pub intended_tick: Tick,
    pub payload: A,
}

impl<A> ActionEnvelope<A> {
    pub fn new(player_id: PlayerId, action_id: ActionId, intended_tick: Tick, payload: A) -> Self {
        Self {
            player_id,
            action_id,
            intended_tick,
            payload,
        }
    }
}
