use crate::actions::SurvivalAction;
use crate::ai::update_zombies;
use crate::combat::{drain_deaths, resolve_combat, HitQueue};
use crate::config::SurvivalConfig;
use crate::events::SurvivalEvent;
use crate::player::{self, Controls};
use crate::projectile::update_projectiles;
use crate::shop;
use crate::state::SurvivalState;
use crate::structure::{self, update_structures};
use crate::wave::{self, update_wave};
use sim_core::{ActionEnvelope, Game, PlayerId, TerminalOutcome, Tick};
use survival_types::SurvivalObservation;
use tracing::{debug, info, warn};

/// Shake below this is snapped to zero.
const SHAKE_EPSILON: f32 = 0.1;

pub struct SurvivalGame {
    state: SurvivalState,
    seed: u64,
}

impl SurvivalGame {
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &SurvivalState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SurvivalState {
        &mut self.state
    }

    fn apply_action(&mut self, action: &SurvivalAction, events: &mut Vec<SurvivalEvent>) {
        let state = &mut self.state;
        let now = state.tick;

        match action {
            SurvivalAction::TogglePause => {
                if state.wave.phase.is_active() {
                    state.paused = !state.paused;
                    info!(paused = state.paused, "pause toggled");
                    events.push(SurvivalEvent::PauseToggled {
                        paused: state.paused,
                    });
                } else {
                    debug!("pause ignored outside a wave");
                }
            }
            // Input is still sampled while paused, commands are not.
            SurvivalAction::SetControls {
                movement,
                aim,
                fire_held,
            } => player::set_controls(
                state,
                Controls {
                    movement: *movement,
                    aim: *aim,
                    fire_held: *fire_held,
                },
            ),
            _ if state.paused => {}
            SurvivalAction::Reload => player::reload(state, now, events),
            SurvivalAction::SwitchWeapon(switch) => player::switch_weapon(state, *switch, events),
            SurvivalAction::ThrowGrenade => {
                let mut hits = std::mem::take(&mut state.pending_hits);
                player::throw_grenade(state, now, &mut hits, events);
                state.pending_hits.append(&mut hits);
            }
            SurvivalAction::StartWave => {
                if let Err(reason) = wave::start_wave(state, now, events) {
                    events.push(SurvivalEvent::StartWaveRejected { reason });
                }
            }
            SurvivalAction::Buy(item) => {
                if let Err(reason) = shop::purchase(state, *item, events) {
                    debug!(item = %item.name(), %reason, "purchase rejected");
                    events.push(SurvivalEvent::PurchaseRejected {
                        item: *item,
                        reason,
                    });
                }
            }
            SurvivalAction::PlaceStructure { kind, cell } => {
                if let Err(reason) = structure::place(state, *kind, *cell, events) {
                    debug!(kind = kind.name(), %reason, "placement rejected");
                    events.push(SurvivalEvent::PlaceRejected {
                        kind: *kind,
                        cell: *cell,
                        reason,
                    });
                }
            }
        }
    }
}

impl Game for SurvivalGame {
    type Config = SurvivalConfig;
    type Action = SurvivalAction;
    type Observation = SurvivalObservation;
    type Event = SurvivalEvent;

    /// An invalid config is replaced by the defaults.
    fn new(config: Self::Config, seed: u64) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!(%err, "invalid config, falling back to defaults");
                SurvivalConfig::default()
            }
        };
        Self {
            state: SurvivalState::new(config, seed),
            seed,
        }
    }

    fn step(
        &mut self,
        _tick: Tick,
        actions: &[ActionEnvelope<Self::Action>],
        out_events: &mut Vec<Self::Event>,
    ) {
        // 1. Input
        for action in actions {
            self.apply_action(&action.payload, out_events);
        }

        let state = &mut self.state;
        if state.paused || state.wave.phase.is_terminal() {
            return;
        }
        state.tick += 1;
        let tick = state.tick;

        // Hits queued by structures last tick land this tick.
        let mut hits = std::mem::take(&mut state.pending_hits);
        let mut deaths = Vec::new();

        // 2. Player movement
        player::move_player(state);

        // 3. Weapons and projectiles
        player::update_player_weapons(state, tick, &mut hits, out_events);
        update_projectiles(state, tick, &mut hits, out_events);

        // 4. Zombie AI
        update_zombies(state, tick, &mut hits);

        // 5. Combat, then deaths
        resolve_combat(state, &mut hits, &mut deaths, out_events);
        drain_deaths(state, &mut deaths, out_events);

        // 6. Wave and economy
        update_wave(state, tick, out_events);

        // 7. Structures
        let mut structure_hits = HitQueue::default();
        update_structures(state, tick, &mut structure_hits, out_events);
        state.pending_hits = structure_hits;

        // 8. End of frame
        state.world.sweep();
        state.camera_shake *= state.config.camera_shake_decay;
        if state.camera_shake < SHAKE_EPSILON {
            state.camera_shake = 0.0;
        }
    }

    fn observe(&self, _tick: Tick, _player: PlayerId) -> Self::Observation {
        crate::observe::build_observation(&self.state)
    }

    fn is_terminal(&self) -> Option<TerminalOutcome> {
        match self.state.wave.phase {
            wave::WavePhase::GameOver => Some(TerminalOutcome::Lose),
            wave::WavePhase::Victory => Some(TerminalOutcome::Win),
            _ => None,
        }
    }
}
