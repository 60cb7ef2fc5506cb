use crate::ai::Zombie;
use crate::config::{SurvivalConfig, ZombieKind};
use crate::events::SurvivalEvent;
use crate::state::SurvivalState;
use crate::world::{Body, EntityId};
use glam::Vec2;
use rand::Rng;
use sim_core::Tick;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Between waves. The shop is open and the player decides when to start.
    Shopping,
    Spawning,
    InProgress,
    /// Reward granted; the shop reopens on the next tick.
    Cleared { reward: u32 },
    GameOver,
    Victory,
}

impl WavePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, WavePhase::GameOver | WavePhase::Victory)
    }

    /// Zombies may be on the field.
    pub fn is_active(self) -> bool {
        matches!(self, WavePhase::Spawning | WavePhase::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartWaveError {
    /// A wave is already running or has just been cleared.
    WaveInProgress,
    GameOver,
}

impl fmt::Display for StartWaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartWaveError::WaveInProgress => write!(f, "a wave is already in progress"),
            StartWaveError::GameOver => write!(f, "the game is over"),
        }
    }
}

impl std::error::Error for StartWaveError {}

#[derive(Clone, Debug)]
pub struct WaveState {
    /// Current wave number, 0 before the first wave starts.
    pub wave: u32,
    pub phase: WavePhase,
    pub quota: u32,
    pub spawned: u32,
    pub remaining_to_spawn: u32,
    pub next_spawn_tick: Tick,
    pub spawn_interval: Tick,
    pub boss_wave: bool,
    /// Boss still waiting to enter the arena.
    pub boss_pending: bool,
    /// Live boss, if one has spawned and not died.
    pub boss: Option<EntityId>,
    /// Every zombie of this wave that has spawned and not died, boss included.
    pub alive: BTreeSet<EntityId>,
}

impl WaveState {
    pub fn new() -> Self {
        Self {
            wave: 0,
            phase: WavePhase::Shopping,
            quota: 0,
            spawned: 0,
            remaining_to_spawn: 0,
            next_spawn_tick: 0,
            spawn_interval: 0,
            boss_wave: false,
            boss_pending: false,
            boss: None,
            alive: BTreeSet::new(),
        }
    }

    /// Forgets a dead zombie. Safe to call more than once.
    pub fn on_zombie_death(&mut self, id: EntityId) {
        self.alive.remove(&id);
        if self.boss == Some(id) {
            self.boss = None;
        }
    }

    pub fn is_spawning_done(&self) -> bool {
        self.remaining_to_spawn == 0 && !self.boss_pending
    }

    pub fn is_clear(&self) -> bool {
        self.is_spawning_done() && self.alive.is_empty() && self.boss.is_none()
    }
}

impl Default for WaveState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shopping -> Spawning. Returns the number of the wave that started.
pub fn start_wave(
    state: &mut SurvivalState,
    tick: Tick,
    events: &mut Vec<SurvivalEvent>,
) -> Result<u32, StartWaveError> {
    match state.wave.phase {
        WavePhase::Shopping => {}
        WavePhase::GameOver | WavePhase::Victory => return Err(StartWaveError::GameOver),
        _ => return Err(StartWaveError::WaveInProgress),
    }

    let waves = &state.config.waves;
    let wave = state.wave.wave + 1;
    let quota = waves.quota(wave);
    let boss_wave = waves.is_boss_wave(wave);
    let spawn_interval = state.config.ms_to_ticks(waves.spawn_interval_for(wave));

    state.wave.wave = wave;
    state.wave.phase = WavePhase::Spawning;
    state.wave.quota = quota;
    state.wave.spawned = 0;
    state.wave.remaining_to_spawn = quota;
    state.wave.next_spawn_tick = tick;
    state.wave.spawn_interval = spawn_interval;
    state.wave.boss_wave = boss_wave;
    state.wave.boss_pending = boss_wave;
    state.wave.boss = None;
    state.wave.alive.clear();

    info!(wave, quota, boss_wave, "wave started");
    events.push(SurvivalEvent::WaveStarted {
        wave,
        quota,
        boss: boss_wave,
    });
    Ok(wave)
}

/// Advances the wave state machine by one tick.
pub fn update_wave(state: &mut SurvivalState, tick: Tick, events: &mut Vec<SurvivalEvent>) {
    let player_dead = state
        .world
        .get(state.player)
        .map_or(true, |p| p.health.is_depleted());
    if state.wave.phase.is_active() && player_dead {
        state.wave.phase = WavePhase::GameOver;
        info!(wave = state.wave.wave, "game over");
        events.push(SurvivalEvent::GameOver {
            wave: state.wave.wave,
        });
        return;
    }

    match state.wave.phase {
        WavePhase::Shopping | WavePhase::GameOver | WavePhase::Victory => {}
        WavePhase::Spawning => {
            if tick >= state.wave.next_spawn_tick {
                if state.wave.remaining_to_spawn > 0 {
                    let kind = roll_zombie_kind(&mut state.rng, state.config.waves.special_chance);
                    spawn_zombie(state, kind, events);
                    state.wave.remaining_to_spawn -= 1;
                    state.wave.spawned += 1;
                } else if state.wave.boss_pending {
                    let id = spawn_zombie(state, ZombieKind::Boss, events);
                    state.wave.boss_pending = false;
                    state.wave.boss = Some(id);
                    info!(wave = state.wave.wave, boss = ?id, "boss spawned");
                    events.push(SurvivalEvent::BossSpawned {
                        id,
                        wave: state.wave.wave,
                    });
                }
                state.wave.next_spawn_tick = tick + state.wave.spawn_interval;
            }

            if state.wave.is_spawning_done() {
                state.wave.phase = WavePhase::InProgress;
                debug!(wave = state.wave.wave, "spawning complete");
                events.push(SurvivalEvent::SpawningComplete {
                    wave: state.wave.wave,
                });
            }
        }
        WavePhase::InProgress => {
            if !state.wave.is_clear() {
                return;
            }
            let wave = state.wave.wave;
            let reward = state.config.waves.clear_reward(wave);
            state.economy.credit(reward);

            info!(wave, reward, cash = state.economy.cash(), "wave cleared");
            events.push(SurvivalEvent::WaveCleared { wave, reward });
            events.push(SurvivalEvent::CashCredited {
                amount: reward,
                balance: state.economy.cash(),
            });

            if state.config.waves_total.is_some_and(|total| wave >= total) {
                state.wave.phase = WavePhase::Victory;
                info!(waves = wave, "victory");
                events.push(SurvivalEvent::Victory { waves: wave });
            } else {
                state.wave.phase = WavePhase::Cleared { reward };
            }
        }
        WavePhase::Cleared { .. } => {
            state.wave.phase = WavePhase::Shopping;
            events.push(SurvivalEvent::ShopOpened {
                next_wave: state.wave.wave + 1,
            });
        }
    }
}

/// Normal, or with `special_chance` a Fast or Tank zombie picked evenly.
/// Chances outside [0, 1] are clamped; NaN counts as 0.
pub fn roll_zombie_kind<R: Rng>(rng: &mut R, special_chance: f64) -> ZombieKind {
    let chance = if special_chance.is_nan() {
        0.0
    } else {
        special_chance.clamp(0.0, 1.0)
    };
    if rng.gen_bool(chance) {
        if rng.gen_bool(0.5) {
            ZombieKind::Fast
        } else {
            ZombieKind::Tank
        }
    } else {
        ZombieKind::Normal
    }
}

/// A point along the right edge of the world, inset by the spawn margin.
pub fn spawn_point<R: Rng>(rng: &mut R, config: &SurvivalConfig) -> Vec2 {
    let margin = config.waves.spawn_margin;
    let x = (config.world_width - margin).max(0.0);
    let low = margin.min(config.world_height / 2.0);
    let high = (config.world_height - margin).max(low);
    let y = if high > low {
        rng.gen_range(low..high)
    } else {
        low
    };
    Vec2::new(x, y)
}

pub fn spawn_zombie(
    state: &mut SurvivalState,
    kind: ZombieKind,
    events: &mut Vec<SurvivalEvent>,
) -> EntityId {
    let pos = spawn_point(&mut state.rng, &state.config);
    let spec = state.config.zombie(kind);
    let zombie = Zombie::new(kind, spec, state.config.ms_to_ticks(spec.attack_interval_ms));
    let (radius, health) = (spec.radius, spec.health);

    let id = state.world.spawn(pos, radius, health, Body::Zombie(zombie));
    state.wave.alive.insert(id);
    events.push(SurvivalEvent::ZombieSpawned { id, kind, pos });
    id
}
