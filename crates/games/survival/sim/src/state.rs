use crate::combat::HitQueue;
use crate::config::SurvivalConfig;
use crate::economy::Economy;
use crate::player::Player;
use crate::wave::WaveState;
use crate::world::{Body, Entity, EntityId, PlacementGrid, World};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::Tick;

/// Everything the simulation owns.
#[derive(Clone, Debug)]
pub struct SurvivalState {
    pub config: SurvivalConfig,
    /// Simulation tick. Stands still while paused, so every deadline
    /// (cooldowns, reloads, fuses, spawns) freezes with it.
    pub tick: Tick,
    pub world: World,
    pub player: EntityId,
    pub wave: WaveState,
    pub economy: Economy,
    pub rng: ChaCha8Rng,
    /// Hits produced after combat resolution, applied next tick.
    pub pending_hits: HitQueue,
    pub camera_shake: f32,
    pub paused: bool,
}

impl SurvivalState {
    pub fn new(config: SurvivalConfig, seed: u64) -> Self {
        let grid = PlacementGrid::new(config.grid_width(), config.grid_height(), config.cell_size);
        let mut world = World::new(config.world_width, config.world_height, grid);

        let center = Vec2::new(config.world_width / 2.0, config.world_height / 2.0);
        let player = world.spawn(
            center,
            config.player.radius,
            config.player.health,
            Body::Player(Player::new(&config)),
        );

        Self {
            economy: Economy::new(config.starting_cash),
            config,
            tick: 0,
            world,
            player,
            wave: WaveState::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending_hits: HitQueue::default(),
            camera_shake: 0.0,
            paused: false,
        }
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.world.get(self.player)
    }

    pub fn player_alive(&self) -> bool {
        self.world.is_alive(self.player)
    }
}
