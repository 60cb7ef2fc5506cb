use crate::combat::{ContactHit, HitQueue};
use crate::config::{ZombieKind, ZombieSpec};
use crate::state::SurvivalState;
use crate::world::{circles_overlap, Body, Entity, EntityId, EntityKind};
use glam::Vec2;
use sim_core::Tick;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZombieState {
    /// Walking toward the nearest target.
    Seeking,
    /// Standing still and hitting `target` whenever the cooldown allows.
    Attacking { target: EntityId },
    Dead,
}

impl ZombieState {
    pub fn name(self) -> &'static str {
        match self {
            ZombieState::Seeking => "seeking",
            ZombieState::Attacking { .. } => "attacking",
            ZombieState::Dead => "dead",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slow {
    pub factor: f32,
    pub until: Tick,
}

#[derive(Clone, Debug)]
pub struct Zombie {
    pub kind: ZombieKind,
    pub state: ZombieState,
    pub speed: f32,
    pub contact_damage: i32,
    pub attack_range: f32,
    pub attack_interval: Tick,
    pub next_attack_tick: Tick,
    pub cash_reward: u32,
    pub slow: Option<Slow>,
}

impl Zombie {
    /// `attack_interval` is in ticks.
    pub fn new(kind: ZombieKind, spec: &ZombieSpec, attack_interval: Tick) -> Self {
        Self {
            kind,
            state: ZombieState::Seeking,
            speed: spec.speed,
            contact_damage: spec.contact_damage,
            attack_range: spec.attack_range,
            attack_interval,
            next_attack_tick: 0,
            cash_reward: spec.cash_reward,
            slow: None,
        }
    }

    pub fn speed_multiplier(&self, now: Tick) -> f32 {
        match self.slow {
            Some(slow) if now < slow.until => slow.factor,
            _ => 1.0,
        }
    }

    /// Applies a slow, keeping the stronger factor and the later expiry.
    pub fn apply_slow(&mut self, factor: f32, until: Tick) {
        self.slow = Some(match self.slow {
            Some(prev) => Slow {
                factor: prev.factor.min(factor),
                until: prev.until.max(until),
            },
            None => Slow { factor, until },
        });
    }
}

/// Snapshot of something a zombie may attack.
#[derive(Clone, Copy, Debug)]
struct Target {
    id: EntityId,
    pos: Vec2,
    radius: f32,
}

impl Target {
    fn of(id: EntityId, entity: &Entity) -> Self {
        Self {
            id,
            pos: entity.pos,
            radius: entity.radius,
        }
    }

    fn gap(&self, pos: Vec2, radius: f32) -> f32 {
        pos.distance(self.pos) - radius - self.radius
    }
}

/// Nearest target by body gap. The player is considered first and only a
/// strictly closer structure replaces it.
fn nearest_target(
    pos: Vec2,
    radius: f32,
    player: Option<Target>,
    blockers: &[Target],
) -> Option<Target> {
    let mut best: Option<(Target, f32)> = player.map(|p| (p, p.gap(pos, radius)));
    for &blocker in blockers {
        let gap = blocker.gap(pos, radius);
        let closer = match best {
            None => true,
            Some((_, best_gap)) => gap < best_gap,
        };
        if closer {
            best = Some((blocker, gap));
        }
    }
    best.map(|(t, _)| t)
}

/// Runs one tick of the zombie state machine for every live zombie.
pub fn update_zombies(state: &mut SurvivalState, tick: Tick, hits: &mut HitQueue) {
    let dt = state.config.dt();

    let player = state
        .world
        .get(state.player)
        .filter(|e| e.is_alive())
        .map(|e| Target::of(state.player, e));

    let mut blockers: Vec<Target> = Vec::new();
    state.world.for_each_alive(EntityKind::Structure, |id, entity| {
        if entity.as_structure().is_some_and(|s| s.kind.is_blocking()) {
            blockers.push(Target::of(id, entity));
        }
    });

    for id in state.world.ids(EntityKind::Zombie) {
        let Some(entity) = state.world.get_mut(id) else {
            continue;
        };
        let pos = entity.pos;
        let radius = entity.radius;
        let Body::Zombie(zombie) = &mut entity.body else {
            continue;
        };

        if zombie.slow.is_some_and(|s| tick >= s.until) {
            zombie.slow = None;
        }

        // Drop a target that died or walked out of reach.
        if let ZombieState::Attacking { target } = zombie.state {
            let still_valid = player
                .iter()
                .chain(blockers.iter())
                .find(|t| t.id == target)
                .is_some_and(|t| t.gap(pos, radius) <= zombie.attack_range);
            if !still_valid {
                zombie.state = ZombieState::Seeking;
            }
        }

        if zombie.state == ZombieState::Seeking {
            let Some(target) = nearest_target(pos, radius, player, &blockers) else {
                entity.vel = Vec2::ZERO;
                continue;
            };

            if target.gap(pos, radius) <= zombie.attack_range {
                zombie.state = ZombieState::Attacking { target: target.id };
            } else {
                let dir = (target.pos - pos).normalize_or_zero();
                let speed = zombie.speed * zombie.speed_multiplier(tick);
                let next = pos + dir * speed * dt;

                match blockers
                    .iter()
                    .find(|b| circles_overlap(next, radius, b.pos, b.radius))
                {
                    Some(blocker) => {
                        zombie.state = ZombieState::Attacking { target: blocker.id };
                        entity.vel = Vec2::ZERO;
                    }
                    None => {
                        entity.pos = next;
                        entity.vel = dir * speed;
                    }
                }
                continue;
            }
        }

        if let ZombieState::Attacking { target } = zombie.state {
            entity.vel = Vec2::ZERO;
            if tick >= zombie.next_attack_tick {
                zombie.next_attack_tick = tick + zombie.attack_interval;
                hits.contact.push(ContactHit {
                    attacker: id,
                    target,
                    damage: zombie.contact_damage,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StructureKind, SurvivalConfig};
    use crate::structure::Structure;
    use crate::world::Cell;

    fn setup() -> SurvivalState {
        SurvivalState::new(SurvivalConfig::default(), 11)
    }

    fn spawn_zombie(state: &mut SurvivalState, pos: Vec2) -> EntityId {
        let config = state.config.clone();
        let spec = config.zombie(ZombieKind::Normal);
        let interval = config.ms_to_ticks(spec.attack_interval_ms);
        let zombie = Zombie::new(ZombieKind::Normal, spec, interval);
        state.world.spawn(pos, spec.radius, spec.health, Body::Zombie(zombie))
    }

    fn spawn_wall(state: &mut SurvivalState, cell: Cell) -> EntityId {
        let pos = state.world.grid.cell_center(cell);
        let radius = state.config.cell_size / 2.0;
        let health = state.config.wall.health;
        state.world.spawn(
            pos,
            radius,
            health,
            Body::Structure(Structure::new(StructureKind::Wall, cell)),
        )
    }

    fn zombie_state(state: &SurvivalState, id: EntityId) -> Option<ZombieState> {
        state.world.get(id).and_then(|e| e.as_zombie()).map(|z| z.state)
    }

    fn player_pos(state: &SurvivalState) -> Vec2 {
        state.player_entity().map(|e| e.pos).unwrap_or_default()
    }

    #[test]
    fn seeks_toward_player() {
        let mut state = setup();
        let start = player_pos(&state) + Vec2::new(300.0, 0.0);
        let id = spawn_zombie(&mut state, start);
        let mut hits = HitQueue::default();

        update_zombies(&mut state, 1, &mut hits);

        let entity = state.world.get(id).expect("zombie");
        let step = state.config.normal_zombie.speed / state.config.tick_hz as f32;
        assert!((entity.pos.x - (start.x - step)).abs() < 1e-3);
        assert_eq!(zombie_state(&state, id), Some(ZombieState::Seeking));
        assert!(hits.is_empty());
    }

    #[test]
    fn attacks_in_range_on_cooldown() {
        let mut state = setup();
        let player = state.player;
        let at = player_pos(&state) + Vec2::new(40.0, 0.0);
        let id = spawn_zombie(&mut state, at);
        let mut hits = HitQueue::default();

        update_zombies(&mut state, 1, &mut hits);
        assert_eq!(
            zombie_state(&state, id),
            Some(ZombieState::Attacking { target: player })
        );
        assert_eq!(hits.contact.len(), 1);
        assert_eq!(hits.contact[0].damage, 10);

        hits.contact.clear();
        update_zombies(&mut state, 2, &mut hits);
        assert!(hits.contact.is_empty(), "cooling down");

        let again = 1 + state.config.ms_to_ticks(1000);
        update_zombies(&mut state, again, &mut hits);
        assert_eq!(hits.contact.len(), 1);
    }

    #[test]
    fn returns_to_seeking_when_target_leaves() {
        let mut state = setup();
        let at = player_pos(&state) + Vec2::new(40.0, 0.0);
        let id = spawn_zombie(&mut state, at);
        let mut hits = HitQueue::default();
        update_zombies(&mut state, 1, &mut hits);

        let player = state.player;
        if let Some(p) = state.world.get_mut(player) {
            p.pos.x -= 200.0;
        }
        update_zombies(&mut state, 2, &mut hits);
        assert_eq!(zombie_state(&state, id), Some(ZombieState::Seeking));
    }

    #[test]
    fn wall_in_path_becomes_target() {
        let mut state = setup();
        let player = player_pos(&state);
        let cell = state
            .world
            .grid
            .cell_at(player + Vec2::new(96.0, 0.0))
            .expect("in grid");
        let wall = spawn_wall(&mut state, cell);
        let wall_pos = state.world.grid.cell_center(cell);

        // Just past the wall, heading for the player on the far side.
        let id = spawn_zombie(&mut state, Vec2::new(wall_pos.x + 34.0, player.y));
        let mut hits = HitQueue::default();
        update_zombies(&mut state, 1, &mut hits);

        assert_eq!(
            zombie_state(&state, id),
            Some(ZombieState::Attacking { target: wall })
        );
    }

    #[test]
    fn slow_scales_speed_until_expiry() {
        let mut state = setup();
        let start = player_pos(&state) + Vec2::new(400.0, 0.0);
        let id = spawn_zombie(&mut state, start);
        if let Some(z) = state.world.get_mut(id).and_then(|e| e.as_zombie_mut()) {
            z.apply_slow(0.5, 5);
            z.apply_slow(0.8, 3);
            assert_eq!(z.slow, Some(Slow { factor: 0.5, until: 5 }));
        }

        let mut hits = HitQueue::default();
        update_zombies(&mut state, 1, &mut hits);
        let vel = state.world.get(id).map(|e| e.vel.length()).unwrap_or_default();
        assert!((vel - state.config.normal_zombie.speed * 0.5).abs() < 1e-3);

        update_zombies(&mut state, 5, &mut hits);
        let entity = state.world.get(id).expect("zombie");
        assert!((entity.vel.length() - state.config.normal_zombie.speed).abs() < 1e-3);
        assert_eq!(entity.as_zombie().and_then(|z| z.slow), None);
    }

    #[test]
    fn equal_distance_prefers_player() {
        let player = Target {
            id: EntityId::default(),
            pos: Vec2::new(-100.0, 0.0),
            radius: 16.0,
        };
        let mut keys = slotmap::SlotMap::<EntityId, ()>::with_key();
        let wall = Target {
            id: keys.insert(()),
            pos: Vec2::new(100.0, 0.0),
            radius: 16.0,
        };
        let picked = nearest_target(Vec2::ZERO, 16.0, Some(player), &[wall]).expect("target");
        assert_eq!(picked.id, player.id);
    }
}
