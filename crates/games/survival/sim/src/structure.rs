use crate::combat::{DirectHit, HitQueue};
use crate::config::{StructureClass, StructureKind};
use crate::events::SurvivalEvent;
use crate::projectile::{launch, ProjectileSource};
use crate::state::SurvivalState;
use crate::wave::WavePhase;
use crate::weapon::Shot;
use crate::world::{circles_overlap, Body, Cell, Entity, EntityId, EntityKind};
use glam::Vec2;
use sim_core::Tick;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceError {
    Occupied,
    OutOfBounds,
    InsufficientFunds { cost: u32, have: u32 },
    /// Building is only allowed between waves.
    ShopClosed,
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceError::Occupied => write!(f, "cell is already occupied"),
            PlaceError::OutOfBounds => write!(f, "cell is outside the build area"),
            PlaceError::InsufficientFunds { cost, have } => {
                write!(f, "need {cost} cash, have {have}")
            }
            PlaceError::ShopClosed => write!(f, "structures can only be placed between waves"),
        }
    }
}

impl std::error::Error for PlaceError {}

#[derive(Clone, Debug)]
pub struct Structure {
    pub kind: StructureKind,
    pub cell: Cell,
    /// Earliest tick a turret may fire again.
    pub next_fire_tick: Tick,
    /// Per-zombie earliest retrigger tick for traps.
    pub trap_cooldowns: BTreeMap<EntityId, Tick>,
}

impl Structure {
    pub fn new(kind: StructureKind, cell: Cell) -> Self {
        Self {
            kind,
            cell,
            next_fire_tick: 0,
            trap_cooldowns: BTreeMap::new(),
        }
    }
}

/// Debits the cost and spawns the structure, or does neither.
pub fn place(
    state: &mut SurvivalState,
    kind: StructureKind,
    cell: Cell,
    events: &mut Vec<SurvivalEvent>,
) -> Result<EntityId, PlaceError> {
    if state.wave.phase != WavePhase::Shopping {
        return Err(PlaceError::ShopClosed);
    }
    if !state.world.grid.in_bounds(cell) {
        return Err(PlaceError::OutOfBounds);
    }
    if state.world.grid.get(cell).is_some() {
        return Err(PlaceError::Occupied);
    }

    let spec = state.config.structure(kind);
    let (cost, health) = (spec.cost, spec.health);
    if !state.economy.debit(cost) {
        return Err(PlaceError::InsufficientFunds {
            cost,
            have: state.economy.cash(),
        });
    }

    let pos = state.world.grid.cell_center(cell);
    let radius = state.config.cell_size / 2.0;
    let id = state
        .world
        .spawn(pos, radius, health, Body::Structure(Structure::new(kind, cell)));

    info!(kind = kind.name(), x = cell.x, y = cell.y, cost, "structure placed");
    events.push(SurvivalEvent::StructurePlaced {
        id,
        kind,
        cell,
        cost,
    });
    Ok(id)
}

/// Nearest zombie within `range` of `from`; ties go to the one with less health.
fn find_turret_target(
    from: Vec2,
    range: f32,
    zombies: &[(EntityId, Vec2, i32)],
) -> Option<(EntityId, Vec2)> {
    let range_sq = range * range;
    let mut best: Option<(EntityId, Vec2, f32, i32)> = None;

    for &(id, pos, hp) in zombies {
        let dist_sq = pos.distance_squared(from);
        if dist_sq > range_sq {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, _, best_dist, best_hp)) => {
                dist_sq < best_dist || (dist_sq == best_dist && hp < best_hp)
            }
        };
        if better {
            best = Some((id, pos, dist_sq, hp));
        }
    }

    best.map(|(id, pos, _, _)| (id, pos))
}

/// Turrets fire at the nearest zombie in range; traps affect zombies
/// standing on them. Damage is queued into `hits`.
pub fn update_structures(
    state: &mut SurvivalState,
    tick: Tick,
    hits: &mut HitQueue,
    events: &mut Vec<SurvivalEvent>,
) {
    let mut zombies: Vec<(EntityId, Vec2, i32)> = Vec::new();
    let mut zombie_bodies: Vec<(EntityId, Vec2, f32)> = Vec::new();
    state.world.for_each_alive(EntityKind::Zombie, |id, e| {
        zombies.push((id, e.pos, e.health.current()));
        zombie_bodies.push((id, e.pos, e.radius));
    });

    let mut shots: Vec<(StructureKind, Shot)> = Vec::new();
    let mut slows: Vec<(EntityId, f32, Tick)> = Vec::new();

    for id in state.world.ids(EntityKind::Structure) {
        let Some(entity) = state.world.get_mut(id) else {
            continue;
        };
        let (pos, radius) = (entity.pos, entity.radius);
        let Body::Structure(structure) = &mut entity.body else {
            continue;
        };
        let spec = state.config.structure(structure.kind);

        match structure.kind.class() {
            StructureClass::Wall => {}
            StructureClass::Turret => {
                if tick < structure.next_fire_tick {
                    continue;
                }
                let Some((target, target_pos)) = find_turret_target(pos, spec.range, &zombies)
                else {
                    continue;
                };
                let Some(dir) = (target_pos - pos).try_normalize() else {
                    continue;
                };
                structure.next_fire_tick = tick + state.config.ms_to_ticks(spec.fire_interval_ms);
                shots.push((
                    structure.kind,
                    Shot::Bullet {
                        origin: pos,
                        velocity: dir * spec.projectile_speed,
                        range: spec.range + radius,
                        damage: spec.damage,
                    },
                ));
                events.push(SurvivalEvent::TurretFired { id, target });
            }
            StructureClass::Trap => {
                structure
                    .trap_cooldowns
                    .retain(|zid, _| zombies.iter().any(|(z, _, _)| z == zid));

                for &(zid, zpos, zradius) in &zombie_bodies {
                    if !circles_overlap(pos, radius, zpos, zradius) {
                        continue;
                    }
                    if structure
                        .trap_cooldowns
                        .get(&zid)
                        .is_some_and(|&ready| tick < ready)
                    {
                        continue;
                    }
                    structure
                        .trap_cooldowns
                        .insert(zid, tick + state.config.ms_to_ticks(spec.trigger_interval_ms));

                    match structure.kind {
                        StructureKind::SpikeTrap => hits.direct.push(DirectHit {
                            source: id,
                            target: zid,
                            damage: spec.damage,
                        }),
                        _ => slows.push((
                            zid,
                            spec.slow_factor,
                            tick + state.config.ms_to_ticks(spec.slow_duration_ms),
                        )),
                    }
                    debug!(trap = structure.kind.name(), zombie = ?zid, "trap triggered");
                    events.push(SurvivalEvent::TrapTriggered {
                        id,
                        kind: structure.kind,
                        zombie: zid,
                    });
                }
            }
        }
    }

    for (zid, factor, until) in slows {
        if let Some(zombie) = state.world.get_mut(zid).and_then(Entity::as_zombie_mut) {
            zombie.apply_slow(factor, until);
        }
    }

    for (kind, shot) in shots {
        launch(state, ProjectileSource::Structure(kind), shot, hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Zombie;
    use crate::combat::resolve_combat;
    use crate::config::{SurvivalConfig, ZombieKind};

    fn state_with_cash(cash: u32) -> SurvivalState {
        let config = SurvivalConfig {
            starting_cash: cash,
            ..SurvivalConfig::default()
        };
        SurvivalState::new(config, 4)
    }

    fn spawn_zombie(state: &mut SurvivalState, pos: Vec2) -> EntityId {
        let config = state.config.clone();
        let spec = config.zombie(ZombieKind::Normal);
        let zombie = Zombie::new(ZombieKind::Normal, spec, 60);
        let id = state
            .world
            .spawn(pos, spec.radius, spec.health, Body::Zombie(zombie));
        state.wave.alive.insert(id);
        id
    }

    #[test]
    fn occupied_cell_is_rejected_without_charge() {
        let mut state = state_with_cash(1000);
        let mut events = Vec::new();
        let cell = Cell::new(3, 4);

        place(&mut state, StructureKind::Wall, cell, &mut events).expect("first placement");
        let cash = state.economy.cash();
        assert_eq!(cash, 900);

        assert_eq!(
            place(&mut state, StructureKind::Turret, cell, &mut events),
            Err(PlaceError::Occupied)
        );
        assert_eq!(state.economy.cash(), cash);
        assert_eq!(state.world.count(EntityKind::Structure), 1);
    }

    #[test]
    fn insufficient_funds_spawns_nothing() {
        let mut state = state_with_cash(299);
        let mut events = Vec::new();
        assert_eq!(
            place(&mut state, StructureKind::Turret, Cell::new(1, 1), &mut events),
            Err(PlaceError::InsufficientFunds {
                cost: 300,
                have: 299
            })
        );
        assert_eq!(state.economy.cash(), 299);
        assert_eq!(state.world.grid.get(Cell::new(1, 1)), None);
        assert!(events.is_empty());
    }

    #[test]
    fn out_of_bounds_and_closed_shop() {
        let mut state = state_with_cash(1000);
        let mut events = Vec::new();
        let far = Cell::new(state.world.grid.width, 0);
        assert_eq!(
            place(&mut state, StructureKind::Wall, far, &mut events),
            Err(PlaceError::OutOfBounds)
        );

        state.wave.phase = WavePhase::InProgress;
        assert_eq!(
            place(&mut state, StructureKind::Wall, Cell::new(0, 0), &mut events),
            Err(PlaceError::ShopClosed)
        );
        assert_eq!(state.economy.cash(), 1000);
    }

    #[test]
    fn destroyed_structure_frees_its_cell() {
        let mut state = state_with_cash(1000);
        let cell = Cell::new(5, 5);
        let id = place(&mut state, StructureKind::Wall, cell, &mut Vec::new()).expect("placed");
        state.world.damage(id, 10_000).expect("destroyed");
        state.world.sweep();
        assert_eq!(state.world.grid.get(cell), None);
        assert!(place(&mut state, StructureKind::Wall, cell, &mut Vec::new()).is_ok());
    }

    #[test]
    fn turret_fires_at_nearest_zombie_in_range() {
        let mut state = state_with_cash(1000);
        let mut events = Vec::new();
        let cell = Cell::new(10, 10);
        let turret = place(&mut state, StructureKind::Turret, cell, &mut events).expect("placed");
        let center = state.world.grid.cell_center(cell);

        let near = spawn_zombie(&mut state, center + Vec2::new(100.0, 0.0));
        spawn_zombie(&mut state, center + Vec2::new(150.0, 0.0));
        spawn_zombie(&mut state, center + Vec2::new(0.0, 400.0));

        let mut hits = HitQueue::default();
        update_structures(&mut state, 1, &mut hits, &mut events);
        assert!(events.contains(&SurvivalEvent::TurretFired {
            id: turret,
            target: near
        }));
        assert_eq!(state.world.count(EntityKind::Projectile), 1);

        events.clear();
        update_structures(&mut state, 2, &mut hits, &mut events);
        assert!(events.is_empty(), "turret is reloading");
    }

    #[test]
    fn turret_tie_break_prefers_weaker_zombie() {
        let mut keys = slotmap::SlotMap::<EntityId, ()>::with_key();
        let (a, b) = (keys.insert(()), keys.insert(()));
        let zombies = [(a, Vec2::new(10.0, 0.0), 80), (b, Vec2::new(-10.0, 0.0), 40)];
        let (picked, _) = find_turret_target(Vec2::ZERO, 50.0, &zombies).expect("in range");
        assert_eq!(picked, b);
        assert!(find_turret_target(Vec2::ZERO, 5.0, &zombies).is_none());
    }

    #[test]
    fn spike_trap_hits_once_per_window() {
        let mut state = state_with_cash(1000);
        let mut events = Vec::new();
        let cell = Cell::new(12, 12);
        place(&mut state, StructureKind::SpikeTrap, cell, &mut events).expect("placed");
        let center = state.world.grid.cell_center(cell);
        let zombie = spawn_zombie(&mut state, center);

        let mut hits = HitQueue::default();
        update_structures(&mut state, 1, &mut hits, &mut events);
        update_structures(&mut state, 2, &mut hits, &mut events);
        assert_eq!(hits.direct.len(), 1);

        let window = state.config.ms_to_ticks(state.config.spike_trap.trigger_interval_ms);
        update_structures(&mut state, 1 + window, &mut hits, &mut events);
        assert_eq!(hits.direct.len(), 2);

        resolve_combat(&mut state, &mut hits, &mut Vec::new(), &mut events);
        let hp = state.world.get(zombie).map(|e| e.health.current());
        assert_eq!(hp, Some(100 - 2 * state.config.spike_trap.damage));
    }

    #[test]
    fn slow_trap_slows_overlapping_zombie() {
        let mut state = state_with_cash(1000);
        let cell = Cell::new(20, 20);
        place(&mut state, StructureKind::SlowTrap, cell, &mut Vec::new()).expect("placed");
        let center = state.world.grid.cell_center(cell);
        let zombie = spawn_zombie(&mut state, center + Vec2::new(10.0, 0.0));

        let mut hits = HitQueue::default();
        update_structures(&mut state, 1, &mut hits, &mut Vec::new());
        let slow = state
            .world
            .get(zombie)
            .and_then(|e| e.as_zombie())
            .and_then(|z| z.slow)
            .expect("slowed");
        assert_eq!(slow.factor, 0.5);
        assert_eq!(slow.until, 1 + state.config.ms_to_ticks(2000));
        assert!(hits.is_empty());
    }
}
