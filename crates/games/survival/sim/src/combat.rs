use crate::events::SurvivalEvent;
use crate::state::SurvivalState;
use crate::world::{circles_overlap, DeathEvent, EntityId, EntityKind};
use glam::Vec2;
use tracing::{debug, info};

/// Damage applied to every zombie inside a circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaHit {
    pub center: Vec2,
    pub radius: f32,
    pub damage: i32,
    /// Damage scales linearly from full at the center to zero at the edge.
    pub falloff: bool,
}

impl AreaHit {
    /// Damage dealt to a body whose nearest edge is `distance` away, if it
    /// is inside.
    pub fn damage_at(&self, distance: f32) -> Option<i32> {
        if distance > self.radius {
            return None;
        }
        if !self.falloff || self.radius <= 0.0 {
            return Some(self.damage);
        }
        let scaled = self.damage as f32 * (1.0 - distance / self.radius);
        Some(scaled.round() as i32)
    }
}

/// Damage to one specific entity from a non-zombie source (spike traps).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectHit {
    pub source: EntityId,
    pub target: EntityId,
    pub damage: i32,
}

/// A zombie's melee attack landing on the player or a structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactHit {
    pub attacker: EntityId,
    pub target: EntityId,
    pub damage: i32,
}

/// Hits produced by systems and resolved together once per tick.
#[derive(Clone, Debug, Default)]
pub struct HitQueue {
    pub area: Vec<AreaHit>,
    pub direct: Vec<DirectHit>,
    pub contact: Vec<ContactHit>,
}

impl HitQueue {
    pub fn is_empty(&self) -> bool {
        self.area.is_empty() && self.direct.is_empty() && self.contact.is_empty()
    }

    /// Moves everything from `other` into this queue, keeping order.
    pub fn append(&mut self, other: &mut HitQueue) {
        self.area.append(&mut other.area);
        self.direct.append(&mut other.direct);
        self.contact.append(&mut other.contact);
    }
}

/// Applies this tick's damage. Every entity that dies is pushed to `deaths`
/// exactly once.
pub fn resolve_combat(
    state: &mut SurvivalState,
    hits: &mut HitQueue,
    deaths: &mut Vec<DeathEvent>,
    events: &mut Vec<SurvivalEvent>,
) {
    resolve_projectiles(state, deaths, events);

    for hit in hits.area.drain(..) {
        // Collect targets first (can't iterate and mutate simultaneously)
        let mut targets: Vec<(EntityId, i32)> = Vec::new();
        state.world.for_each_alive(EntityKind::Zombie, |id, zombie| {
            let edge = (zombie.pos.distance(hit.center) - zombie.radius).max(0.0);
            match hit.damage_at(edge) {
                Some(damage) if damage > 0 => targets.push((id, damage)),
                _ => {}
            }
        });
        for (id, damage) in targets {
            events.push(SurvivalEvent::ZombieHit { id, damage });
            deaths.extend(state.world.damage(id, damage));
        }
    }

    for hit in hits.direct.drain(..) {
        if state.world.is_alive(hit.target) {
            events.push(SurvivalEvent::ZombieHit {
                id: hit.target,
                damage: hit.damage,
            });
            deaths.extend(state.world.damage(hit.target, hit.damage));
        }
    }

    for hit in hits.contact.drain(..) {
        if !state.world.is_alive(hit.attacker) {
            continue;
        }
        let Some(target) = state.world.get(hit.target) else {
            continue;
        };
        if !target.is_alive() {
            continue;
        }
        let kind = target.kind();
        let death = state.world.damage(hit.target, hit.damage);
        let health = state
            .world
            .get(hit.target)
            .map(|e| e.health.current())
            .unwrap_or(0);
        match kind {
            EntityKind::Player => events.push(SurvivalEvent::PlayerDamaged {
                by: hit.attacker,
                damage: hit.damage,
                health,
            }),
            EntityKind::Structure => events.push(SurvivalEvent::StructureDamaged {
                id: hit.target,
                by: hit.attacker,
                damage: hit.damage,
                health,
            }),
            EntityKind::Zombie | EntityKind::Projectile => {}
        }
        deaths.extend(death);
    }
}

/// Each contact projectile damages the first live zombie it overlaps and is
/// consumed by that hit. Projectiles that are spent or out of the world and
/// hit nothing are removed.
fn resolve_projectiles(
    state: &mut SurvivalState,
    deaths: &mut Vec<DeathEvent>,
    events: &mut Vec<SurvivalEvent>,
) {
    let zombies = state.world.ids(EntityKind::Zombie);

    for projectile_id in state.world.ids(EntityKind::Projectile) {
        let Some((pos, radius, damage, spent)) = state.world.get(projectile_id).and_then(|e| {
            let projectile = e.as_projectile()?;
            let spent = projectile.is_spent() || !state.world.in_bounds(e.pos);
            projectile
                .hits_on_contact()
                .then_some((e.pos, e.radius, projectile.damage, spent))
        }) else {
            continue;
        };

        let target = zombies.iter().copied().find(|&zid| {
            state
                .world
                .get(zid)
                .is_some_and(|z| z.is_alive() && circles_overlap(pos, radius, z.pos, z.radius))
        });

        match target {
            Some(zombie_id) => {
                state.world.destroy(projectile_id);
                events.push(SurvivalEvent::ProjectileHit {
                    projectile: projectile_id,
                    target: zombie_id,
                    damage,
                });
                deaths.extend(state.world.damage(zombie_id, damage));
            }
            None if spent => {
                state.world.destroy(projectile_id);
            }
            None => {}
        }
    }
}

/// Hands each death to its consumers in a fixed order: the economy is credited,
/// then the wave forgets the zombie, then the death is published.
pub fn drain_deaths(
    state: &mut SurvivalState,
    deaths: &mut Vec<DeathEvent>,
    events: &mut Vec<SurvivalEvent>,
) {
    for death in deaths.drain(..) {
        if death.cash_reward > 0 {
            state.economy.credit(death.cash_reward);
            events.push(SurvivalEvent::CashCredited {
                amount: death.cash_reward,
                balance: state.economy.cash(),
            });
        }

        if death.kind == EntityKind::Zombie {
            state.wave.on_zombie_death(death.entity);
        }

        match death.kind {
            EntityKind::Zombie => debug!(
                zombie = ?death.entity,
                reward = death.cash_reward,
                "zombie killed"
            ),
            EntityKind::Structure => info!(structure = ?death.entity, "structure destroyed"),
            EntityKind::Player => info!(wave = state.wave.wave, "player killed"),
            EntityKind::Projectile => {}
        }

        events.push(SurvivalEvent::EntityDied {
            id: death.entity,
            kind: death.kind,
            pos: death.position,
            cash_reward: death.cash_reward,
        });
    }
}
