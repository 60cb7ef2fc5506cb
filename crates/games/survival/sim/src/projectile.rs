use crate::combat::{AreaHit, HitQueue};
use crate::config::{StructureKind, WeaponKind};
use crate::events::SurvivalEvent;
use crate::state::SurvivalState;
use crate::weapon::Shot;
use crate::world::{Body, EntityId, EntityKind};
use glam::Vec2;
use sim_core::Tick;

const BULLET_RADIUS: f32 = 2.0;
const GRENADE_RADIUS: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectileSource {
    Weapon(WeaponKind),
    Structure(StructureKind),
}

impl ProjectileSource {
    pub fn name(self) -> &'static str {
        match self {
            ProjectileSource::Weapon(kind) => kind.name(),
            ProjectileSource::Structure(kind) => kind.name(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fuse {
    pub detonate_at: Tick,
    pub blast_radius: f32,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub source: ProjectileSource,
    pub damage: i32,
    pub traveled: f32,
    pub max_range: f32,
    /// Thrown explosives rest after `max_range` and go off at the fuse tick
    /// instead of hitting on contact.
    pub fuse: Option<Fuse>,
}

impl Projectile {
    pub fn hits_on_contact(&self) -> bool {
        self.fuse.is_none()
    }

    /// Reached the end of its range. Contact projectiles still get one
    /// collision check at their final position before they are removed.
    pub fn is_spent(&self) -> bool {
        self.traveled >= self.max_range
    }
}

/// Turns a shot into an entity or, for melee, an immediate area hit.
pub fn launch(
    state: &mut SurvivalState,
    source: ProjectileSource,
    shot: Shot,
    hits: &mut HitQueue,
) -> Option<EntityId> {
    match shot {
        Shot::Bullet {
            origin,
            velocity,
            range,
            damage,
        } => {
            let projectile = Projectile {
                source,
                damage,
                traveled: 0.0,
                max_range: range,
                fuse: None,
            };
            let id = state
                .world
                .spawn(origin, BULLET_RADIUS, 1, Body::Projectile(projectile));
            if let Some(entity) = state.world.get_mut(id) {
                entity.vel = velocity;
            }
            Some(id)
        }
        Shot::Thrown {
            origin,
            velocity,
            travel,
            detonate_at,
            blast_radius,
            damage,
        } => {
            let projectile = Projectile {
                source,
                damage,
                traveled: 0.0,
                max_range: travel,
                fuse: Some(Fuse {
                    detonate_at,
                    blast_radius,
                }),
            };
            let id = state
                .world
                .spawn(origin, GRENADE_RADIUS, 1, Body::Projectile(projectile));
            if let Some(entity) = state.world.get_mut(id) {
                entity.vel = velocity;
            }
            Some(id)
        }
        Shot::Melee {
            center,
            radius,
            damage,
        } => {
            hits.area.push(AreaHit {
                center,
                radius,
                damage,
                falloff: false,
            });
            None
        }
    }
}

/// Moves every live projectile one tick. Bullets stop at the end of their
/// range and are expired by combat resolution after their last collision
/// check; thrown explosives stop at their landing point and become area hits
/// when the fuse runs out.
pub fn update_projectiles(
    state: &mut SurvivalState,
    tick: Tick,
    hits: &mut HitQueue,
    events: &mut Vec<SurvivalEvent>,
) {
    let dt = state.config.dt();
    let ids = state.world.ids(EntityKind::Projectile);

    let mut detonated: Vec<(EntityId, AreaHit)> = Vec::new();

    for id in ids {
        let Some(entity) = state.world.get_mut(id) else {
            continue;
        };
        let Body::Projectile(projectile) = &mut entity.body else {
            continue;
        };

        let remaining = (projectile.max_range - projectile.traveled).max(0.0);
        let step = entity.vel * dt;
        let step_len = step.length();
        if step_len > 0.0 && remaining > 0.0 {
            if step_len >= remaining {
                entity.pos += step * (remaining / step_len);
                projectile.traveled = projectile.max_range;
            } else {
                entity.pos += step;
                projectile.traveled += step_len;
            }
        }

        if let Some(fuse) = projectile.fuse {
            if projectile.is_spent() {
                entity.vel = Vec2::ZERO;
            }
            if tick >= fuse.detonate_at {
                detonated.push((
                    id,
                    AreaHit {
                        center: entity.pos,
                        radius: fuse.blast_radius,
                        damage: projectile.damage,
                        falloff: true,
                    },
                ));
            }
        }
    }

    for (id, hit) in detonated {
        if state.world.destroy(id) {
            events.push(SurvivalEvent::GrenadeExploded {
                id,
                pos: hit.center,
                radius: hit.radius,
            });
            hits.area.push(hit);
        }
    }
}
