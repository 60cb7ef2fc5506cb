use crate::config::SurvivalConfig;
use crate::player::Player;
use crate::state::SurvivalState;
use crate::wave::WavePhase;
use crate::weapon::WeaponInstance;
use crate::world::{Body, EntityId};
use glam::Vec2;
use sim_core::Tick;
use slotmap::Key;
use survival_types::{
    Cell, PlayerInfo, Point, ProjectileInfo, ShopOffer, StructureInfo, SurvivalObservation,
    WaveStatus, WeaponInfo, ZombieInfo,
};

pub fn entity_id_to_string(id: EntityId) -> String {
    id.data().as_ffi().to_string()
}

fn point(v: Vec2) -> Point {
    Point { x: v.x, y: v.y }
}

fn wave_status(state: &SurvivalState) -> WaveStatus {
    let waves = &state.config.waves;
    let wave = &state.wave;
    match wave.phase {
        WavePhase::Shopping => {
            let next_wave = wave.wave + 1;
            WaveStatus::Shopping {
                next_wave,
                next_wave_size: waves.quota(next_wave),
                next_is_boss_wave: waves.is_boss_wave(next_wave),
            }
        }
        WavePhase::Spawning => WaveStatus::Spawning {
            wave: wave.wave,
            spawned: wave.spawned,
            quota: wave.quota,
            next_spawn_tick: wave.next_spawn_tick,
        },
        WavePhase::InProgress => WaveStatus::InProgress {
            wave: wave.wave,
            alive: wave.alive.len() as u32,
        },
        WavePhase::Cleared { reward } => WaveStatus::Cleared {
            wave: wave.wave,
            reward,
        },
        WavePhase::GameOver => WaveStatus::GameOver { wave: wave.wave },
        WavePhase::Victory => WaveStatus::Victory { waves: wave.wave },
    }
}

fn weapon_info(config: &SurvivalConfig, weapon: &WeaponInstance, tick: Tick) -> WeaponInfo {
    let spec = config.weapon(weapon.kind);
    let uses_ammo = spec.uses_ammo();
    let has_round = !uses_ammo || weapon.magazine > 0;
    WeaponInfo {
        kind: weapon.kind.name().to_string(),
        fire_mode: spec.fire_mode.name().to_string(),
        magazine: uses_ammo.then_some(weapon.magazine),
        capacity: uses_ammo.then_some(spec.capacity),
        reserve: spec.is_reloadable().then_some(weapon.reserve),
        reload_progress: weapon.reload_progress(tick),
        ready: !weapon.is_reloading() && tick >= weapon.ready_at && has_round,
    }
}

fn player_info(state: &SurvivalState, player: Option<&Player>) -> PlayerInfo {
    let entity = state.player_entity();
    PlayerInfo {
        id: entity_id_to_string(state.player),
        position: point(entity.map(|e| e.pos).unwrap_or_default()),
        aim: point(player.map(|p| p.controls.aim).unwrap_or_default()),
        health: entity.map(|e| e.health.current()).unwrap_or(0),
        max_health: entity
            .map(|e| e.health.max())
            .unwrap_or(state.config.player.health),
        current_weapon: player.map(|p| p.current).unwrap_or(0),
        grenades: player.map(|p| p.grenade.magazine).unwrap_or(0),
        max_grenades: state.config.grenade.capacity,
    }
}

/// Read-only snapshot of the simulation for presentation layers.
pub fn build_observation(state: &SurvivalState) -> SurvivalObservation {
    let config = &state.config;
    let tick = state.tick;
    let player = state.player_entity().and_then(|e| e.as_player());

    let mut zombies = Vec::new();
    let mut projectiles = Vec::new();
    let mut structures = Vec::new();

    for (id, entity) in state.world.iter() {
        if !entity.is_alive() {
            continue;
        }
        match &entity.body {
            Body::Player(_) => {}
            Body::Zombie(zombie) => zombies.push(ZombieInfo {
                id: entity_id_to_string(id),
                kind: zombie.kind.name().to_string(),
                position: point(entity.pos),
                radius: entity.radius,
                health: entity.health.current(),
                max_health: entity.health.max(),
                state: zombie.state.name().to_string(),
                slowed: zombie.speed_multiplier(tick) < 1.0,
            }),
            Body::Projectile(projectile) => projectiles.push(ProjectileInfo {
                id: entity_id_to_string(id),
                source: projectile.source.name().to_string(),
                position: point(entity.pos),
                velocity: point(entity.vel),
                fuse_tick: projectile.fuse.map(|f| f.detonate_at),
            }),
            Body::Structure(structure) => structures.push(StructureInfo {
                id: entity_id_to_string(id),
                kind: structure.kind.name().to_string(),
                cell: Cell {
                    x: structure.cell.x,
                    y: structure.cell.y,
                },
                position: point(entity.pos),
                health: entity.health.current(),
                max_health: entity.health.max(),
                blocking: structure.kind.is_blocking(),
            }),
        }
    }

    let shop = if state.wave.phase == WavePhase::Shopping {
        crate::shop::offers(config)
            .into_iter()
            .map(|(item, price)| ShopOffer { item, price })
            .collect()
    } else {
        Vec::new()
    };

    SurvivalObservation {
        tick,
        ticks_per_second: config.tick_hz,

        world_width: config.world_width,
        world_height: config.world_height,
        cell_size: config.cell_size,

        cash: state.economy.cash(),
        wave_status: wave_status(state),
        paused: state.paused,
        camera_shake: state.camera_shake,

        player: player_info(state, player),
        weapons: player
            .map(|p| {
                p.loadout
                    .iter()
                    .map(|w| weapon_info(config, w, tick))
                    .collect()
            })
            .unwrap_or_default(),
        zombies,
        projectiles,
        structures,
        shop,
    }
}
