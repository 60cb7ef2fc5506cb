use crate::combat::HitQueue;
use crate::config::{FireMode, SurvivalConfig, WeaponKind};
use crate::events::SurvivalEvent;
use crate::projectile::{launch, ProjectileSource};
use crate::state::SurvivalState;
use crate::weapon::{FireError, FireOutcome, ReloadError, Shot, WeaponInstance};
use crate::world::{EntityId, World};
use glam::Vec2;
use rand::Rng;
use sim_core::Tick;
use std::fmt;
use tracing::debug;

/// Input held by the player until replaced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    /// Desired movement direction. Longer than 1 is clamped.
    pub movement: Vec2,
    /// World-space point the player aims at.
    pub aim: Vec2,
    pub fire_held: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeaponSwitch {
    Next,
    Previous,
    /// Zero-based loadout slot.
    Slot(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchError {
    NoSuchSlot(u8),
    AlreadyEquipped,
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchError::NoSuchSlot(slot) => write!(f, "no weapon in slot {slot}"),
            SwitchError::AlreadyEquipped => write!(f, "weapon is already equipped"),
        }
    }
}

impl std::error::Error for SwitchError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub from: WeaponKind,
    pub to: WeaponKind,
    pub cancelled_reload: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub loadout: Vec<WeaponInstance>,
    pub current: usize,
    /// Grenades carried, tracked as a magazine that is never reloaded.
    pub grenade: WeaponInstance,
    pub controls: Controls,
    trigger_was_held: bool,
}

impl Player {
    pub fn new(config: &SurvivalConfig) -> Self {
        Self {
            loadout: WeaponKind::LOADOUT
                .iter()
                .map(|&kind| WeaponInstance::new(kind, config))
                .collect(),
            current: 0,
            grenade: WeaponInstance::with_ammo(
                WeaponKind::Grenade,
                config.player.starting_grenades,
                0,
            ),
            controls: Controls::default(),
            trigger_was_held: false,
        }
    }

    pub fn current_weapon(&self) -> Option<&WeaponInstance> {
        self.loadout.get(self.current)
    }

    pub fn weapon_mut(&mut self, kind: WeaponKind) -> Option<&mut WeaponInstance> {
        self.loadout.iter_mut().find(|w| w.kind == kind)
    }

    /// Changes the equipped weapon. A reload in progress on the old weapon is
    /// abandoned and the ammo stays where it was.
    pub fn switch(&mut self, switch: WeaponSwitch) -> Result<SwitchOutcome, SwitchError> {
        let len = self.loadout.len();
        let target = match switch {
            WeaponSwitch::Next => (self.current + 1) % len.max(1),
            WeaponSwitch::Previous => (self.current + len.max(1) - 1) % len.max(1),
            WeaponSwitch::Slot(slot) => {
                let slot_idx = slot as usize;
                if slot_idx >= len {
                    return Err(SwitchError::NoSuchSlot(slot));
                }
                slot_idx
            }
        };
        if target == self.current {
            return Err(SwitchError::AlreadyEquipped);
        }

        let old = &mut self.loadout[self.current];
        let from = old.kind;
        let cancelled_reload = old.cancel_reload();
        self.current = target;
        // A fresh weapon needs a fresh trigger press.
        self.trigger_was_held = true;

        Ok(SwitchOutcome {
            from,
            to: self.loadout[target].kind,
            cancelled_reload,
        })
    }

    pub fn reload(&mut self, config: &SurvivalConfig, now: Tick) -> Result<Tick, ReloadError> {
        match self.loadout.get_mut(self.current) {
            Some(weapon) => weapon.reload(config, now),
            None => Err(ReloadError::NotReloadable),
        }
    }

    pub fn throw_grenade<R: Rng>(
        &mut self,
        config: &SurvivalConfig,
        origin: Vec2,
        now: Tick,
        rng: &mut R,
    ) -> Result<FireOutcome, FireError> {
        let aim = self.controls.aim - origin;
        self.grenade.try_fire(config, origin, aim, now, rng)
    }
}

fn live_player(world: &mut World, id: EntityId) -> Option<(Vec2, &mut Player)> {
    let entity = world.get_mut(id).filter(|e| e.is_alive())?;
    let pos = entity.pos;
    Some((pos, entity.as_player_mut()?))
}

pub fn set_controls(state: &mut SurvivalState, controls: Controls) {
    if let Some((_, player)) = live_player(&mut state.world, state.player) {
        player.controls = controls;
    }
}

/// Moves the player along its movement input, clamped to unit length and
/// kept inside the world.
pub fn move_player(state: &mut SurvivalState) {
    let Some(entity) = state.world.get(state.player).filter(|e| e.is_alive()) else {
        return;
    };
    let Some(player) = entity.as_player() else {
        return;
    };

    let input = player.controls.movement.clamp_length_max(1.0);
    let velocity = input * state.config.player.speed;
    let next = state
        .world
        .clamp_to_bounds(entity.pos + velocity * state.config.dt(), entity.radius);

    if let Some(entity) = state.world.get_mut(state.player) {
        entity.pos = next;
        entity.vel = velocity;
    }
}

/// Completes due reloads and pulls the trigger if the controls ask for it.
///
/// Automatic weapons fire every cooldown while the trigger is held; the
/// others fire once per press. Emptying the magazine starts a reload when
/// reserve ammo is left.
pub fn update_player_weapons(
    state: &mut SurvivalState,
    tick: Tick,
    hits: &mut HitQueue,
    events: &mut Vec<SurvivalEvent>,
) {
    let SurvivalState {
        config,
        world,
        rng,
        player: player_id,
        ..
    } = &mut *state;
    let Some((origin, player)) = live_player(world, *player_id) else {
        return;
    };

    for weapon in player.loadout.iter_mut() {
        if weapon.update(config, tick) {
            events.push(SurvivalEvent::ReloadCompleted {
                weapon: weapon.kind,
                magazine: weapon.magazine,
                reserve: weapon.reserve,
            });
        }
    }

    let held = player.controls.fire_held;
    let pressed = held && !player.trigger_was_held;
    player.trigger_was_held = held;
    let aim = player.controls.aim - origin;

    let Some(weapon) = player.loadout.get_mut(player.current) else {
        return;
    };
    let spec = config.weapon(weapon.kind);
    let pulled = match spec.fire_mode {
        FireMode::Automatic => held,
        _ => pressed,
    };
    if !pulled {
        return;
    }

    let kind = weapon.kind;
    let fired = match weapon.try_fire(config, origin, aim, tick, rng) {
        Ok(outcome) => {
            events.push(SurvivalEvent::ShotFired {
                weapon: kind,
                projectiles: outcome
                    .shots
                    .iter()
                    .filter(|s| !matches!(s, Shot::Melee { .. }))
                    .count() as u32,
            });
            if spec.uses_ammo() && weapon.magazine == 0 {
                start_auto_reload(weapon, config, tick, events);
            }
            Some(outcome)
        }
        Err(FireError::NoAmmo) => {
            if !start_auto_reload(weapon, config, tick, events) && pressed {
                events.push(SurvivalEvent::FireRejected {
                    weapon: kind,
                    reason: FireError::NoAmmo,
                });
            }
            None
        }
        // Holding the trigger through a cooldown or reload is not a new request.
        Err(_) if !pressed => None,
        Err(reason) => {
            events.push(SurvivalEvent::FireRejected {
                weapon: kind,
                reason,
            });
            None
        }
    };

    if let Some(outcome) = fired {
        add_shake(state, outcome.shake);
        for shot in outcome.shots {
            launch(state, ProjectileSource::Weapon(kind), shot, hits);
        }
    }
}

fn start_auto_reload(
    weapon: &mut WeaponInstance,
    config: &SurvivalConfig,
    tick: Tick,
    events: &mut Vec<SurvivalEvent>,
) -> bool {
    match weapon.reload(config, tick) {
        Ok(complete_at) => {
            events.push(SurvivalEvent::ReloadStarted {
                weapon: weapon.kind,
                complete_at,
            });
            true
        }
        Err(_) => false,
    }
}

fn add_shake(state: &mut SurvivalState, shake: f32) {
    let magnitude = shake * state.config.camera_shake_intensity;
    state.camera_shake = state.camera_shake.max(magnitude);
}

pub fn reload(state: &mut SurvivalState, tick: Tick, events: &mut Vec<SurvivalEvent>) {
    let Some((_, player)) = live_player(&mut state.world, state.player) else {
        return;
    };
    let Some(weapon) = player.current_weapon().map(|w| w.kind) else {
        return;
    };
    match player.reload(&state.config, tick) {
        Ok(complete_at) => events.push(SurvivalEvent::ReloadStarted {
            weapon,
            complete_at,
        }),
        Err(reason) => {
            debug!(weapon = weapon.name(), %reason, "reload rejected");
            events.push(SurvivalEvent::ReloadRejected { weapon, reason });
        }
    }
}

pub fn switch_weapon(
    state: &mut SurvivalState,
    switch: WeaponSwitch,
    events: &mut Vec<SurvivalEvent>,
) {
    let Some((_, player)) = live_player(&mut state.world, state.player) else {
        return;
    };
    match player.switch(switch) {
        Ok(outcome) => {
            if outcome.cancelled_reload {
                events.push(SurvivalEvent::ReloadCancelled {
                    weapon: outcome.from,
                });
            }
            events.push(SurvivalEvent::WeaponSwitched {
                from: outcome.from,
                to: outcome.to,
            });
        }
        Err(reason) => events.push(SurvivalEvent::SwitchRejected { reason }),
    }
}

/// Throws a grenade toward the aim point; it lands there or at its maximum
/// range, whichever is closer.
pub fn throw_grenade(
    state: &mut SurvivalState,
    tick: Tick,
    hits: &mut HitQueue,
    events: &mut Vec<SurvivalEvent>,
) {
    let SurvivalState {
        config,
        world,
        rng,
        player: player_id,
        ..
    } = &mut *state;
    let Some((origin, player)) = live_player(world, *player_id) else {
        return;
    };

    let outcome = match player.throw_grenade(config, origin, tick, rng) {
        Ok(outcome) => outcome,
        Err(reason) => {
            events.push(SurvivalEvent::FireRejected {
                weapon: WeaponKind::Grenade,
                reason,
            });
            return;
        }
    };
    let remaining = player.grenade.magazine;

    add_shake(state, outcome.shake);
    for shot in outcome.shots {
        let source = ProjectileSource::Weapon(WeaponKind::Grenade);
        if let Some(id) = launch(state, source, shot, hits) {
            events.push(SurvivalEvent::GrenadeThrown { id, remaining });
        }
    }
}
