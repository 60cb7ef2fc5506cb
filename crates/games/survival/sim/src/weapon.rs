use crate::config::{FireMode, SurvivalConfig, WeaponKind};
use glam::Vec2;
use rand::Rng;
use sim_core::Tick;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireError {
    /// Magazine empty (or no grenades left).
    NoAmmo,
    /// Fire interval has not elapsed since the last shot.
    OnCooldown,
    /// A reload is in progress.
    Reloading,
    /// Aim direction has no length.
    InvalidTarget,
}

impl fmt::Display for FireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireError::NoAmmo => write!(f, "out of ammo"),
            FireError::OnCooldown => write!(f, "weapon is cooling down"),
            FireError::Reloading => write!(f, "weapon is reloading"),
            FireError::InvalidTarget => write!(f, "no aim direction"),
        }
    }
}

impl std::error::Error for FireError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadError {
    AlreadyFull,
    AlreadyReloading,
    NoReserve,
    /// Melee and thrown weapons have no magazine to reload.
    NotReloadable,
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadError::AlreadyFull => write!(f, "magazine is already full"),
            ReloadError::AlreadyReloading => write!(f, "reload already in progress"),
            ReloadError::NoReserve => write!(f, "no reserve ammo"),
            ReloadError::NotReloadable => write!(f, "weapon cannot be reloaded"),
        }
    }
}

impl std::error::Error for ReloadError {}

/// One thing produced by a successful trigger pull.
#[derive(Clone, Debug, PartialEq)]
pub enum Shot {
    Bullet {
        origin: Vec2,
        velocity: Vec2,
        range: f32,
        damage: i32,
    },
    /// Instant circular hit volume.
    Melee {
        center: Vec2,
        radius: f32,
        damage: i32,
    },
    Thrown {
        origin: Vec2,
        velocity: Vec2,
        /// Distance it travels before coming to rest.
        travel: f32,
        detonate_at: Tick,
        blast_radius: f32,
        damage: i32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FireOutcome {
    pub shots: Vec<Shot>,
    /// Screen shake to add, before the global intensity scale.
    pub shake: f32,
}

/// Mutable per-player state of one weapon.
#[derive(Clone, Debug, PartialEq)]
pub struct WeaponInstance {
    pub kind: WeaponKind,
    pub magazine: u32,
    pub reserve: u32,
    /// First tick the weapon may fire again.
    pub ready_at: Tick,
    /// Completion tick of the reload in progress.
    pub reload_complete_at: Option<Tick>,
    reload_started_at: Tick,
}

impl WeaponInstance {
    /// A weapon with a full magazine and its starting reserve.
    pub fn new(kind: WeaponKind, config: &SurvivalConfig) -> Self {
        let spec = config.weapon(kind);
        Self::with_ammo(kind, spec.capacity, spec.starting_reserve)
    }

    pub fn with_ammo(kind: WeaponKind, magazine: u32, reserve: u32) -> Self {
        Self {
            kind,
            magazine,
            reserve,
            ready_at: 0,
            reload_complete_at: None,
            reload_started_at: 0,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_complete_at.is_some()
    }

    /// Reload completion in `[0, 1]`, or `None` when not reloading.
    pub fn reload_progress(&self, now: Tick) -> Option<f32> {
        let complete_at = self.reload_complete_at?;
        let total = complete_at.saturating_sub(self.reload_started_at);
        if total == 0 {
            return Some(1.0);
        }
        let done = now.saturating_sub(self.reload_started_at).min(total);
        Some(done as f32 / total as f32)
    }

    /// Pulls the trigger. On error nothing about the weapon changes.
    ///
    /// `aim` points from `origin` toward the target; its length is only used
    /// to decide where a thrown weapon lands.
    pub fn try_fire<R: Rng>(
        &mut self,
        config: &SurvivalConfig,
        origin: Vec2,
        aim: Vec2,
        now: Tick,
        rng: &mut R,
    ) -> Result<FireOutcome, FireError> {
        let spec = config.weapon(self.kind);

        if spec.uses_ammo() && self.magazine == 0 {
            return Err(FireError::NoAmmo);
        }
        if self.is_reloading() {
            return Err(FireError::Reloading);
        }
        if now < self.ready_at {
            return Err(FireError::OnCooldown);
        }

        let shots = match spec.fire_mode {
            FireMode::Melee => vec![Shot::Melee {
                center: origin,
                radius: spec.range,
                damage: spec.damage,
            }],
            FireMode::Area => {
                let dir = aim.try_normalize().ok_or(FireError::InvalidTarget)?;
                vec![Shot::Thrown {
                    origin,
                    velocity: dir * spec.projectile_speed,
                    travel: aim.length().min(spec.range),
                    detonate_at: now + config.ms_to_ticks(spec.fuse_ms),
                    blast_radius: spec.blast_radius,
                    damage: spec.damage,
                }]
            }
            FireMode::Automatic | FireMode::SemiAutomatic => {
                let dir = aim.try_normalize().ok_or(FireError::InvalidTarget)?;
                (0..spec.pellets)
                    .map(|_| {
                        let dir = if spec.spread > 0.0 {
                            let half = spec.spread / 2.0;
                            Vec2::from_angle(rng.gen_range(-half..=half)).rotate(dir)
                        } else {
                            dir
                        };
                        Shot::Bullet {
                            origin,
                            velocity: dir * spec.projectile_speed,
                            range: spec.range,
                            damage: spec.damage,
                        }
                    })
                    .collect()
            }
        };

        if spec.uses_ammo() {
            self.magazine -= 1;
        }
        self.ready_at = now + config.ms_to_ticks(spec.fire_interval_ms);

        Ok(FireOutcome {
            shots,
            shake: spec.shake,
        })
    }

    /// Starts a timed reload. Returns the completion tick.
    pub fn reload(&mut self, config: &SurvivalConfig, now: Tick) -> Result<Tick, ReloadError> {
        let spec = config.weapon(self.kind);
        if !spec.is_reloadable() {
            return Err(ReloadError::NotReloadable);
        }
        if self.is_reloading() {
            return Err(ReloadError::AlreadyReloading);
        }
        if self.magazine >= spec.capacity {
            return Err(ReloadError::AlreadyFull);
        }
        if self.reserve == 0 {
            return Err(ReloadError::NoReserve);
        }

        let complete_at = now + config.ms_to_ticks(spec.reload_ms);
        self.reload_started_at = now;
        self.reload_complete_at = Some(complete_at);
        Ok(complete_at)
    }

    /// Finishes a due reload. Returns true on the tick it completes.
    pub fn update(&mut self, config: &SurvivalConfig, now: Tick) -> bool {
        match self.reload_complete_at {
            Some(complete_at) if now >= complete_at => {
                let capacity = config.weapon(self.kind).capacity;
                let moved = self.reserve.min(capacity.saturating_sub(self.magazine));
                self.magazine += moved;
                self.reserve -= moved;
                self.reload_complete_at = None;
                true
            }
            _ => false,
        }
    }

    /// Abandons a reload in progress. Time spent is lost and no ammo moves.
    pub fn cancel_reload(&mut self) -> bool {
        self.reload_complete_at.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn small_pistol_config() -> SurvivalConfig {
        let mut config = SurvivalConfig::default();
        config.pistol.capacity = 8;
        config.pistol.fire_interval_ms = 250;
        config
    }

    #[test]
    fn empty_magazine_fires_nothing_and_reload_needs_reserve() {
        let config = small_pistol_config();
        let mut pistol = WeaponInstance::with_ammo(WeaponKind::Pistol, 8, 0);
        let mut rng = rng();
        let interval = config.ms_to_ticks(250);

        let mut now = 0;
        for _ in 0..8 {
            let outcome = pistol
                .try_fire(&config, Vec2::ZERO, Vec2::X, now, &mut rng)
                .expect("has ammo");
            assert_eq!(outcome.shots.len(), 1);
            now += interval;
        }

        let before = pistol.clone();
        assert_eq!(
            pistol.try_fire(&config, Vec2::ZERO, Vec2::X, now, &mut rng),
            Err(FireError::NoAmmo)
        );
        assert_eq!(pistol, before, "failed fire must not mutate");

        assert_eq!(pistol.reload(&config, now), Err(ReloadError::NoReserve));

        pistol.reserve = 20;
        let done = pistol.reload(&config, now).expect("reserve available");
        assert_eq!(pistol.reload(&config, now), Err(ReloadError::AlreadyReloading));
        assert_eq!(
            pistol.try_fire(&config, Vec2::ZERO, Vec2::X, now, &mut rng),
            Err(FireError::NoAmmo)
        );

        assert!(!pistol.update(&config, done - 1));
        assert!(pistol.update(&config, done));
        assert_eq!(pistol.magazine, 8);
        assert_eq!(pistol.reserve, 12);
    }

    #[test]
    fn empty_magazine_reports_no_ammo_before_cooldown() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::with_ammo(WeaponKind::Pistol, 1, 10);
        let mut rng = rng();

        pistol
            .try_fire(&config, Vec2::ZERO, Vec2::X, 0, &mut rng)
            .expect("last round");
        assert_eq!(
            pistol.try_fire(&config, Vec2::ZERO, Vec2::X, 1, &mut rng),
            Err(FireError::NoAmmo)
        );
    }

    #[test]
    fn partial_magazine_cannot_fire_while_reloading() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::with_ammo(WeaponKind::Pistol, 4, 10);
        let mut rng = rng();

        pistol.reload(&config, 0).expect("starts");
        assert_eq!(
            pistol.try_fire(&config, Vec2::ZERO, Vec2::X, 1, &mut rng),
            Err(FireError::Reloading)
        );
        assert_eq!(pistol.magazine, 4);
    }

    #[test]
    fn reload_moves_only_what_reserve_has() {
        let config = SurvivalConfig::default();
        let mut rifle = WeaponInstance::with_ammo(WeaponKind::AssaultRifle, 25, 3);
        let done = rifle.reload(&config, 10).expect("starts");
        assert_eq!(done, 10 + config.ms_to_ticks(config.assault_rifle.reload_ms));
        rifle.update(&config, done);
        assert_eq!((rifle.magazine, rifle.reserve), (28, 0));
    }

    #[test]
    fn full_magazine_and_knife_cannot_reload() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::new(WeaponKind::Pistol, &config);
        assert_eq!(pistol.reload(&config, 0), Err(ReloadError::AlreadyFull));

        let mut knife = WeaponInstance::new(WeaponKind::Knife, &config);
        assert_eq!(knife.reload(&config, 0), Err(ReloadError::NotReloadable));
        let mut grenade = WeaponInstance::with_ammo(WeaponKind::Grenade, 1, 0);
        assert_eq!(grenade.reload(&config, 0), Err(ReloadError::NotReloadable));
    }

    #[test]
    fn cooldown_blocks_until_interval_elapses() {
        let config = SurvivalConfig::default();
        let mut smg = WeaponInstance::new(WeaponKind::Smg, &config);
        let mut rng = rng();

        smg.try_fire(&config, Vec2::ZERO, Vec2::Y, 100, &mut rng)
            .expect("first shot");
        assert_eq!(
            smg.try_fire(&config, Vec2::ZERO, Vec2::Y, 101, &mut rng),
            Err(FireError::OnCooldown)
        );
        let ready = 100 + config.ms_to_ticks(config.smg.fire_interval_ms);
        assert!(smg.try_fire(&config, Vec2::ZERO, Vec2::Y, ready, &mut rng).is_ok());
        assert_eq!(smg.magazine, config.smg.capacity - 2);
    }

    #[test]
    fn zero_aim_is_rejected_without_spending_ammo() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::new(WeaponKind::Pistol, &config);
        assert_eq!(
            pistol.try_fire(&config, Vec2::ZERO, Vec2::ZERO, 0, &mut rng()),
            Err(FireError::InvalidTarget)
        );
        assert_eq!(pistol.magazine, config.pistol.capacity);
        assert_eq!(pistol.ready_at, 0);
    }

    #[test]
    fn shotgun_spreads_pellets_within_cone() {
        let config = SurvivalConfig::default();
        let mut shotgun = WeaponInstance::new(WeaponKind::Shotgun, &config);
        let outcome = shotgun
            .try_fire(&config, Vec2::ZERO, Vec2::X, 0, &mut rng())
            .expect("fires");

        assert_eq!(outcome.shots.len(), 5);
        assert_eq!(shotgun.magazine, config.shotgun.capacity - 1);
        assert_eq!(outcome.shake, config.shotgun.shake);
        for shot in &outcome.shots {
            let Shot::Bullet { velocity, .. } = shot else {
                panic!("shotgun fires bullets");
            };
            let angle = Vec2::X.angle_between(*velocity).abs();
            assert!(angle <= config.shotgun.spread / 2.0 + 1e-4);
            assert!((velocity.length() - config.shotgun.projectile_speed).abs() < 1e-2);
        }
    }

    #[test]
    fn knife_needs_no_ammo_or_aim() {
        let config = SurvivalConfig::default();
        let mut knife = WeaponInstance::new(WeaponKind::Knife, &config);
        let outcome = knife
            .try_fire(&config, Vec2::new(5.0, 5.0), Vec2::ZERO, 0, &mut rng())
            .expect("melee always available");
        assert_eq!(
            outcome.shots,
            vec![Shot::Melee {
                center: Vec2::new(5.0, 5.0),
                radius: 50.0,
                damage: 50
            }]
        );
    }

    #[test]
    fn grenade_lands_short_of_range_when_aimed_close() {
        let config = SurvivalConfig::default();
        let mut grenade = WeaponInstance::with_ammo(WeaponKind::Grenade, 1, 0);
        let outcome = grenade
            .try_fire(&config, Vec2::ZERO, Vec2::new(120.0, 0.0), 30, &mut rng())
            .expect("one grenade");
        let Shot::Thrown {
            travel,
            detonate_at,
            ..
        } = outcome.shots[0]
        else {
            panic!("grenade is thrown");
        };
        assert_eq!(travel, 120.0);
        assert_eq!(detonate_at, 30 + config.ms_to_ticks(2000));
        assert_eq!(grenade.magazine, 0);

        let ready = grenade.ready_at;
        assert_eq!(
            grenade.try_fire(&config, Vec2::ZERO, Vec2::X, ready, &mut rng()),
            Err(FireError::NoAmmo)
        );
    }

    #[test]
    fn cancel_reload_keeps_ammo_where_it_was() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::with_ammo(WeaponKind::Pistol, 2, 30);
        let done = pistol.reload(&config, 0).expect("starts");
        assert!(pistol.cancel_reload());
        assert!(!pistol.cancel_reload());
        assert!(!pistol.update(&config, done));
        assert_eq!((pistol.magazine, pistol.reserve), (2, 30));
    }

    #[test]
    fn reload_progress_rises_to_one() {
        let config = SurvivalConfig::default();
        let mut pistol = WeaponInstance::with_ammo(WeaponKind::Pistol, 0, 30);
        assert_eq!(pistol.reload_progress(0), None);
        let done = pistol.reload(&config, 10).expect("starts");
        assert_eq!(pistol.reload_progress(10), Some(0.0));
        assert_eq!(pistol.reload_progress(done), Some(1.0));
    }
}
