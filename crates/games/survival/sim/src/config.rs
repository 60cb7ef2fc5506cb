use serde::{Deserialize, Serialize};
use sim_core::{Micros, Tick};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    AssaultRifle,
    Smg,
    BattleRifle,
    Shotgun,
    Knife,
    Grenade,
}

impl WeaponKind {
    /// Switchable weapons in slot order. Grenades are thrown separately.
    pub const LOADOUT: [WeaponKind; 6] = [
        WeaponKind::Pistol,
        WeaponKind::Knife,
        WeaponKind::AssaultRifle,
        WeaponKind::Smg,
        WeaponKind::Shotgun,
        WeaponKind::BattleRifle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Pistol",
            WeaponKind::AssaultRifle => "AssaultRifle",
            WeaponKind::Smg => "SMG",
            WeaponKind::BattleRifle => "BattleRifle",
            WeaponKind::Shotgun => "Shotgun",
            WeaponKind::Knife => "Knife",
            WeaponKind::Grenade => "Grenade",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireMode {
    /// Fires every cooldown while the trigger is held.
    Automatic,
    /// Fires once per trigger press.
    SemiAutomatic,
    /// Instant hit volume around the wielder, no ammunition.
    Melee,
    /// Thrown explosive that detonates after a fuse.
    Area,
}

impl FireMode {
    pub fn name(self) -> &'static str {
        match self {
            FireMode::Automatic => "automatic",
            FireMode::SemiAutomatic => "semi-automatic",
            FireMode::Melee => "melee",
            FireMode::Area => "area",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZombieKind {
    Normal,
    Fast,
    Tank,
    Boss,
}

impl ZombieKind {
    pub fn name(self) -> &'static str {
        match self {
            ZombieKind::Normal => "Normal",
            ZombieKind::Fast => "Fast",
            ZombieKind::Tank => "Tank",
            ZombieKind::Boss => "Boss",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    Wall,
    Turret,
    AdvancedTurret,
    SpikeTrap,
    SlowTrap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureClass {
    Wall,
    Turret,
    Trap,
}

impl StructureKind {
    pub const ALL: [StructureKind; 5] = [
        StructureKind::Wall,
        StructureKind::Turret,
        StructureKind::AdvancedTurret,
        StructureKind::SpikeTrap,
        StructureKind::SlowTrap,
    ];

    pub fn class(self) -> StructureClass {
        match self {
            StructureKind::Wall => StructureClass::Wall,
            StructureKind::Turret | StructureKind::AdvancedTurret => StructureClass::Turret,
            StructureKind::SpikeTrap | StructureKind::SlowTrap => StructureClass::Trap,
        }
    }

    /// Walls and turrets stop zombies and can be attacked; traps are walked over.
    pub fn is_blocking(self) -> bool {
        self.class() != StructureClass::Trap
    }

    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Wall => "Wall",
            StructureKind::Turret => "Turret",
            StructureKind::AdvancedTurret => "AdvancedTurret",
            StructureKind::SpikeTrap => "SpikeTrap",
            StructureKind::SlowTrap => "SlowTrap",
        }
    }
}

/// Static definition of a weapon kind. Distances are world units, speeds are
/// world units per second, durations are milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub damage: i32,
    pub fire_interval_ms: u32,
    /// Magazine size. For grenades, the most the player can carry.
    pub capacity: u32,
    pub starting_reserve: u32,
    pub reload_ms: u32,
    pub projectile_speed: f32,
    pub range: f32,
    /// Full cone angle in radians; each pellet is offset within +/- half of it.
    pub spread: f32,
    pub pellets: u32,
    pub fire_mode: FireMode,
    pub shake: f32,
    #[serde(default)]
    pub blast_radius: f32,
    #[serde(default)]
    pub fuse_ms: u32,
    /// Price of one magazine worth of reserve ammunition.
    #[serde(default)]
    pub ammo_price: u32,
}

impl WeaponSpec {
    pub fn uses_ammo(&self) -> bool {
        self.fire_mode != FireMode::Melee
    }

    pub fn is_reloadable(&self) -> bool {
        matches!(
            self.fire_mode,
            FireMode::Automatic | FireMode::SemiAutomatic
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZombieSpec {
    pub speed: f32,
    pub health: i32,
    pub contact_damage: i32,
    /// Gap between the zombie's body and its target's body it can attack across.
    pub attack_range: f32,
    pub attack_interval_ms: u32,
    pub radius: f32,
    pub cash_reward: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub cost: u32,
    pub health: i32,
    #[serde(default)]
    pub damage: i32,
    /// Turret reload time between shots.
    #[serde(default)]
    pub fire_interval_ms: u32,
    #[serde(default)]
    pub range: f32,
    #[serde(default)]
    pub projectile_speed: f32,
    /// Speed multiplier applied by slow traps.
    #[serde(default = "no_slow")]
    pub slow_factor: f32,
    #[serde(default)]
    pub slow_duration_ms: u32,
    /// How often a trap may affect the same zombie.
    #[serde(default)]
    pub trigger_interval_ms: u32,
}

fn no_slow() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSpec {
    pub speed: f32,
    pub health: i32,
    pub radius: f32,
    pub starting_grenades: u32,
}

impl Default for PlayerSpec {
    fn default() -> Self {
        Self {
            speed: 420.0,
            health: 100,
            radius: 16.0,
            starting_grenades: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSpec {
    pub base_size: u32,
    pub size_growth: u32,
    pub spawn_interval_ms: u32,
    pub spawn_interval_step_ms: u32,
    pub min_spawn_interval_ms: u32,
    /// Chance that a spawn is a Fast or Tank zombie instead of a Normal one.
    pub special_chance: f64,
    /// Every n-th wave adds a boss on top of the quota. 0 disables bosses.
    pub boss_every: u32,
    pub reward_base: u32,
    pub reward_growth: u32,
    /// Distance from the world edge at which zombies enter.
    pub spawn_margin: f32,
}

impl WaveSpec {
    /// Regular zombies in `wave`, not counting a boss.
    pub fn quota(&self, wave: u32) -> u32 {
        self.base_size + self.size_growth * wave.saturating_sub(1)
    }

    /// Milliseconds between spawns during `wave`.
    pub fn spawn_interval_for(&self, wave: u32) -> u32 {
        self.spawn_interval_ms
            .saturating_sub(self.spawn_interval_step_ms.saturating_mul(wave.saturating_sub(1)))
            .max(self.min_spawn_interval_ms)
    }

    pub fn is_boss_wave(&self, wave: u32) -> bool {
        self.boss_every > 0 && wave > 0 && wave % self.boss_every == 0
    }

    pub fn clear_reward(&self, wave: u32) -> u32 {
        self.reward_base + self.reward_growth * wave.saturating_sub(1)
    }
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            base_size: 5,
            size_growth: 2,
            spawn_interval_ms: 2000,
            spawn_interval_step_ms: 100,
            min_spawn_interval_ms: 500,
            special_chance: 0.2,
            boss_every: 5,
            reward_base: 100,
            reward_growth: 25,
            spawn_margin: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSpec {
    pub grenade_price: u32,
    pub medkit_price: u32,
    pub medkit_heal: i32,
}

impl Default for ShopSpec {
    fn default() -> Self {
        Self {
            grenade_price: 50,
            medkit_price: 100,
            medkit_heal: 50,
        }
    }
}

/// All balance data for a match. Deserializes from JSON; omitted fields keep
/// their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalConfig {
    pub tick_hz: u32,
    pub world_width: f32,
    pub world_height: f32,
    /// Side length of a structure placement cell.
    pub cell_size: f32,

    pub starting_cash: u32,
    /// Clearing this many waves wins the match. `None` plays until death.
    pub waves_total: Option<u32>,

    pub camera_shake_intensity: f32,
    /// Multiplier applied to the shake magnitude every tick.
    pub camera_shake_decay: f32,

    pub player: PlayerSpec,
    pub waves: WaveSpec,
    pub shop: ShopSpec,

    // Weapon specs
    pub pistol: WeaponSpec,
    pub assault_rifle: WeaponSpec,
    pub smg: WeaponSpec,
    pub battle_rifle: WeaponSpec,
    pub shotgun: WeaponSpec,
    pub knife: WeaponSpec,
    pub grenade: WeaponSpec,

    // Zombie specs
    pub normal_zombie: ZombieSpec,
    pub fast_zombie: ZombieSpec,
    pub tank_zombie: ZombieSpec,
    pub boss_zombie: ZombieSpec,

    // Structure specs
    pub wall: StructureSpec,
    pub turret: StructureSpec,
    pub advanced_turret: StructureSpec,
    pub spike_trap: StructureSpec,
    pub slow_trap: StructureSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The input is not valid JSON for this config.
    Parse(String),
    /// The config parsed but describes an impossible match.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SurvivalConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.tick_hz == 0 {
            return invalid("tick_hz must be positive".into());
        }
        if self.world_width <= 0.0 || self.world_height <= 0.0 || self.cell_size <= 0.0 {
            return invalid("world and cell dimensions must be positive".into());
        }
        let max_cells = u16::MAX as f32;
        if self.world_width / self.cell_size > max_cells
            || self.world_height / self.cell_size > max_cells
        {
            return invalid("cell_size too small for the world".into());
        }
        if self.player.health <= 0 {
            return invalid("player health must be positive".into());
        }
        if self.camera_shake_decay < 0.0 || self.camera_shake_decay >= 1.0 {
            return invalid("camera_shake_decay must be in [0, 1)".into());
        }
        if !(0.0..=1.0).contains(&self.waves.special_chance) {
            return invalid("waves.special_chance must be in [0, 1]".into());
        }
        for kind in WeaponKind::LOADOUT.into_iter().chain([WeaponKind::Grenade]) {
            let spec = self.weapon(kind);
            if spec.uses_ammo() && spec.capacity == 0 {
                return invalid(format!("{} capacity must be positive", kind.name()));
            }
            if spec.pellets == 0 {
                return invalid(format!("{} must fire at least one pellet", kind.name()));
            }
        }
        if self.player.starting_grenades > self.grenade.capacity {
            return invalid("starting grenades exceed grenade capacity".into());
        }
        for kind in StructureKind::ALL {
            let spec = self.structure(kind);
            if spec.health <= 0 {
                return invalid(format!("{} health must be positive", kind.name()));
            }
            if !(spec.slow_factor > 0.0 && spec.slow_factor <= 1.0) {
                return invalid(format!("{} slow_factor must be in (0, 1]", kind.name()));
            }
        }
        if self.slow_trap.slow_factor >= 1.0 {
            return invalid("slow trap must reduce speed".into());
        }
        Ok(())
    }

    pub fn weapon(&self, kind: WeaponKind) -> &WeaponSpec {
        match kind {
            WeaponKind::Pistol => &self.pistol,
            WeaponKind::AssaultRifle => &self.assault_rifle,
            WeaponKind::Smg => &self.smg,
            WeaponKind::BattleRifle => &self.battle_rifle,
            WeaponKind::Shotgun => &self.shotgun,
            WeaponKind::Knife => &self.knife,
            WeaponKind::Grenade => &self.grenade,
        }
    }

    pub fn zombie(&self, kind: ZombieKind) -> &ZombieSpec {
        match kind {
            ZombieKind::Normal => &self.normal_zombie,
            ZombieKind::Fast => &self.fast_zombie,
            ZombieKind::Tank => &self.tank_zombie,
            ZombieKind::Boss => &self.boss_zombie,
        }
    }

    pub fn structure(&self, kind: StructureKind) -> &StructureSpec {
        match kind {
            StructureKind::Wall => &self.wall,
            StructureKind::Turret => &self.turret,
            StructureKind::AdvancedTurret => &self.advanced_turret,
            StructureKind::SpikeTrap => &self.spike_trap,
            StructureKind::SlowTrap => &self.slow_trap,
        }
    }

    /// Milliseconds to whole ticks, rounded up so cooldowns never run short.
    pub fn ms_to_ticks(&self, ms: u32) -> Tick {
        Micros::from_millis(ms).to_ticks_ceil(self.tick_hz)
    }

    /// Seconds per tick.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz as f32
    }

    pub fn grid_width(&self) -> u16 {
        (self.world_width / self.cell_size).floor() as u16
    }

    pub fn grid_height(&self) -> u16 {
        (self.world_height / self.cell_size).floor() as u16
    }
}

#[allow(clippy::too_many_arguments)]
fn gun(
    damage: i32,
    fire_interval_ms: u32,
    capacity: u32,
    reload_ms: u32,
    range: f32,
    fire_mode: FireMode,
    shake: f32,
    ammo_price: u32,
) -> WeaponSpec {
    WeaponSpec {
        damage,
        fire_interval_ms,
        capacity,
        starting_reserve: capacity * 4,
        reload_ms,
        projectile_speed: 900.0,
        range,
        spread: 0.0,
        pellets: 1,
        fire_mode,
        shake,
        blast_radius: 0.0,
        fuse_ms: 0,
        ammo_price,
    }
}

impl Default for SurvivalConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            world_width: 2400.0,
            world_height: 1800.0,
            cell_size: 32.0,

            starting_cash: 500,
            waves_total: None,

            camera_shake_intensity: 8.0,
            camera_shake_decay: 0.9,

            player: PlayerSpec::default(),
            waves: WaveSpec::default(),
            shop: ShopSpec::default(),

            pistol: gun(25, 250, 12, 1500, 400.0, FireMode::SemiAutomatic, 0.7, 30),
            assault_rifle: gun(15, 100, 30, 2500, 600.0, FireMode::Automatic, 0.5, 60),
            smg: gun(12, 80, 35, 1800, 400.0, FireMode::Automatic, 0.3, 50),
            battle_rifle: gun(45, 200, 20, 2200, 800.0, FireMode::SemiAutomatic, 0.9, 70),
            shotgun: WeaponSpec {
                spread: 0.4,
                pellets: 5,
                ..gun(10, 750, 6, 2000, 200.0, FireMode::SemiAutomatic, 1.2, 40)
            },
            knife: WeaponSpec {
                starting_reserve: 0,
                projectile_speed: 0.0,
                ..gun(50, 1000, 0, 0, 50.0, FireMode::Melee, 0.5, 0)
            },
            grenade: WeaponSpec {
                starting_reserve: 0,
                projectile_speed: 600.0,
                blast_radius: 100.0,
                fuse_ms: 2000,
                ..gun(100, 2000, 5, 0, 400.0, FireMode::Area, 2.0, 0)
            },

            normal_zombie: ZombieSpec {
                speed: 120.0,
                health: 100,
                contact_damage: 10,
                attack_range: 18.0,
                attack_interval_ms: 1000,
                radius: 16.0,
                cash_reward: 10,
            },
            fast_zombie: ZombieSpec {
                speed: 240.0,
                health: 50,
                contact_damage: 5,
                attack_range: 18.0,
                attack_interval_ms: 1000,
                radius: 14.0,
                cash_reward: 15,
            },
            tank_zombie: ZombieSpec {
                speed: 60.0,
                health: 200,
                contact_damage: 20,
                attack_range: 18.0,
                attack_interval_ms: 1000,
                radius: 20.0,
                cash_reward: 25,
            },
            boss_zombie: ZombieSpec {
                speed: 60.0,
                health: 1000,
                contact_damage: 30,
                attack_range: 24.0,
                attack_interval_ms: 1000,
                radius: 28.0,
                cash_reward: 150,
            },

            wall: StructureSpec {
                cost: 100,
                health: 200,
                damage: 0,
                fire_interval_ms: 0,
                range: 0.0,
                projectile_speed: 0.0,
                slow_factor: 1.0,
                slow_duration_ms: 0,
                trigger_interval_ms: 0,
            },
            turret: StructureSpec {
                cost: 300,
                health: 150,
                damage: 10,
                fire_interval_ms: 1000,
                range: 200.0,
                projectile_speed: 900.0,
                slow_factor: 1.0,
                slow_duration_ms: 0,
                trigger_interval_ms: 0,
            },
            advanced_turret: StructureSpec {
                cost: 500,
                health: 200,
                damage: 15,
                fire_interval_ms: 500,
                range: 300.0,
                projectile_speed: 900.0,
                slow_factor: 1.0,
                slow_duration_ms: 0,
                trigger_interval_ms: 0,
            },
            spike_trap: StructureSpec {
                cost: 150,
                health: 100,
                damage: 20,
                fire_interval_ms: 0,
                range: 0.0,
                projectile_speed: 0.0,
                slow_factor: 1.0,
                slow_duration_ms: 0,
                trigger_interval_ms: 500,
            },
            slow_trap: StructureSpec {
                cost: 200,
                health: 100,
                damage: 0,
                fire_interval_ms: 0,
                range: 0.0,
                projectile_speed: 0.0,
                slow_factor: 0.5,
                slow_duration_ms: 2000,
                trigger_interval_ms: 1000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SurvivalConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SurvivalConfig::from_json_str(
            r#"{ "starting_cash": 75, "waves_total": 3, "waves": { "boss_every": 2 } }"#,
        )
        .expect("valid config");

        assert_eq!(config.starting_cash, 75);
        assert_eq!(config.waves_total, Some(3));
        assert_eq!(config.waves.boss_every, 2);
        assert_eq!(config.waves.base_size, 5);
        assert_eq!(config.pistol.capacity, 12);
    }

    #[test]
    fn rejects_malformed_and_impossible_configs() {
        assert!(matches!(
            SurvivalConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SurvivalConfig::from_json_str(r#"{ "tick_hz": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SurvivalConfig::from_json_str(r#"{ "cell_size": 0.0001 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SurvivalConfig::from_json_str(r#"{ "waves": { "special_chance": 1.5 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn wave_curve_is_monotonic() {
        let waves = WaveSpec::default();
        for wave in 1..40 {
            assert!(waves.quota(wave + 1) >= waves.quota(wave));
            assert!(waves.spawn_interval_for(wave + 1) <= waves.spawn_interval_for(wave));
        }
        assert_eq!(waves.quota(1), 5);
        assert_eq!(waves.quota(3), 9);
        assert_eq!(waves.spawn_interval_for(100), waves.min_spawn_interval_ms);
    }

    #[test]
    fn boss_waves_follow_interval() {
        let waves = WaveSpec::default();
        let bosses: Vec<u32> = (1..=15).filter(|w| waves.is_boss_wave(*w)).collect();
        assert_eq!(bosses, vec![5, 10, 15]);

        let none = WaveSpec {
            boss_every: 0,
            ..WaveSpec::default()
        };
        assert!(!none.is_boss_wave(5));
    }

    #[test]
    fn durations_round_up_to_ticks() {
        let config = SurvivalConfig::default();
        assert_eq!(config.ms_to_ticks(250), 15);
        assert_eq!(config.ms_to_ticks(80), 5);
        assert_eq!(config.ms_to_ticks(0), 0);
    }

    #[test]
    fn structure_classes() {
        assert!(StructureKind::Wall.is_blocking());
        assert!(StructureKind::AdvancedTurret.is_blocking());
        assert!(!StructureKind::SpikeTrap.is_blocking());
        assert_eq!(StructureKind::SlowTrap.class(), StructureClass::Trap);
    }
}
