//! Serializable snapshot types for the zombie survival game.
//!
//! Produced by `sim_survival` once per frame and consumed read-only by
//! rendering, HUD, and audio layers.

use serde::{Deserialize, Serialize};

/// World-space point, in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Placement grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

/// Current wave phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(tag = "type")]
pub enum WaveStatus {
    /// Between waves; the shop is open until the player starts the next wave.
    Shopping {
        next_wave: u32,
        /// Regular zombies in the next wave, not counting a boss.
        next_wave_size: u32,
        next_is_boss_wave: bool,
    },
    /// Zombies are still entering the arena.
    Spawning {
        wave: u32,
        spawned: u32,
        quota: u32,
        next_spawn_tick: u64,
    },
    /// Everything has spawned; waiting for the arena to be cleared.
    InProgress { wave: u32, alive: u32 },
    /// Wave just cleared; the shop opens on the next tick.
    Cleared { wave: u32, reward: u32 },
    GameOver { wave: u32 },
    Victory { waves: u32 },
}

impl Default for WaveStatus {
    fn default() -> Self {
        Self::Shopping {
            next_wave: 1,
            next_wave_size: 0,
            next_is_boss_wave: false,
        }
    }
}

/// State of one weapon in the player's loadout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct WeaponInfo {
    pub kind: String,
    pub fire_mode: String,
    /// `None` for weapons that do not use ammunition.
    pub magazine: Option<u32>,
    pub capacity: Option<u32>,
    pub reserve: Option<u32>,
    /// Present while reloading, rising from 0.0 to 1.0.
    #[serde(default)]
    pub reload_progress: Option<f32>,
    pub ready: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct PlayerInfo {
    pub id: String,
    pub position: Point,
    pub aim: Point,
    pub health: i32,
    pub max_health: i32,
    pub current_weapon: usize,
    pub grenades: u32,
    pub max_grenades: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ZombieInfo {
    pub id: String,
    pub kind: String,
    pub position: Point,
    pub radius: f32,
    pub health: i32,
    pub max_health: i32,
    /// "seeking", "attacking" or "dead".
    pub state: String,
    pub slowed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ProjectileInfo {
    pub id: String,
    /// Weapon or structure kind that launched it.
    pub source: String,
    pub position: Point,
    pub velocity: Point,
    /// Tick a thrown explosive detonates on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuse_tick: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct StructureInfo {
    pub id: String,
    pub kind: String,
    pub cell: Cell,
    pub position: Point,
    pub health: i32,
    pub max_health: i32,
    pub blocking: bool,
}

/// Something purchasable, with its current price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ShopOffer {
    pub item: String,
    pub price: u32,
}

/// Full per-frame presentation snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct SurvivalObservation {
    pub tick: u64,
    pub ticks_per_second: u32,

    pub world_width: f32,
    pub world_height: f32,
    pub cell_size: f32,

    pub cash: u32,
    pub wave_status: WaveStatus,
    pub paused: bool,
    /// Current screen-shake magnitude, 0.0 when still.
    pub camera_shake: f32,

    pub player: PlayerInfo,
    pub weapons: Vec<WeaponInfo>,
    pub zombies: Vec<ZombieInfo>,
    pub projectiles: Vec<ProjectileInfo>,
    pub structures: Vec<StructureInfo>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shop: Vec<ShopOffer>,
}
