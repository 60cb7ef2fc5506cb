use crate::config::{StructureKind, WeaponKind, ZombieKind};
use crate::player::SwitchError;
use crate::shop::{PurchaseError, ShopItem};
use crate::structure::PlaceError;
use crate::wave::StartWaveError;
use crate::weapon::{FireError, ReloadError};
use crate::world::{Cell, EntityId, EntityKind};
use glam::Vec2;
use sim_core::Tick;

/// Everything observable that happened during a tick, in the order it happened.
#[derive(Clone, Debug, PartialEq)]
pub enum SurvivalEvent {
    // Weapons
    ShotFired {
        weapon: WeaponKind,
        projectiles: u32,
    },
    FireRejected {
        weapon: WeaponKind,
        reason: FireError,
    },
    ReloadStarted {
        weapon: WeaponKind,
        complete_at: Tick,
    },
    ReloadCompleted {
        weapon: WeaponKind,
        magazine: u32,
        reserve: u32,
    },
    ReloadRejected {
        weapon: WeaponKind,
        reason: ReloadError,
    },
    ReloadCancelled {
        weapon: WeaponKind,
    },
    WeaponSwitched {
        from: WeaponKind,
        to: WeaponKind,
    },
    SwitchRejected {
        reason: SwitchError,
    },
    GrenadeThrown {
        id: EntityId,
        remaining: u32,
    },
    GrenadeExploded {
        id: EntityId,
        pos: Vec2,
        radius: f32,
    },

    // Combat
    ProjectileHit {
        projectile: EntityId,
        target: EntityId,
        damage: i32,
    },
    ZombieHit {
        id: EntityId,
        damage: i32,
    },
    PlayerDamaged {
        by: EntityId,
        damage: i32,
        health: i32,
    },
    StructureDamaged {
        id: EntityId,
        by: EntityId,
        damage: i32,
        health: i32,
    },
    EntityDied {
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        cash_reward: u32,
    },
    CashCredited {
        amount: u32,
        balance: u32,
    },

    // Waves
    WaveStarted {
        wave: u32,
        quota: u32,
        boss: bool,
    },
    StartWaveRejected {
        reason: StartWaveError,
    },
    ZombieSpawned {
        id: EntityId,
        kind: ZombieKind,
        pos: Vec2,
    },
    BossSpawned {
        id: EntityId,
        wave: u32,
    },
    SpawningComplete {
        wave: u32,
    },
    WaveCleared {
        wave: u32,
        reward: u32,
    },
    ShopOpened {
        next_wave: u32,
    },
    GameOver {
        wave: u32,
    },
    Victory {
        waves: u32,
    },

    // Shop and building
    ItemPurchased {
        item: ShopItem,
        price: u32,
        balance: u32,
    },
    PurchaseRejected {
        item: ShopItem,
        reason: PurchaseError,
    },
    StructurePlaced {
        id: EntityId,
        kind: StructureKind,
        cell: Cell,
        cost: u32,
    },
    PlaceRejected {
        kind: StructureKind,
        cell: Cell,
        reason: PlaceError,
    },
    TurretFired {
        id: EntityId,
        target: EntityId,
    },
    TrapTriggered {
        id: EntityId,
        kind: StructureKind,
        zombie: EntityId,
    },

    PauseToggled {
        paused: bool,
    },
}

impl SurvivalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SurvivalEvent::ShotFired { .. } => "ShotFired",
            SurvivalEvent::FireRejected { .. } => "FireRejected",
            SurvivalEvent::ReloadStarted { .. } => "ReloadStarted",
            SurvivalEvent::ReloadCompleted { .. } => "ReloadCompleted",
            SurvivalEvent::ReloadRejected { .. } => "ReloadRejected",
            SurvivalEvent::ReloadCancelled { .. } => "ReloadCancelled",
            SurvivalEvent::WeaponSwitched { .. } => "WeaponSwitched",
            SurvivalEvent::SwitchRejected { .. } => "SwitchRejected",
            SurvivalEvent::GrenadeThrown { .. } => "GrenadeThrown",
            SurvivalEvent::GrenadeExploded { .. } => "GrenadeExploded",
            SurvivalEvent::ProjectileHit { .. } => "ProjectileHit",
            SurvivalEvent::ZombieHit { .. } => "ZombieHit",
            SurvivalEvent::PlayerDamaged { .. } => "PlayerDamaged",
            SurvivalEvent::StructureDamaged { .. } => "StructureDamaged",
            SurvivalEvent::EntityDied { .. } => "EntityDied",
            SurvivalEvent::CashCredited { .. } => "CashCredited",
            SurvivalEvent::WaveStarted { .. } => "WaveStarted",
            SurvivalEvent::StartWaveRejected { .. } => "StartWaveRejected",
            SurvivalEvent::ZombieSpawned { .. } => "ZombieSpawned",
            SurvivalEvent::BossSpawned { .. } => "BossSpawned",
            SurvivalEvent::SpawningComplete { .. } => "SpawningComplete",
            SurvivalEvent::WaveCleared { .. } => "WaveCleared",
            SurvivalEvent::ShopOpened { .. } => "ShopOpened",
            SurvivalEvent::GameOver { .. } => "GameOver",
            SurvivalEvent::Victory { .. } => "Victory",
            SurvivalEvent::ItemPurchased { .. } => "ItemPurchased",
            SurvivalEvent::PurchaseRejected { .. } => "PurchaseRejected",
            SurvivalEvent::StructurePlaced { .. } => "StructurePlaced",
            SurvivalEvent::PlaceRejected { .. } => "PlaceRejected",
            SurvivalEvent::TurretFired { .. } => "TurretFired",
            SurvivalEvent::TrapTriggered { .. } => "TrapTriggered",
            SurvivalEvent::PauseToggled { .. } => "PauseToggled",
        }
    }
}
