//! Combat and wave simulation for a top-down zombie survival shooter.
//!
//! [`SurvivalGame`] implements [`sim_core::Game`]: feed it [`SurvivalAction`]s
//! through a host, read [`SurvivalEvent`]s back, and take snapshots with
//! `observe`. Identical config, seed and inputs give identical event streams.

pub mod actions;
pub mod ai;
pub mod combat;
pub mod config;
pub mod economy;
pub mod events;
pub mod game;
pub mod observe;
pub mod player;
pub mod projectile;
pub mod shop;
pub mod state;
pub mod structure;
pub mod wave;
pub mod weapon;
pub mod world;

pub use actions::SurvivalAction;
pub use config::{ConfigError, StructureKind, SurvivalConfig, WeaponKind, ZombieKind};
pub use events::SurvivalEvent;
pub use game::SurvivalGame;
pub use player::{Controls, WeaponSwitch};
pub use shop::ShopItem;
pub use state::SurvivalState;
pub use wave::WavePhase;
pub use world::{Cell, EntityId, EntityKind};
