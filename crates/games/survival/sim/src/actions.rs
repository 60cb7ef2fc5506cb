use crate::config::StructureKind;
use crate::player::WeaponSwitch;
use crate::shop::ShopItem;
use crate::world::Cell;
use glam::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum SurvivalAction {
    /// Replaces the held input. `aim` is a world-space point.
    SetControls {
        movement: Vec2,
        aim: Vec2,
        fire_held: bool,
    },
    Reload,
    SwitchWeapon(WeaponSwitch),
    ThrowGrenade,
    /// Freezes or resumes the simulation. Only honored during a wave.
    TogglePause,
    StartWave,
    Buy(ShopItem),
    PlaceStructure { kind: StructureKind, cell: Cell },
}
