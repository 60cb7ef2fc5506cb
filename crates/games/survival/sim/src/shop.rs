use crate::config::{StructureKind, SurvivalConfig, WeaponKind};
use crate::events::SurvivalEvent;
use crate::state::SurvivalState;
use crate::wave::WavePhase;
use std::fmt;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShopItem {
    /// One magazine worth of reserve ammunition.
    Ammo(WeaponKind),
    Grenade,
    Medkit,
}

impl ShopItem {
    pub fn name(self) -> String {
        match self {
            ShopItem::Ammo(kind) => format!("Ammo:{}", kind.name()),
            ShopItem::Grenade => "Grenade".to_string(),
            ShopItem::Medkit => "Medkit".to_string(),
        }
    }

    pub fn price(self, config: &SurvivalConfig) -> u32 {
        match self {
            ShopItem::Ammo(kind) => config.weapon(kind).ammo_price,
            ShopItem::Grenade => config.shop.grenade_price,
            ShopItem::Medkit => config.shop.medkit_price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseError {
    ShopClosed,
    InsufficientFunds { price: u32, have: u32 },
    /// The item would have no effect (full health, grenades at capacity,
    /// ammunition for a weapon that takes none).
    NotApplicable,
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::ShopClosed => write!(f, "the shop is closed during a wave"),
            PurchaseError::InsufficientFunds { price, have } => {
                write!(f, "need {price} cash, have {have}")
            }
            PurchaseError::NotApplicable => write!(f, "item would have no effect"),
        }
    }
}

impl std::error::Error for PurchaseError {}

/// Everything for sale between waves with its price, structures included.
pub fn offers(config: &SurvivalConfig) -> Vec<(String, u32)> {
    let ammo = WeaponKind::LOADOUT
        .into_iter()
        .filter(|&kind| config.weapon(kind).is_reloadable())
        .map(ShopItem::Ammo);
    let items = ammo
        .chain([ShopItem::Grenade, ShopItem::Medkit])
        .map(|item| (item.name(), item.price(config)));
    let structures = StructureKind::ALL
        .into_iter()
        .map(|kind| (kind.name().to_string(), config.structure(kind).cost));
    items.chain(structures).collect()
}

/// Buys `item`. Either the price is debited and the effect applied, or
/// nothing changes.
pub fn purchase(
    state: &mut SurvivalState,
    item: ShopItem,
    events: &mut Vec<SurvivalEvent>,
) -> Result<u32, PurchaseError> {
    if state.wave.phase != WavePhase::Shopping {
        return Err(PurchaseError::ShopClosed);
    }

    let price = item.price(&state.config);
    let config = &state.config;
    let Some(entity) = state.world.get_mut(state.player).filter(|e| e.is_alive()) else {
        return Err(PurchaseError::NotApplicable);
    };

    // Check applicability before touching the balance.
    let applicable = match item {
        ShopItem::Ammo(kind) => {
            config.weapon(kind).is_reloadable()
                && entity
                    .as_player()
                    .is_some_and(|p| p.loadout.iter().any(|w| w.kind == kind))
        }
        ShopItem::Grenade => entity
            .as_player()
            .is_some_and(|p| p.grenade.magazine < config.grenade.capacity),
        ShopItem::Medkit => entity.health.current() < entity.health.max(),
    };
    if !applicable {
        return Err(PurchaseError::NotApplicable);
    }
    if !state.economy.debit(price) {
        return Err(PurchaseError::InsufficientFunds {
            price,
            have: state.economy.cash(),
        });
    }

    match item {
        ShopItem::Ammo(kind) => {
            let capacity = config.weapon(kind).capacity;
            if let Some(weapon) = entity.as_player_mut().and_then(|p| p.weapon_mut(kind)) {
                weapon.reserve = weapon.reserve.saturating_add(capacity);
            }
        }
        ShopItem::Grenade => {
            if let Some(player) = entity.as_player_mut() {
                player.grenade.magazine += 1;
            }
        }
        ShopItem::Medkit => {
            entity.health.heal(config.shop.medkit_heal);
        }
    }

    let balance = state.economy.cash();
    info!(item = %item.name(), price, cash = balance, "item purchased");
    events.push(SurvivalEvent::ItemPurchased {
        item,
        price,
        balance,
    });
    Ok(price)
}
