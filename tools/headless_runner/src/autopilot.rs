use glam::Vec2;
use sim_survival::{Cell, ShopItem, StructureKind, SurvivalAction, WeaponKind, WeaponSwitch};
use survival_types::{SurvivalObservation, WaveStatus};

/// Loadout slot of the assault rifle.
const RIFLE_SLOT: u8 = 2;
/// Loadout slot of the SMG, used once the rifle is dry.
const SMG_SLOT: u8 = 3;
const ENGAGE_RANGE: f32 = 550.0;
/// Back away from anything closer than this.
const PANIC_RANGE: f32 = 90.0;
const GRENADE_CLUSTER: usize = 3;
const GRENADE_CLUSTER_RADIUS: f32 = 120.0;
const MAX_TURRETS: usize = 4;

/// Scripted player: builds turrets between waves, shoots the nearest zombie
/// during them.
pub struct Autopilot {
    turret_cells: Vec<Cell>,
}

impl Autopilot {
    pub fn new(obs: &SurvivalObservation) -> Self {
        let cx = (obs.player.position.x / obs.cell_size) as i32;
        let cy = (obs.player.position.y / obs.cell_size) as i32;
        // Zombies come from the right edge.
        let turret_cells = [(4, 0), (4, -4), (4, 4), (8, 0)]
            .into_iter()
            .map(|(dx, dy)| (cx + dx, cy + dy))
            .filter(|&(x, y)| x >= 0 && y >= 0)
            .map(|(x, y)| Cell::new(x as u16, y as u16))
            .take(MAX_TURRETS)
            .collect();
        Self { turret_cells }
    }

    pub fn decide(&mut self, obs: &SurvivalObservation) -> Vec<SurvivalAction> {
        match obs.wave_status {
            WaveStatus::Shopping { .. } => self.shop(obs),
            WaveStatus::Spawning { .. } | WaveStatus::InProgress { .. } => self.fight(obs),
            _ => Vec::new(),
        }
    }

    fn shop(&mut self, obs: &SurvivalObservation) -> Vec<SurvivalAction> {
        let mut actions = Vec::new();
        let mut cash = obs.cash;
        let price = |item: &str| {
            obs.shop
                .iter()
                .find(|offer| offer.item == item)
                .map(|offer| offer.price)
        };

        if let Some(cost) = price(StructureKind::Turret.name()) {
            while cash >= cost {
                let Some(cell) = self.turret_cells.pop() else {
                    break;
                };
                actions.push(SurvivalAction::PlaceStructure {
                    kind: StructureKind::Turret,
                    cell,
                });
                cash -= cost;
            }
        }

        let rifle_low = obs
            .weapons
            .get(RIFLE_SLOT as usize)
            .and_then(|w| w.reserve.zip(w.capacity))
            .is_some_and(|(reserve, capacity)| reserve < capacity * 2);
        let ammo = ShopItem::Ammo(WeaponKind::AssaultRifle);
        if let Some(cost) = price(&ammo.name()) {
            if rifle_low && cash >= cost {
                actions.push(SurvivalAction::Buy(ammo));
                cash -= cost;
            }
        }

        if obs.player.health < obs.player.max_health / 2 {
            if let Some(cost) = price(&ShopItem::Medkit.name()) {
                if cash >= cost {
                    actions.push(SurvivalAction::Buy(ShopItem::Medkit));
                }
            }
        }

        actions.push(SurvivalAction::StartWave);
        actions
    }

    fn fight(&mut self, obs: &SurvivalObservation) -> Vec<SurvivalAction> {
        let mut actions = Vec::new();
        let me = Vec2::new(obs.player.position.x, obs.player.position.y);
        let zombies: Vec<Vec2> = obs
            .zombies
            .iter()
            .map(|z| Vec2::new(z.position.x, z.position.y))
            .collect();

        let wanted = match obs.weapons.get(RIFLE_SLOT as usize) {
            Some(rifle) if rifle.magazine == Some(0) && rifle.reserve == Some(0) => SMG_SLOT,
            _ => RIFLE_SLOT,
        };
        if obs.player.current_weapon != wanted as usize {
            actions.push(SurvivalAction::SwitchWeapon(WeaponSwitch::Slot(wanted)));
        }

        let nearest = zombies
            .iter()
            .copied()
            .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)));
        let Some(target) = nearest else {
            actions.push(SurvivalAction::SetControls {
                movement: Vec2::ZERO,
                aim: me + Vec2::X,
                fire_held: false,
            });
            return actions;
        };

        let distance = target.distance(me);
        let movement = if distance < PANIC_RANGE {
            (me - target).normalize_or_zero()
        } else {
            Vec2::ZERO
        };
        actions.push(SurvivalAction::SetControls {
            movement,
            aim: target,
            fire_held: distance <= ENGAGE_RANGE,
        });

        let clustered = zombies
            .iter()
            .filter(|z| z.distance(target) <= GRENADE_CLUSTER_RADIUS)
            .count();
        if obs.player.grenades > 0 && clustered >= GRENADE_CLUSTER && distance > PANIC_RANGE {
            actions.push(SurvivalAction::ThrowGrenade);
        }

        actions
    }
}
