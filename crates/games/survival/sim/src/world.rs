use crate::ai::{Zombie, ZombieState};
use crate::player::Player;
use crate::projectile::Projectile;
use crate::structure::Structure;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! { pub struct EntityId; }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Zombie,
    Projectile,
    Structure,
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Player => "Player",
            EntityKind::Zombie => "Zombie",
            EntityKind::Projectile => "Projectile",
            EntityKind::Structure => "Structure",
        }
    }
}

/// Hit points clamped to `[0, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn current(self) -> i32 {
        self.current
    }

    pub fn max(self) -> i32 {
        self.max
    }

    pub fn is_depleted(self) -> bool {
        self.current == 0
    }

    /// Returns true only when this call took health from positive to zero.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if self.current == 0 || amount <= 0 {
            return false;
        }
        self.current = (self.current - amount).max(0);
        self.current == 0
    }

    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    pub fn fraction(self) -> f32 {
        self.current as f32 / self.max as f32
    }
}

#[derive(Clone, Debug)]
pub enum Body {
    Player(Player),
    Zombie(Zombie),
    Projectile(Projectile),
    Structure(Structure),
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: Health,
    pub body: Body,
    dead: bool,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.body {
            Body::Player(_) => EntityKind::Player,
            Body::Zombie(_) => EntityKind::Zombie,
            Body::Projectile(_) => EntityKind::Projectile,
            Body::Structure(_) => EntityKind::Structure,
        }
    }

    /// False from the moment the entity is killed or destroyed, even though it
    /// stays in the store until the end-of-frame sweep.
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn overlaps(&self, other: &Entity) -> bool {
        circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }

    /// Gap between the two bodies; negative when they overlap.
    pub fn gap_to(&self, other: &Entity) -> f32 {
        self.pos.distance(other.pos) - self.radius - other.radius
    }

    pub fn as_zombie(&self) -> Option<&Zombie> {
        match &self.body {
            Body::Zombie(z) => Some(z),
            _ => None,
        }
    }

    pub fn as_zombie_mut(&mut self) -> Option<&mut Zombie> {
        match &mut self.body {
            Body::Zombie(z) => Some(z),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match &self.body {
            Body::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match &self.body {
            Body::Projectile(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    fn cash_reward(&self) -> u32 {
        match &self.body {
            Body::Zombie(z) => z.cash_reward,
            _ => 0,
        }
    }
}

pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Emitted exactly once per entity whose health reaches zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeathEvent {
    pub entity: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub cash_reward: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Tracks which placement cells hold a structure.
#[derive(Clone, Debug)]
pub struct PlacementGrid {
    pub width: u16,
    pub height: u16,
    pub cell_size: f32,
    cells: Vec<Option<EntityId>>,
}

impl PlacementGrid {
    pub fn new(width: u16, height: u16, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![None; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub fn get(&self, cell: Cell) -> Option<EntityId> {
        if !self.in_bounds(cell) {
            return None;
        }
        self.cells[self.idx(cell)]
    }

    pub fn set(&mut self, cell: Cell, id: EntityId) {
        if self.in_bounds(cell) {
            let idx = self.idx(cell);
            self.cells[idx] = Some(id);
        }
    }

    /// Frees `cell` if it is still held by `id`.
    pub fn clear(&mut self, cell: Cell, id: EntityId) {
        if self.get(cell) == Some(id) {
            let idx = self.idx(cell);
            self.cells[idx] = None;
        }
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn cell_at(&self, pos: Vec2) -> Option<Cell> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let cell = Cell::new(
            (pos.x / self.cell_size) as u16,
            (pos.y / self.cell_size) as u16,
        );
        self.in_bounds(cell).then_some(cell)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Generation-checked entity arena with deferred removal.
///
/// Killing or destroying an entity only flags it; it is removed by
/// [`World::sweep`] at the end of the frame, so ids gathered earlier in the
/// frame stay valid. After the sweep, stale ids resolve to `None`.
#[derive(Clone, Debug)]
pub struct World {
    entities: SlotMap<EntityId, Entity>,
    pending_removal: Vec<EntityId>,
    pub grid: PlacementGrid,
    pub bounds: Vec2,
}

impl World {
    pub fn new(width: f32, height: f32, grid: PlacementGrid) -> Self {
        Self {
            entities: SlotMap::with_key(),
            pending_removal: Vec::new(),
            grid,
            bounds: Vec2::new(width, height),
        }
    }

    pub fn spawn(&mut self, pos: Vec2, radius: f32, max_health: i32, body: Body) -> EntityId {
        let id = self.entities.insert(Entity {
            pos,
            vel: Vec2::ZERO,
            radius,
            health: Health::new(max_health),
            body,
            dead: false,
        });
        if let Some(Body::Structure(s)) = self.entities.get(id).map(|e| &e.body) {
            let cell = s.cell;
            self.grid.set(cell, id);
        }
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(Entity::is_alive)
    }

    /// Ids of live entities of `kind`, in stable arena order.
    pub fn ids(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.is_alive() && e.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn for_each_alive(&self, kind: EntityKind, mut f: impl FnMut(EntityId, &Entity)) {
        for (id, entity) in self.entities.iter() {
            if entity.is_alive() && entity.kind() == kind {
                f(id, entity);
            }
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .values()
            .filter(|e| e.is_alive() && e.kind() == kind)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Flags a live entity for removal without a death (expiry, range, first hit).
    /// Returns false if it was already gone or flagged.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) if entity.is_alive() => {
                entity.dead = true;
                self.pending_removal.push(id);
                true
            }
            _ => false,
        }
    }

    /// Marks an entity dead. The death is reported only by the first call.
    pub fn kill(&mut self, id: EntityId) -> Option<DeathEvent> {
        let entity = self.entities.get_mut(id)?;
        if !entity.is_alive() {
            return None;
        }
        entity.dead = true;
        entity.vel = Vec2::ZERO;
        if let Body::Zombie(z) = &mut entity.body {
            z.state = ZombieState::Dead;
        }
        let death = DeathEvent {
            entity: id,
            kind: entity.kind(),
            position: entity.pos,
            cash_reward: entity.cash_reward(),
        };
        // The player body stays so the final frame can still be observed.
        if death.kind != EntityKind::Player {
            self.pending_removal.push(id);
        }
        Some(death)
    }

    /// Applies damage and kills the entity if this took its health to zero.
    pub fn damage(&mut self, id: EntityId, amount: i32) -> Option<DeathEvent> {
        let entity = self.entities.get_mut(id)?;
        if !entity.is_alive() {
            return None;
        }
        if entity.health.apply_damage(amount) {
            self.kill(id)
        } else {
            None
        }
    }

    /// Removes every flagged entity, freeing structure cells. Returns what was removed.
    pub fn sweep(&mut self) -> Vec<(EntityId, Entity)> {
        let mut removed = Vec::with_capacity(self.pending_removal.len());
        for id in self.pending_removal.drain(..) {
            if let Some(entity) = self.entities.remove(id) {
                if let Body::Structure(s) = &entity.body {
                    self.grid.clear(s.cell, id);
                }
                removed.push((id, entity));
            }
        }
        removed
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x <= self.bounds.x && pos.y <= self.bounds.y
    }

    pub fn clamp_to_bounds(&self, pos: Vec2, radius: f32) -> Vec2 {
        let min = Vec2::splat(radius);
        let max = (self.bounds - Vec2::splat(radius)).max(min);
        pos.clamp(min, max)
    }
}
