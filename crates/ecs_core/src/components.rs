//! Component definitions shared across the simulation crates.
//!
//! Components are small `Copy`-ish structs with public fields. The registry
//! owns one column per component type; systems read and write them directly.

use glam::Vec2;

use crate::Entity;

/// Entity tag bits (coarse grouping, independent of collision layers).
pub mod tag {
    pub const PLAYER: u32 = 1 << 0;
    pub const ENEMY: u32 = 1 << 1;
    pub const BOLT: u32 = 1 << 2;
    pub const OBSTACLE: u32 = 1 << 3;
    pub const WORLD: u32 = 1 << 4;
}

/// Collision layer bits. `Collider::layer` says what an entity is,
/// `Collider::mask` says what it can hit.
pub mod layer {
    pub const PLAYER: u32 = 1 << 0;
    pub const ENEMY: u32 = 1 << 1;
    pub const PLAYER_BOLT: u32 = 1 << 2;
    pub const ENEMY_BOLT: u32 = 1 << 3;
    pub const OBSTACLE: u32 = 1 << 4;
    pub const WORLD: u32 = 1 << 5;
}

/// Stable identifier for a registered hull panel (not an ECS entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u32);

/// World placement. Owned exclusively by the entity; mutated by AI action
/// leaves, motion integration and wave placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub pos: Vec2,
    pub rot: f32,
    pub scale: f32,
}

impl Transform {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, rot: 0.0, scale: 1.0 }
    }
}

/// Linear velocity plus friction damping, consumed by motion integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub vel: Vec2,
    pub friction: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self { vel: Vec2::ZERO, friction: 0.0 }
    }
}

/// Narrow-phase shape. Rects are axis-aligned and centered on the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { w: f32, h: f32 },
}

/// Collision participation. A zero `mask` marks a passive collider that the
/// broad-phase never seeds pairs from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    pub layer: u32,
    pub mask: u32,
}

impl Collider {
    pub fn circle(radius: f32, layer: u32, mask: u32) -> Self {
        Self { shape: Shape::Circle { radius }, layer, mask }
    }

    /// Conservative radius used for broad-phase queries.
    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { w, h } => 0.5 * (w * w + h * h).sqrt(),
        }
    }
}

/// Hit points. Zero or below triggers destruction in combat resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub hp: i32,
    pub max: i32,
}

impl Health {
    pub fn full(max: i32) -> Self {
        Self { hp: max, max }
    }
    #[inline]
    pub fn alive(&self) -> bool {
        self.hp > 0
    }
}

/// Ordnance profile selector; `key()` indexes the ordnance spec database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdnanceKind {
    Bolt,
    Lance,
    Torpedo,
}

impl OrdnanceKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Bolt => "bolt",
            Self::Lance => "lance",
            Self::Torpedo => "torpedo",
        }
    }
}

/// Archetype variant tag. Selects the behavior tree and visual/audio
/// routing; never used for gameplay math directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Player,
    Driller,
    Hunter,
    Lancer,
    Mite,
    Warden,
    Ordnance(OrdnanceKind),
}

impl Archetype {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Driller => "driller",
            Self::Hunter => "hunter",
            Self::Lancer => "lancer",
            Self::Mite => "mite",
            Self::Warden => "warden",
            Self::Ordnance(k) => k.key(),
        }
    }

    #[inline]
    pub fn is_enemy(&self) -> bool {
        matches!(
            self,
            Self::Driller | Self::Hunter | Self::Lancer | Self::Mite | Self::Warden
        )
    }
}

/// Identity component wrapping the archetype tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub archetype: Archetype,
}

impl Identity {
    pub fn of(archetype: Archetype) -> Self {
        Self { archetype }
    }
}

/// Coarse AI phase label. SPAWN entities are collision-exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiPhase {
    #[default]
    Spawn,
    Active,
    Charging,
    Orbit,
}

/// Small linear-scan map for per-entity behavior scratch values.
///
/// Keys are stable `&'static str` identifiers chosen by the leaf that owns
/// the slot; unrelated leaves must not share keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchMap<T> {
    entries: Vec<(&'static str, T)>,
}

impl<T> Default for ScratchMap<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Copy> ScratchMap<T> {
    pub fn get(&self, key: &'static str) -> Option<T> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn set(&mut self, key: &'static str, value: T) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn remove(&mut self, key: &'static str) -> Option<T> {
        let i = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.swap_remove(i).1)
    }

    pub fn get_or(&mut self, key: &'static str, default: T) -> T {
        if let Some(v) = self.get(key) {
            v
        } else {
            self.set(key, default);
            default
        }
    }
}

/// Per-entity AI state: phase label plus typed scratch storage for
/// behavior-tree leaves that persist values across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiState {
    pub phase: AiPhase,
    pub timers: ScratchMap<f32>,
    pub counters: ScratchMap<u32>,
    pub vectors: ScratchMap<Vec2>,
    pub refs: ScratchMap<Entity>,
}

impl AiState {
    /// Fresh state in the SPAWN grace phase with the given grace timer.
    pub fn spawning(grace_s: f32) -> Self {
        let mut s = Self::default();
        s.timers.set("spawn.grace", grace_s);
        s
    }

    pub fn active() -> Self {
        Self { phase: AiPhase::Active, ..Self::default() }
    }
}

/// What a `Target` component is seeking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Player,
    Enemy,
    Panel,
}

/// Resolved target reference. A cleared entity/panel means "no valid
/// target"; callers treat that as normal control flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub kind: TargetKind,
    pub entity: Option<Entity>,
    pub panel: Option<PanelId>,
    pub pos: Vec2,
    pub locked: bool,
}

impl Target {
    pub fn seeking(kind: TargetKind) -> Self {
        Self { kind, entity: None, panel: None, pos: Vec2::ZERO, locked: false }
    }

    /// Drop any resolved reference and the lock, keeping the seek kind.
    pub fn clear(&mut self) {
        self.entity = None;
        self.panel = None;
        self.locked = false;
    }
}

/// Ordnance lifecycle. CHARGING rides its owner until release; FLIGHT moves
/// freely under `Motion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdnancePhase {
    Charging,
    Flight,
}

/// Projectile bookkeeping. Charging ordnance whose owner disappears is
/// destroyed on the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ordnance {
    pub phase: OrdnancePhase,
    pub owner: Entity,
    pub kind: OrdnanceKind,
    pub age_s: f32,
    /// Local offset from the owner while charging.
    pub hold: Vec2,
}

/// Revolves an entity around a fixed center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbital {
    pub center: Vec2,
    pub radius: f32,
    pub angular_speed: f32,
    pub angle: f32,
}
