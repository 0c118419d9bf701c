//! Hullbreach simulation core.
//!
//! Single-threaded, fixed-order cooperative tick over a hand-rolled entity
//! registry: spatial broad-phase, layer-keyed combat resolution, behavior
//! trees with per-entity persistent state, wave/breach spawning and hull
//! panel integrity. Rendering, audio and UI live outside and consume the
//! bounded request queues.

pub mod behavior;
pub mod context;
pub mod events;
pub mod geom;
pub mod schedule;
pub mod spatial;
pub mod spawn;
pub mod structure;
pub mod systems;
pub mod telemetry;

use anyhow::Result;
use data_runtime::configs::waves::WaveConfig;
use data_runtime::specs::archetypes::ArchetypeSpecDb;
use data_runtime::specs::ordnance::OrdnanceSpecDb;
use ecs_core::components::{Archetype, Health, OrdnanceKind, Transform};
use ecs_core::{Entity, Registry};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::behavior::trees::BehaviorRegistry;
use crate::context::Upgrades;
use crate::events::{AudioRequest, EventQueue, FxRequest, SimEvent};
use crate::schedule::{Ctx, Schedule};
use crate::structure::StructureHealth;
use crate::systems::combat::CombatTable;
use crate::systems::wave::WaveDirector;

/// Simulation clock with the global time-scale and freeze knobs.
#[derive(Debug, Clone, Copy)]
pub struct SimTime {
    pub now: f64,
    pub scale: f32,
    pub freeze_s: f32,
}

impl Default for SimTime {
    fn default() -> Self {
        Self { now: 0.0, scale: 1.0, freeze_s: 0.0 }
    }
}

const TRAUMA_DECAY_PER_S: f32 = 1.4;
const QUEUE_CAP: usize = 256;

/// The authoritative simulation state. Exactly one writer at a time; all
/// mutation happens through the strict tick order in `schedule`.
pub struct SimState {
    pub ecs: Registry,
    pub panels: StructureHealth,
    pub waves: WaveDirector,
    pub behaviors: BehaviorRegistry,
    pub combat: CombatTable,
    pub archetypes: ArchetypeSpecDb,
    pub ordnance_specs: OrdnanceSpecDb,
    pub upgrades: Upgrades,
    pub rng: ChaCha8Rng,
    pub player: Option<Entity>,
    /// Debug flag: suppress all spawning.
    pub peace: bool,
    pub time: SimTime,
    /// Camera-shake accumulator in [0, 1]; decays every tick.
    pub trauma: f32,
    pub fx: EventQueue<FxRequest>,
    pub audio: EventQueue<AudioRequest>,
    pub events: EventQueue<SimEvent>,
    ctx: Option<Ctx>,
}

impl SimState {
    /// Build a simulation with spec databases loaded from `data/config`
    /// (falling back to built-in defaults) and a fixed RNG seed.
    pub fn new() -> Result<Self> {
        Self::with_seed(0x5EED)
    }

    pub fn with_seed(seed: u64) -> Result<Self> {
        let archetypes = ArchetypeSpecDb::load_default()?;
        let ordnance_specs = OrdnanceSpecDb::load_default()?;
        let waves = WaveDirector::new(WaveConfig::load_default()?);
        let behaviors = BehaviorRegistry::build(&archetypes, &ordnance_specs);
        Ok(Self {
            ecs: Registry::new(),
            panels: StructureHealth::new(),
            waves,
            behaviors,
            combat: CombatTable::standard(),
            archetypes,
            ordnance_specs,
            upgrades: Upgrades::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            player: None,
            peace: false,
            time: SimTime::default(),
            trauma: 0.0,
            fx: EventQueue::new(QUEUE_CAP),
            audio: EventQueue::new(QUEUE_CAP),
            events: EventQueue::new(QUEUE_CAP),
            ctx: None,
        })
    }

    /// Advance the simulation by `raw_dt` seconds of wall time, honoring
    /// the freeze and time-scale knobs.
    pub fn step(&mut self, raw_dt: f32) {
        let t0 = std::time::Instant::now();
        if self.time.freeze_s > 0.0 {
            self.time.freeze_s = (self.time.freeze_s - raw_dt).max(0.0);
            return;
        }
        let dt = raw_dt * self.time.scale;
        if dt <= 0.0 {
            return;
        }
        self.time.now += f64::from(dt);
        self.trauma = (self.trauma - TRAUMA_DECAY_PER_S * dt).max(0.0);
        let mut ctx = self.ctx.take().unwrap_or_default();
        ctx.dt = dt;
        Schedule::run(self, &mut ctx);
        self.ctx = Some(ctx);
        metrics::histogram!("tick.ms").record(t0.elapsed().as_secs_f64() * 1000.0);
    }

    pub fn spawn_player_at(&mut self, pos: Vec2) -> Entity {
        let p = spawn::spawn_player(&mut self.ecs, pos);
        self.player = Some(p);
        p
    }

    pub fn spawn_enemy_at(&mut self, archetype: Archetype, pos: Vec2, grace_s: f32) -> Option<Entity> {
        spawn::spawn_enemy(&mut self.ecs, &self.archetypes, archetype, pos, grace_s)
    }

    /// Fire a player bolt in `dir`. The "bolt.damage" upgrade level adds to
    /// the round's exchange pool.
    pub fn player_fire(&mut self, dir: Vec2) -> Option<Entity> {
        let p = self.player.filter(|p| self.ecs.is_alive(*p))?;
        let pos = self.ecs.get::<Transform>(p).map(|t| t.pos)?;
        let d = dir.normalize_or_zero();
        if d == Vec2::ZERO {
            return None;
        }
        let speed = self.ordnance_specs.get(OrdnanceKind::Bolt.key()).map(|s| s.speed)?;
        let bolt = spawn::spawn_ordnance(
            &mut self.ecs,
            &self.ordnance_specs,
            p,
            true,
            OrdnanceKind::Bolt,
            pos + d * (spawn::PLAYER_RADIUS + 4.0),
            d * speed,
            false,
            Vec2::ZERO,
        )?;
        let bonus = self.upgrades.level("bolt.damage") as i32;
        if bonus > 0 {
            if let Some(h) = self.ecs.get_mut::<Health>(bolt) {
                h.hp += bonus;
                h.max += bonus;
            }
        }
        self.audio.push(AudioRequest { key: "player_fire", pan_x: Some(pos.x) });
        Some(bolt)
    }

    /// Add camera-shake trauma, clamped to [0, 1].
    pub fn add_trauma(&mut self, amount: f32) {
        self.trauma = (self.trauma + amount).clamp(0.0, 1.0);
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time.scale = scale.max(0.0);
    }

    /// Pause ticking entirely for `secs` of wall time.
    pub fn freeze(&mut self, secs: f32) {
        self.time.freeze_s = self.time.freeze_s.max(secs);
    }

    /// Drain hooks for the external render/audio/UI consumers, called once
    /// per tick on their side.
    pub fn drain_fx(&mut self) -> Vec<FxRequest> {
        self.fx.drain().collect()
    }

    pub fn drain_audio(&mut self) -> Vec<AudioRequest> {
        self.audio.drain().collect()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn freeze_pauses_and_then_resumes() {
        let mut state = SimState::with_seed(1).expect("state");
        state.peace = true;
        state.freeze(0.1);
        state.step(0.05);
        assert_eq!(state.time.now, 0.0);
        state.step(0.05);
        assert_eq!(state.time.now, 0.0);
        state.step(0.05);
        assert!(state.time.now > 0.0);
    }

    #[test]
    fn time_scale_slows_the_clock() {
        let mut state = SimState::with_seed(1).expect("state");
        state.peace = true;
        state.set_time_scale(0.5);
        state.step(1.0);
        assert!((state.time.now - 0.5).abs() < 1e-6);
    }

    #[test]
    fn trauma_decays_over_time() {
        let mut state = SimState::with_seed(1).expect("state");
        state.peace = true;
        state.add_trauma(0.8);
        state.step(0.25);
        assert!(state.trauma < 0.8);
        for _ in 0..10 {
            state.step(0.25);
        }
        assert_eq!(state.trauma, 0.0);
    }

    #[test]
    fn player_fire_spawns_bolt_with_upgrade_bonus() {
        let mut state = SimState::with_seed(1).expect("state");
        state.spawn_player_at(Vec2::ZERO);
        state.upgrades.set_level("bolt.damage", 2);
        let bolt = state.player_fire(Vec2::new(1.0, 0.0)).expect("bolt");
        let base = state.ordnance_specs.get("bolt").unwrap().damage;
        assert_eq!(state.ecs.get::<Health>(bolt).unwrap().hp, base + 2);
    }
}
