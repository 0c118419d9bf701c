//! Wave/spawn director: scheduled timeline spawning with loop scaling,
//! plus probabilistic breach spawns at destroyed panels.

use data_runtime::configs::waves::WaveConfig;
use data_runtime::specs::archetypes::ArchetypeSpecDb;
use ecs_core::components::Archetype;
use ecs_core::parse::parse_archetype;
use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::events::{EventQueue, SimEvent};
use crate::schedule::Ctx;
use crate::spawn;
use crate::structure::StructureHealth;
use crate::SimState;

/// Radius of the ring scheduled spawns appear on.
pub const SPAWN_RING_RADIUS: f32 = 520.0;
/// Positional jitter applied around a breached panel's center.
const BREACH_JITTER: f32 = 40.0;

const ENEMY_KEYS: [&str; 5] = ["driller", "hunter", "lancer", "mite", "warden"];

/// One spawn to perform this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCmd {
    pub archetype: Archetype,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    at: f64,
    archetype: Archetype,
}

/// Declarative timeline driver. Owns the wave clock; the schedule pauses it
/// entirely while spawning is suppressed.
#[derive(Debug)]
pub struct WaveDirector {
    cfg: WaveConfig,
    next_entry: usize,
    loops: u32,
    wave_t: f64,
    total_t: f64,
    pending: Vec<Pending>,
}

impl WaveDirector {
    pub fn new(cfg: WaveConfig) -> Self {
        Self { cfg, next_entry: 0, loops: 0, wave_t: 0.0, total_t: 0.0, pending: Vec::new() }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.cfg
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Per-second breach spawn chance for one destroyed panel at the
    /// current wave time. Strictly increasing with elapsed time.
    pub fn breach_chance_per_s(&self) -> f32 {
        self.cfg.breach_base_chance + self.cfg.breach_ramp * self.total_t as f32
    }

    /// Advance the wave clock and emit spawn commands. Scheduled entries
    /// expand into a staggered pending queue; the timeline loops on
    /// exhaustion with counts scaled up per loop.
    pub fn update(
        &mut self,
        dt: f64,
        panels: &StructureHealth,
        specs: &ArchetypeSpecDb,
        rng: &mut ChaCha8Rng,
        out: &mut Vec<SpawnCmd>,
        events: &mut EventQueue<SimEvent>,
    ) {
        self.wave_t += dt;
        self.total_t += dt;

        // Expand due timeline entries into staggered pending units.
        while let Some(entry) = self.cfg.entries.get(self.next_entry) {
            if f64::from(entry.at) > self.wave_t {
                break;
            }
            match parse_archetype(&entry.archetype) {
                Some(archetype) if archetype.is_enemy() => {
                    let scale = self.cfg.loop_scale.powi(self.loops as i32);
                    // Cap per-entry counts so late loops stay playable.
                    let count = ((entry.count as f32) * scale).round().clamp(1.0, 64.0) as u32;
                    for i in 0..count {
                        self.pending.push(Pending {
                            at: f64::from(entry.at) + f64::from(entry.interval) * f64::from(i),
                            archetype,
                        });
                    }
                }
                _ => {
                    log::warn!("wave: unknown archetype '{}' in timeline, skipping", entry.archetype);
                }
            }
            self.next_entry += 1;
        }

        // Drain pending units that have come due.
        let now = self.wave_t;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at <= now {
                let p = self.pending.swap_remove(i);
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                out.push(SpawnCmd {
                    archetype: p.archetype,
                    pos: Vec2::from_angle(angle) * SPAWN_RING_RADIUS,
                });
            } else {
                i += 1;
            }
        }

        // Loop the timeline once exhausted, scaling difficulty upward.
        if self.next_entry >= self.cfg.entries.len() && self.pending.is_empty() {
            self.loops += 1;
            self.next_entry = 0;
            self.wave_t = 0.0;
            log::info!("wave: timeline looped (loop {})", self.loops);
            events.push(SimEvent::WaveLooped { loop_count: self.loops });
        }

        // Breach spawns: each destroyed panel rolls an independent,
        // time-ramped chance, weighted toward weaker archetypes.
        let chance = self.breach_chance_per_s() * dt as f32;
        for p in panels.destroyed_panels() {
            if rng.gen::<f32>() >= chance {
                continue;
            }
            let Some(archetype) = pick_breach_archetype(specs, rng) else {
                continue;
            };
            let jitter =
                Vec2::new(rng.gen_range(-BREACH_JITTER..BREACH_JITTER), rng.gen_range(-BREACH_JITTER..BREACH_JITTER));
            log::debug!("wave: breach spawn {:?} at panel {:?}", archetype, p.id);
            metrics::counter!("sim.breach_spawns_total").increment(1);
            out.push(SpawnCmd { archetype, pos: p.rect.center() + jitter });
        }
    }
}

/// Weighted pick over `spawn_weight`; the stock data weights weaker
/// archetypes higher.
fn pick_breach_archetype(specs: &ArchetypeSpecDb, rng: &mut ChaCha8Rng) -> Option<Archetype> {
    let total: f32 = ENEMY_KEYS
        .iter()
        .filter_map(|k| specs.get(k))
        .map(|s| s.spawn_weight)
        .sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.gen_range(0.0..total);
    for key in ENEMY_KEYS {
        let Some(s) = specs.get(key) else {
            continue;
        };
        if roll < s.spawn_weight {
            return parse_archetype(key);
        }
        roll -= s.spawn_weight;
    }
    parse_archetype(ENEMY_KEYS[0])
}

/// Schedule hook: run the director unless spawning is suppressed, then
/// spawn the commanded enemies with randomized grace timers.
pub fn run(state: &mut SimState, ctx: &mut Ctx) {
    if state.peace || state.panels.integrity() <= 0.0 {
        return;
    }
    ctx.spawns.clear();
    state.waves.update(
        f64::from(ctx.dt),
        &state.panels,
        &state.archetypes,
        &mut state.rng,
        &mut ctx.spawns,
        &mut state.events,
    );
    let (gmin, gmax) = {
        let cfg = state.waves.config();
        (cfg.grace_min_s, cfg.grace_max_s)
    };
    for i in 0..ctx.spawns.len() {
        let cmd = ctx.spawns[i];
        let grace = state.rng.gen_range(gmin..=gmax);
        spawn::spawn_enemy(&mut state.ecs, &state.archetypes, cmd.archetype, cmd.pos, grace);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geom::Rect;
    use data_runtime::configs::waves::WaveEntry;
    use rand::SeedableRng;

    fn tiny_cfg() -> WaveConfig {
        let mut cfg = WaveConfig::builtin();
        cfg.entries = vec![WaveEntry { at: 1.0, archetype: "mite".into(), count: 3, interval: 0.5 }];
        cfg
    }

    fn step_director(
        d: &mut WaveDirector,
        panels: &StructureHealth,
        dt: f64,
        rng: &mut ChaCha8Rng,
    ) -> Vec<SpawnCmd> {
        let specs = ArchetypeSpecDb::builtin();
        let mut out = Vec::new();
        let mut events = EventQueue::new(64);
        d.update(dt, panels, &specs, rng, &mut out, &mut events);
        out
    }

    #[test]
    fn timeline_expands_with_stagger() {
        let mut d = WaveDirector::new(tiny_cfg());
        let panels = StructureHealth::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // t=1.0: entry due, first unit spawns immediately.
        let got = step_director(&mut d, &panels, 1.0, &mut rng);
        assert_eq!(got.len(), 1);
        // t=1.6: second unit (at 1.5) due.
        let got = step_director(&mut d, &panels, 0.6, &mut rng);
        assert_eq!(got.len(), 1);
        // t=2.2: third and last unit (at 2.0).
        let got = step_director(&mut d, &panels, 0.6, &mut rng);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].archetype, Archetype::Mite);
        assert!(got[0].pos.length() > SPAWN_RING_RADIUS - 1.0);
    }

    #[test]
    fn timeline_loops_and_scales_counts() {
        let mut d = WaveDirector::new(tiny_cfg());
        let panels = StructureHealth::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut total_first_loop = 0;
        for _ in 0..40 {
            total_first_loop += step_director(&mut d, &panels, 0.1, &mut rng).len();
            if d.loops() > 0 {
                break;
            }
        }
        assert_eq!(total_first_loop, 3);
        assert!(d.loops() >= 1, "timeline should loop after exhaustion");
        // Second loop: counts scaled by loop_scale (3 * 1.35 rounds to 4).
        let mut total_second_loop = 0;
        for _ in 0..60 {
            total_second_loop += step_director(&mut d, &panels, 0.1, &mut rng).len();
            if d.loops() > 1 {
                break;
            }
        }
        assert_eq!(total_second_loop, 4);
    }

    #[test]
    fn breach_chance_ramps_with_time_and_needs_destroyed_panel() {
        let mut d = WaveDirector::new(tiny_cfg());
        let c0 = d.breach_chance_per_s();
        let mut panels = StructureHealth::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // No destroyed panels: never a breach spawn regardless of rolls.
        let id = panels.register("p", Rect::from_center(Vec2::ZERO, 60.0, 30.0));
        for _ in 0..200 {
            let got = step_director(&mut d, &panels, 0.1, &mut rng);
            assert!(got.iter().all(|c| c.pos.length() > 400.0), "breach spawn without breach");
        }
        let c1 = d.breach_chance_per_s();
        assert!(c1 > c0, "chance must ramp with elapsed wave time");
        // With a destroyed panel and enough time, breaches happen near it.
        panels.damage(id, 1000.0);
        let mut breached = false;
        for _ in 0..4000 {
            let got = step_director(&mut d, &panels, 0.1, &mut rng);
            if got.iter().any(|c| c.pos.length() < 200.0) {
                breached = true;
                break;
            }
        }
        assert!(breached, "no breach spawn after prolonged breach");
    }
}
