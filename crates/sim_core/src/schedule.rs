//! Fixed-order tick orchestration.
//!
//! Within one tick: motion/orbital integration, ordnance lifecycle, spatial
//! rebuild, collision, combat resolution, behavior ticks, targeting, wave
//! evaluation, then structure events forwarded to the domain queue. Later
//! stages observe entities destroyed by earlier stages in the same tick.

use std::collections::HashSet;

use ecs_core::Entity;

use crate::events::SimEvent;
use crate::spatial::{QueryBuffer, SpatialGrid};
use crate::structure::StructureEvent;
use crate::systems;
use crate::systems::collision::Contact;
use crate::systems::wave::SpawnCmd;
use crate::SimState;

/// Per-tick scratch state: the spatial index, reusable buffers and the
/// handled-pair set (cleared every tick, no cross-tick memory).
pub struct Ctx {
    pub dt: f32,
    pub spatial: SpatialGrid,
    pub query_buf: QueryBuffer,
    pub ents: Vec<Entity>,
    pub handled: HashSet<(u32, u32)>,
    pub contacts: Vec<Contact>,
    pub spawns: Vec<SpawnCmd>,
}

impl Default for Ctx {
    fn default() -> Self {
        Self {
            dt: 0.0,
            spatial: SpatialGrid::default(),
            query_buf: QueryBuffer::new(256),
            ents: Vec::new(),
            handled: HashSet::new(),
            contacts: Vec::new(),
            spawns: Vec::new(),
        }
    }
}

pub struct Schedule;

impl Schedule {
    pub fn run(state: &mut SimState, ctx: &mut Ctx) {
        systems::motion::integrate(state, ctx);
        systems::ordnance::update(state, ctx);
        ctx.spatial.rebuild(&mut state.ecs);
        systems::collision::detect(state, ctx);
        systems::combat::resolve(state, ctx);
        systems::behavior::run(state, ctx);
        systems::targeting::update(state, ctx);
        systems::wave::run(state, ctx);
        // Forward structure events to the single domain queue, drained by
        // the external consumer at its own fixed point.
        for ev in state.panels.drain_events() {
            let mapped = match ev {
                StructureEvent::PanelDestroyed(id) => SimEvent::PanelDestroyed(id),
                StructureEvent::PanelRestored(id) => SimEvent::PanelRestored(id),
                StructureEvent::IntegrityChanged { percent } => {
                    SimEvent::IntegrityChanged { percent }
                }
            };
            state.events.push(mapped);
        }
    }
}
