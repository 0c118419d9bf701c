//! Ordnance lifecycle: charging attachment, orphan cleanup, lifetime and
//! out-of-arena culling.

use ecs_core::components::{Ordnance, OrdnancePhase, Transform};
use ecs_core::Filter;

use crate::schedule::Ctx;
use crate::SimState;

/// Flight ordnance beyond this distance from the origin is culled.
pub const CULL_RADIUS: f32 = 900.0;
/// Lifetime used when an ordnance kind has no registered spec.
const FALLBACK_LIFE_S: f32 = 5.0;

pub fn update(state: &mut SimState, ctx: &mut Ctx) {
    let dt = ctx.dt;
    state
        .ecs
        .collect(Filter::new().with::<Ordnance>().with::<Transform>(), &mut ctx.ents);
    for &e in &ctx.ents {
        let Some(mut ord) = state.ecs.get::<Ordnance>(e).copied() else {
            continue;
        };
        ord.age_s += dt;
        match ord.phase {
            OrdnancePhase::Charging => {
                // A charging round whose owner disappeared is destroyed on
                // the next tick, never orphaned.
                let Some(owner_pos) =
                    state.ecs.get::<Transform>(ord.owner).map(|tr| tr.pos)
                else {
                    log::debug!("ordnance: owner of charging {e:?} gone, despawning");
                    state.ecs.despawn(e);
                    continue;
                };
                if let Some(tr) = state.ecs.get_mut::<Transform>(e) {
                    tr.pos = owner_pos + ord.hold;
                }
                if let Some(o) = state.ecs.get_mut::<Ordnance>(e) {
                    o.age_s = ord.age_s;
                }
            }
            OrdnancePhase::Flight => {
                let life = state
                    .ordnance_specs
                    .get(ord.kind.key())
                    .map(|s| s.life_s)
                    .unwrap_or(FALLBACK_LIFE_S);
                let pos = state.ecs.get::<Transform>(e).map(|tr| tr.pos);
                let out_of_bounds = pos
                    .map(|p| p.length_squared() > CULL_RADIUS * CULL_RADIUS)
                    .unwrap_or(true);
                if ord.age_s >= life || out_of_bounds {
                    state.ecs.despawn(e);
                    continue;
                }
                if let Some(o) = state.ecs.get_mut::<Ordnance>(e) {
                    o.age_s = ord.age_s;
                }
            }
        }
    }
}
