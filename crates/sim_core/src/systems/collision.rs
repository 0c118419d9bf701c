//! Pair discovery: broad-phase grid queries, canonical pair dedup, bitmask
//! pre-reject and squared-distance narrow phase.

use ecs_core::components::{AiPhase, AiState, Collider, Shape, Transform};
use ecs_core::{Entity, Filter, Registry};

use crate::geom::{circle_rect_overlap, circles_overlap, Rect};
use crate::schedule::Ctx;
use crate::SimState;

/// Broad-phase query pad on top of the collider's own bounding radius,
/// covering the largest collider a neighbor can bring to the pair.
pub const BROADPHASE_MARGIN: f32 = 24.0;

/// Confirmed overlapping pair, in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: Entity,
    pub b: Entity,
}

/// Canonical unordered pair key: smaller slot index first.
#[inline]
pub fn pair_key(a: Entity, b: Entity) -> (u32, u32) {
    if a.idx() <= b.idx() { (a.idx(), b.idx()) } else { (b.idx(), a.idx()) }
}

/// SPAWN-phase entities get a collision grace period.
#[inline]
fn in_spawn_grace(ecs: &Registry, e: Entity) -> bool {
    ecs.get::<AiState>(e)
        .map(|a| a.phase == AiPhase::Spawn)
        .unwrap_or(false)
}

fn shapes_overlap(a_tr: &Transform, a_col: &Collider, b_tr: &Transform, b_col: &Collider) -> bool {
    match (a_col.shape, b_col.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circles_overlap(a_tr.pos, ra, b_tr.pos, rb)
        }
        (Shape::Circle { radius }, Shape::Rect { w, h }) => {
            circle_rect_overlap(a_tr.pos, radius, &Rect::from_center(b_tr.pos, w, h))
        }
        (Shape::Rect { w, h }, Shape::Circle { radius }) => {
            circle_rect_overlap(b_tr.pos, radius, &Rect::from_center(a_tr.pos, w, h))
        }
        (Shape::Rect { w: aw, h: ah }, Shape::Rect { w: bw, h: bh }) => {
            Rect::from_center(a_tr.pos, aw, ah).overlaps(&Rect::from_center(b_tr.pos, bw, bh))
        }
    }
}

/// Discover every eligible overlapping pair exactly once this tick and
/// append it to `ctx.contacts`. The handled-pair set has no cross-tick
/// memory.
pub fn detect(state: &mut SimState, ctx: &mut Ctx) {
    ctx.contacts.clear();
    ctx.handled.clear();
    state
        .ecs
        .collect(Filter::new().with::<Transform>().with::<Collider>(), &mut ctx.ents);
    for i in 0..ctx.ents.len() {
        let e = ctx.ents[i];
        let Some(col) = state.ecs.get::<Collider>(e).copied() else {
            continue;
        };
        // Passive colliders never seed pairs.
        if col.mask == 0 {
            continue;
        }
        if in_spawn_grace(&state.ecs, e) {
            continue;
        }
        let Some(tr) = state.ecs.get::<Transform>(e).copied() else {
            continue;
        };
        ctx.spatial
            .query(tr.pos, col.bounding_radius() + BROADPHASE_MARGIN, &mut ctx.query_buf);
        for k in 0..ctx.query_buf.as_slice().len() {
            let cand = ctx.query_buf.as_slice()[k];
            if cand == e {
                continue;
            }
            // Dedup A-B vs B-A before any narrow-phase work.
            if !ctx.handled.insert(pair_key(e, cand)) {
                continue;
            }
            let Some(ocol) = state.ecs.get::<Collider>(cand).copied() else {
                continue;
            };
            // Cheap bitmask reject: at least one side must be able to hit
            // the other.
            if col.mask & ocol.layer == 0 && ocol.mask & col.layer == 0 {
                continue;
            }
            if in_spawn_grace(&state.ecs, cand) {
                continue;
            }
            let Some(otr) = state.ecs.get::<Transform>(cand).copied() else {
                continue;
            };
            if shapes_overlap(&tr, &col, &otr, &ocol) {
                ctx.contacts.push(Contact { a: e, b: cand });
            }
        }
    }
}
