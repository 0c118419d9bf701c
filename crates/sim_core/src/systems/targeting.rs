//! Target maintenance: lock/unlock semantics and nearest-panel/enemy/player
//! resolution.

use ecs_core::components::{tag, AiPhase, AiState, Target, TargetKind, Transform};
use ecs_core::{Entity, Filter};
use glam::Vec2;

use crate::schedule::Ctx;
use crate::SimState;

/// Bounded radius for enemy-seeking spatial queries.
pub const ENEMY_SEEK_RADIUS: f32 = 600.0;

pub fn update(state: &mut SimState, ctx: &mut Ctx) {
    let player = state.player.filter(|p| state.ecs.is_alive(*p));
    let player_pos = player.and_then(|p| state.ecs.get::<Transform>(p).map(|t| t.pos));

    state
        .ecs
        .collect(Filter::new().with::<Target>().with::<Transform>(), &mut ctx.ents);
    for i in 0..ctx.ents.len() {
        let e = ctx.ents[i];
        let Some(pos) = state.ecs.get::<Transform>(e).map(|t| t.pos) else {
            continue;
        };
        let Some(mut t) = state.ecs.get::<Target>(e).copied() else {
            continue;
        };
        match t.kind {
            TargetKind::Player => {
                // Always track the single active player entity.
                t.panel = None;
                t.entity = player;
                if let Some(pp) = player_pos {
                    t.pos = pp;
                }
            }
            TargetKind::Panel => resolve_panel(state, e, pos, &mut t, player, player_pos),
            TargetKind::Enemy => resolve_enemy(state, ctx, e, pos, &mut t),
        }
        state.ecs.insert(e, t);
    }
}

/// Panel seekers lock the nearest live panel (clamped point-to-rect
/// distance) and hold the lock until that panel dies; the locked position
/// refreshes to the live panel center every tick. With no panel available
/// the target falls back to tracking the player.
fn resolve_panel(
    state: &SimState,
    _e: Entity,
    pos: Vec2,
    t: &mut Target,
    player: Option<Entity>,
    player_pos: Option<Vec2>,
) {
    if t.locked {
        if let Some(id) = t.panel {
            if !state.panels.is_destroyed(id) {
                if let Some(rect) = state.panels.rect(id) {
                    t.pos = rect.center();
                    return;
                }
            }
        }
        // Lock broken: panel destroyed or unregistered.
        t.clear();
    }
    let best = state
        .panels
        .iter()
        .filter(|p| !p.destroyed)
        .map(|p| (p.id, p.rect, p.rect.distance_sq(pos)))
        .min_by(|a, b| a.2.total_cmp(&b.2));
    if let Some((id, rect, _)) = best {
        t.panel = Some(id);
        t.locked = true;
        t.pos = rect.center();
    } else {
        t.entity = player;
        if let Some(pp) = player_pos {
            t.pos = pp;
        }
    }
}

/// Enemy seekers run a bounded-radius grid query for the nearest living,
/// non-projectile enemy; a cleared id means "no valid target".
fn resolve_enemy(state: &mut SimState, ctx: &mut Ctx, e: Entity, pos: Vec2, t: &mut Target) {
    if t.locked {
        if let Some(locked) = t.entity.filter(|le| state.ecs.is_alive(*le)) {
            if let Some(tr) = state.ecs.get::<Transform>(locked) {
                t.pos = tr.pos;
                return;
            }
        }
        t.clear();
    }
    ctx.spatial.query(pos, ENEMY_SEEK_RADIUS, &mut ctx.query_buf);
    let mut best: Option<(f32, Entity, Vec2)> = None;
    for k in 0..ctx.query_buf.as_slice().len() {
        let cand = ctx.query_buf.as_slice()[k];
        if cand == e || !state.ecs.is_alive(cand) {
            continue;
        }
        if state.ecs.tags(cand) & tag::ENEMY == 0 {
            continue;
        }
        // Spawn-phase enemies are not yet valid targets.
        if state
            .ecs
            .get::<AiState>(cand)
            .map(|a| a.phase == AiPhase::Spawn)
            .unwrap_or(false)
        {
            continue;
        }
        let Some(cp) = state.ecs.get::<Transform>(cand).map(|tr| tr.pos) else {
            continue;
        };
        let d2 = (cp - pos).length_squared();
        if d2 > ENEMY_SEEK_RADIUS * ENEMY_SEEK_RADIUS {
            continue;
        }
        if best.map(|(bd, _, _)| d2 < bd).unwrap_or(true) {
            best = Some((d2, cand, cp));
        }
    }
    match best {
        Some((_, cand, cp)) => {
            t.entity = Some(cand);
            t.pos = cp;
        }
        None => {
            t.entity = None;
        }
    }
}
