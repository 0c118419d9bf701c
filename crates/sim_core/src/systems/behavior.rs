//! Per-tick behavior driver: spawn-grace countdown, then one tree tick per
//! AI-bearing entity, with the tree resolved from the archetype registry.

use ecs_core::components::{AiPhase, AiState, Identity};
use ecs_core::Filter;

use crate::behavior::Bb;
use crate::context::EngineAiCtx;
use crate::schedule::Ctx;
use crate::SimState;

const GRACE_KEY: &str = "spawn.grace";

pub fn run(state: &mut SimState, ctx: &mut Ctx) {
    let dt = ctx.dt;
    let time = state.time.now;
    state
        .ecs
        .collect(Filter::new().with::<AiState>().with::<Identity>(), &mut ctx.ents);

    // Grace countdown: SPAWN entities do nothing else this tick.
    for i in 0..ctx.ents.len() {
        let e = ctx.ents[i];
        let Some(ai) = state.ecs.get_mut::<AiState>(e) else {
            continue;
        };
        if ai.phase != AiPhase::Spawn {
            continue;
        }
        let left = ai.timers.get_or(GRACE_KEY, 0.0) - dt;
        if left <= 0.0 {
            ai.timers.remove(GRACE_KEY);
            ai.phase = AiPhase::Active;
        } else {
            ai.timers.set(GRACE_KEY, left);
        }
    }

    let behaviors = state.behaviors.clone();
    let SimState {
        ecs,
        panels,
        fx,
        audio,
        upgrades,
        rng,
        ordnance_specs,
        ..
    } = state;
    let mut aictx = EngineAiCtx { fx, audio, panels, upgrades };
    for i in 0..ctx.ents.len() {
        let e = ctx.ents[i];
        if !ecs.is_alive(e) {
            continue;
        }
        let Some(identity) = ecs.get::<Identity>(e).copied() else {
            continue;
        };
        if !identity.archetype.is_enemy() {
            continue;
        }
        if ecs
            .get::<AiState>(e)
            .map(|a| a.phase == AiPhase::Spawn)
            .unwrap_or(true)
        {
            continue;
        }
        let Some(tree) = behaviors.tree(identity.archetype) else {
            log::debug!("behavior: no tree registered for {:?}", identity.archetype);
            continue;
        };
        let mut bb = Bb {
            ecs: &mut *ecs,
            entity: e,
            dt,
            time,
            ctx: &mut aictx,
            rng: &mut *rng,
            ordnance_specs: &*ordnance_specs,
        };
        let _ = tree.tick(&mut bb);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::spawn;
    use ecs_core::components::{Archetype, Motion, Target, Transform};
    use glam::Vec2;

    #[test]
    fn grace_expires_then_tree_drives_motion() {
        let mut state = SimState::with_seed(1).expect("state");
        let p = spawn::spawn_player(&mut state.ecs, Vec2::new(300.0, 0.0));
        state.player = Some(p);
        let specs = state.archetypes.clone();
        let m = spawn::spawn_enemy(&mut state.ecs, &specs, Archetype::Mite, Vec2::ZERO, 0.5)
            .expect("mite");
        let mut ctx = Ctx::default();
        ctx.dt = 0.3;
        // Point the mite's target at the player manually (targeting system
        // is exercised elsewhere).
        let mut t = state.ecs.get::<Target>(m).copied().unwrap();
        t.entity = Some(p);
        t.pos = Vec2::new(300.0, 0.0);
        state.ecs.insert(m, t);

        run(&mut state, &mut ctx);
        assert_eq!(state.ecs.get::<AiState>(m).unwrap().phase, AiPhase::Spawn);
        assert_eq!(state.ecs.get::<Motion>(m).unwrap().vel, Vec2::ZERO);

        run(&mut state, &mut ctx);
        assert_eq!(state.ecs.get::<AiState>(m).unwrap().phase, AiPhase::Active);
        // Next pass ticks the tree; the mite accelerates toward the player.
        run(&mut state, &mut ctx);
        let vel = state.ecs.get::<Motion>(m).unwrap().vel;
        assert!(vel.x > 0.0);
        // And spins.
        assert!(state.ecs.get::<Transform>(m).unwrap().rot != 0.0);
    }
}
