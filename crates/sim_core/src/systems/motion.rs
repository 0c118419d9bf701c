//! Motion integration: velocity + friction damping, and orbital anchoring.

use ecs_core::components::{Motion, Orbital, Transform};
use ecs_core::Filter;
use glam::Vec2;

use crate::schedule::Ctx;
use crate::SimState;

pub fn integrate(state: &mut SimState, ctx: &mut Ctx) {
    let dt = ctx.dt;

    state
        .ecs
        .collect(Filter::new().with::<Transform>().with::<Motion>(), &mut ctx.ents);
    for &e in &ctx.ents {
        let Some(m) = state.ecs.get::<Motion>(e).copied() else {
            continue;
        };
        if let Some(tr) = state.ecs.get_mut::<Transform>(e) {
            tr.pos += m.vel * dt;
        }
        if m.friction > 0.0 {
            let damp = (1.0 - m.friction * dt).max(0.0);
            if let Some(m) = state.ecs.get_mut::<Motion>(e) {
                m.vel *= damp;
            }
        }
    }

    // Orbitals override position: revolve around the fixed center.
    state
        .ecs
        .collect(Filter::new().with::<Transform>().with::<Orbital>(), &mut ctx.ents);
    for &e in &ctx.ents {
        let Some(orb) = state.ecs.get_mut::<Orbital>(e) else {
            continue;
        };
        orb.angle += orb.angular_speed * dt;
        let (center, radius, angle) = (orb.center, orb.radius, orb.angle);
        if let Some(tr) = state.ecs.get_mut::<Transform>(e) {
            tr.pos = center + Vec2::from_angle(angle) * radius;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ecs_core::components::tag;

    #[test]
    fn integrates_velocity_and_applies_friction() {
        let mut state = SimState::with_seed(1).expect("state");
        let e = state.ecs.spawn(tag::ENEMY);
        state.ecs.insert(e, Transform::at(Vec2::ZERO));
        state.ecs.insert(e, Motion { vel: Vec2::new(10.0, 0.0), friction: 1.0 });
        let mut ctx = Ctx::default();
        ctx.dt = 0.5;
        integrate(&mut state, &mut ctx);
        let tr = state.ecs.get::<Transform>(e).unwrap();
        assert!((tr.pos.x - 5.0).abs() < 1e-5);
        let m = state.ecs.get::<Motion>(e).unwrap();
        assert!((m.vel.x - 5.0).abs() < 1e-5, "friction halves velocity at dt=0.5");
    }

    #[test]
    fn orbital_revolves_around_center() {
        let mut state = SimState::with_seed(1).expect("state");
        let e = state.ecs.spawn(tag::ENEMY);
        state.ecs.insert(e, Transform::at(Vec2::ZERO));
        state.ecs.insert(
            e,
            Orbital {
                center: Vec2::new(100.0, 0.0),
                radius: 50.0,
                angular_speed: std::f32::consts::PI,
                angle: 0.0,
            },
        );
        let mut ctx = Ctx::default();
        ctx.dt = 1.0;
        integrate(&mut state, &mut ctx);
        let tr = state.ecs.get::<Transform>(e).unwrap();
        // Half a turn from angle 0: on the opposite side of the center.
        assert!((tr.pos.x - 50.0).abs() < 1e-3);
        assert!(tr.pos.y.abs() < 1e-3);
    }
}
