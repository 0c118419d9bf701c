//! Leaf nodes: the actual gameplay behaviors.
//!
//! Leaves that persist values across ticks (timers, spawned-ordnance
//! handles, drift vectors) store them in the entity's `AiState` under a
//! key unique to that leaf's role in its tree.

use ecs_core::components::{AiPhase, Motion, OrdnanceKind, Target};
use ecs_core::Entity;
use glam::Vec2;
use rand::Rng;

use super::{Bb, Behavior, Status};

#[inline]
fn target_valid(t: &Target) -> bool {
    t.entity.is_some() || t.panel.is_some()
}

/// RUNNING until `secs` have elapsed, then SUCCESS. The countdown restarts
/// on the next entry after completion.
pub struct Wait {
    pub key: &'static str,
    pub secs: f32,
}

impl Behavior for Wait {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let dt = bb.dt;
        let (key, secs) = (self.key, self.secs);
        let Some(ai) = bb.ai_mut() else {
            return Status::Failure;
        };
        let left = ai.timers.get_or(key, secs) - dt;
        if left > 0.0 {
            ai.timers.set(key, left);
            Status::Running
        } else {
            ai.timers.remove(key);
            Status::Success
        }
    }
}

/// Rotate to face the current target position.
pub struct FaceTarget;

impl Behavior for FaceTarget {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target().filter(target_valid) else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        let to = t.pos - tr.pos;
        if to.length_squared() > 1e-6 {
            if let Some(tr) = bb.ecs.get_mut::<ecs_core::components::Transform>(bb.entity) {
                tr.rot = to.y.atan2(to.x);
            }
        }
        Status::Success
    }
}

/// Steer toward the target position; SUCCESS within `arrive` distance.
pub struct MoveToTarget {
    pub speed: f32,
    pub arrive: f32,
}

impl Behavior for MoveToTarget {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target().filter(target_valid) else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        let to = t.pos - tr.pos;
        let dist = to.length();
        if dist <= self.arrive {
            if let Some(m) = bb.ecs.get_mut::<Motion>(bb.entity) {
                m.vel = Vec2::ZERO;
            }
            return Status::Success;
        }
        if let Some(m) = bb.ecs.get_mut::<Motion>(bb.entity) {
            m.vel = to.normalize_or_zero() * self.speed;
        }
        Status::Running
    }
}

/// Hold a distance band around the target: close in when too far, back off
/// when too close, otherwise drift on a slowly re-randomized heading.
/// Always RUNNING.
pub struct HoverBand {
    pub min_r: f32,
    pub max_r: f32,
    pub speed: f32,
    /// Namespace for the drift vector and its refresh timer.
    pub key: &'static str,
}

impl Behavior for HoverBand {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target().filter(target_valid) else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        let to = t.pos - tr.pos;
        let dist = to.length();
        let dir = if dist > self.max_r {
            to.normalize_or_zero()
        } else if dist < self.min_r {
            -to.normalize_or_zero()
        } else {
            let dt = bb.dt;
            let angle: f32 = bb.rng.gen_range(0.0..std::f32::consts::TAU);
            let key = self.key;
            let Some(ai) = bb.ai_mut() else {
                return Status::Failure;
            };
            let left = ai.timers.get_or(key, 0.0) - dt;
            if left <= 0.0 {
                ai.timers.set(key, 1.2);
                ai.vectors.set(key, Vec2::from_angle(angle));
            } else {
                ai.timers.set(key, left);
            }
            ai.vectors.get(key).unwrap_or(Vec2::ZERO)
        };
        if let Some(m) = bb.ecs.get_mut::<Motion>(bb.entity) {
            m.vel = dir * self.speed * if dist < self.min_r || dist > self.max_r { 1.0 } else { 0.45 };
        }
        Status::Running
    }
}

/// Spin the visual at a constant rate.
pub struct Spin {
    pub rate: f32,
}

impl Behavior for Spin {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let dt = bb.dt;
        if let Some(tr) = bb.ecs.get_mut::<ecs_core::components::Transform>(bb.entity) {
            tr.rot += self.rate * dt;
        }
        Status::Success
    }
}

/// SUCCESS when the target position is within `dist`.
pub struct WithinRange {
    pub dist: f32,
}

impl Behavior for WithinRange {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target().filter(target_valid) else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        if (t.pos - tr.pos).length_squared() <= self.dist * self.dist {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

/// Fire a flight-phase ordnance straight at the target.
pub struct FireOrdnance {
    pub kind: OrdnanceKind,
    pub sound: &'static str,
}

impl Behavior for FireOrdnance {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target().filter(target_valid) else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        let Some(speed) = bb.ordnance_specs.get(self.kind.key()).map(|s| s.speed) else {
            log::debug!("behavior: no ordnance spec for '{}'", self.kind.key());
            return Status::Failure;
        };
        let dir = (t.pos - tr.pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            return Status::Failure;
        }
        let muzzle = tr.pos + dir * 10.0;
        if bb.spawn_ordnance(self.kind, muzzle, dir * speed, false, Vec2::ZERO).is_none() {
            return Status::Failure;
        }
        bb.ctx.play_sound(self.sound, Some(tr.pos.x));
        Status::Success
    }
}

/// Charge-and-release attack: spawn ordnance rigidly attached ahead of the
/// owner, hold it for the spec's charge time, then release it at the
/// target. RUNNING while charging.
pub struct ChargeRelease {
    pub kind: OrdnanceKind,
    /// Namespace for the ordnance handle and charge timer.
    pub key: &'static str,
}

impl ChargeRelease {
    fn abort(&self, bb: &mut Bb<'_>) {
        if let Some(ai) = bb.ai_mut() {
            ai.refs.remove(self.key);
            ai.timers.remove(self.key);
            ai.phase = AiPhase::Active;
        }
    }
}

impl Behavior for ChargeRelease {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(spec) = bb.ordnance_specs.get(self.kind.key()).cloned() else {
            log::debug!("behavior: no ordnance spec for '{}'", self.kind.key());
            return Status::Failure;
        };
        let key = self.key;
        let held: Option<Entity> = bb.ai_mut().and_then(|ai| ai.refs.get(key));
        let Some(ord) = held else {
            // Begin charging: spawn attached ordnance ahead of us.
            let Some(tr) = bb.transform() else {
                return Status::Failure;
            };
            let hold = Vec2::from_angle(tr.rot) * 14.0;
            let Some(ord) = bb.spawn_ordnance(self.kind, tr.pos + hold, Vec2::ZERO, true, hold)
            else {
                return Status::Failure;
            };
            if let Some(ai) = bb.ai_mut() {
                ai.refs.set(key, ord);
                ai.timers.set(key, spec.charge_s);
                ai.phase = AiPhase::Charging;
            }
            return Status::Running;
        };
        // The ordnance system destroys orphans; self-heal if ours vanished.
        if !bb.ecs.is_alive(ord) {
            self.abort(bb);
            return Status::Failure;
        }
        let dt = bb.dt;
        let left = bb.ai_mut().map(|ai| {
            let left = ai.timers.get_or(key, spec.charge_s) - dt;
            ai.timers.set(key, left);
            left
        });
        if left.unwrap_or(0.0) > 0.0 {
            return Status::Running;
        }
        let Some(t) = bb.target().filter(target_valid) else {
            self.abort(bb);
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            self.abort(bb);
            return Status::Failure;
        };
        let dir = (t.pos - tr.pos).normalize_or_zero();
        bb.release_ordnance(ord, dir * spec.speed);
        bb.ctx.play_sound("ordnance_release", Some(tr.pos.x));
        self.abort(bb);
        Status::Success
    }
}

/// Gnaw on the locked panel: deal damage-per-second through the context
/// while in range. RUNNING while drilling; FAILURE when no panel target.
pub struct DrillPanel {
    pub dps: f32,
    pub range: f32,
}

impl Behavior for DrillPanel {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let Some(t) = bb.target() else {
            return Status::Failure;
        };
        let Some(panel) = t.panel else {
            return Status::Failure;
        };
        let Some(tr) = bb.transform() else {
            return Status::Failure;
        };
        let Some(rect) = bb.ctx.panel_rect(panel) else {
            // Panel vanished; targeting will reseek next tick.
            return Status::Failure;
        };
        if rect.distance_sq(tr.pos) > self.range * self.range {
            return Status::Failure;
        }
        bb.ctx.damage_panel(panel, self.dps * bb.dt);
        let spark_vel = Vec2::new(bb.rng.gen_range(-30.0..30.0), bb.rng.gen_range(-30.0..30.0));
        bb.ctx.spawn_particle(tr.pos, spark_vel, [1.0, 0.7, 0.2], 0.4, 2.0);
        Status::Running
    }
}

/// Emit an exhaust particle every `every_s` seconds. Always SUCCESS.
pub struct TrailParticles {
    pub key: &'static str,
    pub every_s: f32,
    pub color: [f32; 3],
}

impl Behavior for TrailParticles {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let dt = bb.dt;
        let (key, every) = (self.key, self.every_s);
        let due = {
            let Some(ai) = bb.ai_mut() else {
                return Status::Failure;
            };
            let left = ai.timers.get_or(key, every) - dt;
            if left <= 0.0 {
                ai.timers.set(key, every);
                true
            } else {
                ai.timers.set(key, left);
                false
            }
        };
        if due {
            if let Some(tr) = bb.transform() {
                let back = -Vec2::from_angle(tr.rot) * 20.0;
                bb.ctx.spawn_particle(tr.pos, back, self.color, 0.5, 1.5);
            }
        }
        Status::Success
    }
}

/// Set the coarse AI phase label. Always SUCCESS.
pub struct SetPhase {
    pub phase: AiPhase,
}

impl Behavior for SetPhase {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        if let Some(ai) = bb.ai_mut() {
            ai.phase = self.phase;
        }
        Status::Success
    }
}
