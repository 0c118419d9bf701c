//! Behavior-tree runtime: three-valued node status, composite and
//! decorator nodes, and the per-tick blackboard handed to leaves.
//!
//! Trees are stateless structure shared by every entity of an archetype.
//! All per-entity state (timers, resume indices, scratch vectors) lives in
//! the entity's `AiState` component, namespaced by stable `&'static str`
//! keys so unrelated nodes never collide.

pub mod leaves;
pub mod trees;

use data_runtime::specs::ordnance::OrdnanceSpecDb;
use ecs_core::components::{AiState, Ordnance, OrdnanceKind, Target, Transform};
use ecs_core::{Entity, Registry};
use glam::Vec2;
use rand_chacha::ChaCha8Rng;

use crate::context::AiCtx;
use crate::spawn;

/// Result of ticking a node. RUNNING nodes are re-ticked next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Running,
}

/// Blackboard for one entity's tick: registry access, timing, RNG and the
/// external capability surface.
pub struct Bb<'a> {
    pub ecs: &'a mut Registry,
    pub entity: Entity,
    pub dt: f32,
    pub time: f64,
    pub ctx: &'a mut dyn AiCtx,
    pub rng: &'a mut ChaCha8Rng,
    pub ordnance_specs: &'a OrdnanceSpecDb,
}

impl Bb<'_> {
    pub fn transform(&self) -> Option<Transform> {
        self.ecs.get::<Transform>(self.entity).copied()
    }

    pub fn target(&self) -> Option<Target> {
        self.ecs.get::<Target>(self.entity).copied()
    }

    pub fn ai_mut(&mut self) -> Option<&mut AiState> {
        self.ecs.get_mut::<AiState>(self.entity)
    }

    /// Spawn ordnance owned by this entity. Enemy-side layers; the player
    /// fires through `SimState`, not through a behavior tree.
    pub fn spawn_ordnance(
        &mut self,
        kind: OrdnanceKind,
        pos: Vec2,
        vel: Vec2,
        charging: bool,
        hold: Vec2,
    ) -> Option<Entity> {
        spawn::spawn_ordnance(
            self.ecs,
            self.ordnance_specs,
            self.entity,
            false,
            kind,
            pos,
            vel,
            charging,
            hold,
        )
    }

    /// Release a charging ordnance into flight with the given velocity.
    pub fn release_ordnance(&mut self, ord: Entity, vel: Vec2) -> bool {
        let Some(o) = self.ecs.get_mut::<Ordnance>(ord) else {
            return false;
        };
        o.phase = ecs_core::components::OrdnancePhase::Flight;
        self.ecs.insert(ord, ecs_core::components::Motion { vel, friction: 0.0 });
        true
    }
}

/// A behavior-tree node. `tick` must be re-entrant: a node holds no
/// mutable state of its own and persists everything through the blackboard.
pub trait Behavior {
    fn tick(&self, bb: &mut Bb<'_>) -> Status;
}

pub type Node = Box<dyn Behavior>;

/// Ticks children in order; stops at the first non-SUCCESS result.
pub struct Sequence {
    children: Vec<Node>,
}

impl Sequence {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

impl Behavior for Sequence {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        for child in &self.children {
            match child.tick(bb) {
                Status::Success => {}
                other => return other,
            }
        }
        Status::Success
    }
}

/// Ticks children in order; stops at the first non-FAILURE result.
pub struct Selector {
    children: Vec<Node>,
}

impl Selector {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

impl Behavior for Selector {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        for child in &self.children {
            match child.tick(bb) {
                Status::Failure => {}
                other => return other,
            }
        }
        Status::Failure
    }
}

/// Ticks every child every call. FAILURE if any child failed, else RUNNING
/// if any is still running, else SUCCESS.
pub struct Parallel {
    children: Vec<Node>,
}

impl Parallel {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

impl Behavior for Parallel {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let mut any_failed = false;
        let mut any_running = false;
        for child in &self.children {
            match child.tick(bb) {
                Status::Failure => any_failed = true,
                Status::Running => any_running = true,
                Status::Success => {}
            }
        }
        if any_failed {
            Status::Failure
        } else if any_running {
            Status::Running
        } else {
            Status::Success
        }
    }
}

/// Sequence that resumes at the child that last returned RUNNING instead
/// of restarting from child 0. The resume index is persisted in the
/// entity's `AiState` counters under `key` and reset on any terminal
/// result.
pub struct MemorySequence {
    key: &'static str,
    children: Vec<Node>,
}

impl MemorySequence {
    pub fn new(key: &'static str, children: Vec<Node>) -> Self {
        Self { key, children }
    }

    fn reset(&self, bb: &mut Bb<'_>) {
        if let Some(ai) = bb.ai_mut() {
            ai.counters.remove(self.key);
        }
    }
}

impl Behavior for MemorySequence {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        let key = self.key;
        let start = bb
            .ai_mut()
            .and_then(|ai| ai.counters.get(key))
            .unwrap_or(0) as usize;
        for (i, child) in self.children.iter().enumerate().skip(start) {
            match child.tick(bb) {
                Status::Success => {}
                Status::Running => {
                    if let Some(ai) = bb.ai_mut() {
                        ai.counters.set(key, i as u32);
                    }
                    return Status::Running;
                }
                Status::Failure => {
                    self.reset(bb);
                    return Status::Failure;
                }
            }
        }
        self.reset(bb);
        Status::Success
    }
}

/// Flips SUCCESS and FAILURE; RUNNING passes through.
pub struct Inverter {
    child: Node,
}

impl Inverter {
    pub fn new(child: Node) -> Self {
        Self { child }
    }
}

impl Behavior for Inverter {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        match self.child.tick(bb) {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            Status::Running => Status::Running,
        }
    }
}

/// Coerces any terminal result into SUCCESS; RUNNING passes through.
pub struct Succeeder {
    child: Node,
}

impl Succeeder {
    pub fn new(child: Node) -> Self {
        Self { child }
    }
}

impl Behavior for Succeeder {
    fn tick(&self, bb: &mut Bb<'_>) -> Status {
        match self.child.tick(bb) {
            Status::Running => Status::Running,
            _ => Status::Success,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_support {
    use super::*;
    use crate::context::AiCtx;
    use crate::geom::Rect;
    use ecs_core::components::PanelId;

    /// Recording `AiCtx` for leaf/handler tests without a full engine.
    #[derive(Default)]
    pub struct RecordingCtx {
        pub fx: Vec<(&'static str, Vec2)>,
        pub particles: usize,
        pub sounds: Vec<&'static str>,
        pub panel_damage: Vec<(PanelId, f32)>,
        pub rects: std::collections::HashMap<u32, Rect>,
    }

    impl AiCtx for RecordingCtx {
        fn spawn_fx(&mut self, kind: &'static str, pos: Vec2, _angle: f32) {
            self.fx.push((kind, pos));
        }
        fn spawn_particle(
            &mut self,
            _pos: Vec2,
            _vel: Vec2,
            _color: [f32; 3],
            _life_s: f32,
            _size: f32,
        ) {
            self.particles += 1;
        }
        fn play_sound(&mut self, key: &'static str, _pan_x: Option<f32>) {
            self.sounds.push(key);
        }
        fn damage_panel(&mut self, id: PanelId, amount: f32) {
            self.panel_damage.push((id, amount));
        }
        fn panel_rect(&self, id: PanelId) -> Option<Rect> {
            self.rects.get(&id.0).copied()
        }
        fn upgrade_level(&self, _key: &str) -> u32 {
            0
        }
    }

    /// Scripted leaf returning canned statuses, with a tick counter.
    pub struct Scripted {
        pub results: std::cell::RefCell<std::collections::VecDeque<Status>>,
        pub ticks: std::cell::Cell<u32>,
    }

    impl Scripted {
        pub fn new(results: &[Status]) -> Self {
            Self {
                results: std::cell::RefCell::new(results.iter().copied().collect()),
                ticks: std::cell::Cell::new(0),
            }
        }
    }

    impl Behavior for Scripted {
        fn tick(&self, _bb: &mut Bb<'_>) -> Status {
            self.ticks.set(self.ticks.get() + 1);
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or(Status::Success)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::test_support::{RecordingCtx, Scripted};
    use super::*;
    use ecs_core::components::tag;
    use rand::SeedableRng;
    use std::rc::Rc;

    fn with_bb<R>(f: impl FnOnce(&mut Bb<'_>) -> R) -> R {
        let mut ecs = Registry::new();
        let e = ecs.spawn(tag::ENEMY);
        ecs.insert(e, AiState::active());
        let mut ctx = RecordingCtx::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let specs = OrdnanceSpecDb::builtin();
        let mut bb = Bb {
            ecs: &mut ecs,
            entity: e,
            dt: 0.016,
            time: 0.0,
            ctx: &mut ctx,
            rng: &mut rng,
            ordnance_specs: &specs,
        };
        f(&mut bb)
    }

    #[test]
    fn sequence_stops_on_failure() {
        with_bb(|bb| {
            let second = Rc::new(Scripted::new(&[Status::Failure]));
            let seq = Sequence::new(vec![
                Box::new(Scripted::new(&[Status::Success])),
                Box::new(SharedNode(second.clone())),
                Box::new(Scripted::new(&[Status::Success])),
            ]);
            assert_eq!(seq.tick(bb), Status::Failure);
            assert_eq!(second.ticks.get(), 1);
        });
    }

    #[test]
    fn selector_returns_first_non_failure() {
        with_bb(|bb| {
            let sel = Selector::new(vec![
                Box::new(Scripted::new(&[Status::Failure])),
                Box::new(Scripted::new(&[Status::Running])),
                Box::new(Scripted::new(&[Status::Success])),
            ]);
            assert_eq!(sel.tick(bb), Status::Running);
        });
    }

    #[test]
    fn parallel_ticks_every_child() {
        with_bb(|bb| {
            let a = Rc::new(Scripted::new(&[Status::Failure]));
            let b = Rc::new(Scripted::new(&[Status::Running]));
            let par = Parallel::new(vec![
                Box::new(SharedNode(a.clone())),
                Box::new(SharedNode(b.clone())),
            ]);
            assert_eq!(par.tick(bb), Status::Failure);
            assert_eq!(a.ticks.get(), 1);
            assert_eq!(b.ticks.get(), 1, "parallel must tick all children");
        });
    }

    #[test]
    fn memory_sequence_resumes_at_running_child() {
        with_bb(|bb| {
            let first = Rc::new(Scripted::new(&[Status::Success, Status::Success]));
            let second = Rc::new(Scripted::new(&[Status::Running, Status::Success]));
            let seq = MemorySequence::new(
                "test.seq",
                vec![
                    Box::new(SharedNode(first.clone())),
                    Box::new(SharedNode(second.clone())),
                    Box::new(Scripted::new(&[Status::Success])),
                ],
            );
            assert_eq!(seq.tick(bb), Status::Running);
            assert_eq!(first.ticks.get(), 1);
            // Resumes at child 1; child 0 is not re-executed.
            assert_eq!(seq.tick(bb), Status::Success);
            assert_eq!(first.ticks.get(), 1);
            assert_eq!(second.ticks.get(), 2);
            // Terminal result reset the index.
            let ai = bb.ecs.get::<AiState>(bb.entity).unwrap();
            assert_eq!(ai.counters.get("test.seq"), None);
        });
    }

    #[test]
    fn inverter_and_succeeder_pass_running_through() {
        with_bb(|bb| {
            let inv = Inverter::new(Box::new(Scripted::new(&[Status::Running])));
            assert_eq!(inv.tick(bb), Status::Running);
            let inv = Inverter::new(Box::new(Scripted::new(&[Status::Success])));
            assert_eq!(inv.tick(bb), Status::Failure);
            let suc = Succeeder::new(Box::new(Scripted::new(&[Status::Failure])));
            assert_eq!(suc.tick(bb), Status::Success);
            let suc = Succeeder::new(Box::new(Scripted::new(&[Status::Running])));
            assert_eq!(suc.tick(bb), Status::Running);
        });
    }

    /// Adapter so a test can keep a handle on a node inside a tree.
    struct SharedNode(Rc<Scripted>);

    impl Behavior for SharedNode {
        fn tick(&self, bb: &mut Bb<'_>) -> Status {
            self.0.tick(bb)
        }
    }
}
