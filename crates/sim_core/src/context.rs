//! Capability interfaces between simulation logic and the outside world.
//!
//! Behavior-tree leaves and combat handlers never touch the renderer or
//! audio directly; they call these narrow traits. The engine-side
//! implementations are queue-backed; tests substitute recording harnesses
//! to exercise leaves and handlers without a full engine instance.

use std::collections::HashMap;

use ecs_core::components::PanelId;
use ecs_core::Entity;
use glam::Vec2;

use crate::events::{AudioRequest, EventQueue, FxRequest};
use crate::geom::Rect;
use crate::structure::StructureHealth;

/// Player upgrade levels, owned by the outer game shell and read-only from
/// the simulation's point of view. Unknown keys read as level 0.
#[derive(Debug, Default, Clone)]
pub struct Upgrades {
    levels: HashMap<String, u32>,
}

impl Upgrades {
    pub fn level(&self, key: &str) -> u32 {
        self.levels.get(key).copied().unwrap_or(0)
    }

    pub fn set_level(&mut self, key: &str, level: u32) {
        self.levels.insert(key.to_owned(), level);
    }
}

/// Execution context for behavior-tree leaves.
pub trait AiCtx {
    fn spawn_fx(&mut self, kind: &'static str, pos: Vec2, angle: f32);
    fn spawn_particle(&mut self, pos: Vec2, vel: Vec2, color: [f32; 3], life_s: f32, size: f32);
    fn play_sound(&mut self, key: &'static str, pan_x: Option<f32>);
    fn damage_panel(&mut self, id: PanelId, amount: f32);
    fn panel_rect(&self, id: PanelId) -> Option<Rect>;
    fn upgrade_level(&self, key: &str) -> u32;
}

/// Engine-side `AiCtx`: FX/audio requests land on the bounded queues,
/// panel calls go straight to the structure service.
pub struct EngineAiCtx<'a> {
    pub fx: &'a mut EventQueue<FxRequest>,
    pub audio: &'a mut EventQueue<AudioRequest>,
    pub panels: &'a mut StructureHealth,
    pub upgrades: &'a Upgrades,
}

impl AiCtx for EngineAiCtx<'_> {
    fn spawn_fx(&mut self, kind: &'static str, pos: Vec2, angle: f32) {
        self.fx.push(FxRequest::Effect { kind, pos, angle });
    }

    fn spawn_particle(&mut self, pos: Vec2, vel: Vec2, color: [f32; 3], life_s: f32, size: f32) {
        self.fx.push(FxRequest::Particle { pos, vel, color, life_s, size });
    }

    fn play_sound(&mut self, key: &'static str, pan_x: Option<f32>) {
        self.audio.push(AudioRequest { key, pan_x });
    }

    fn damage_panel(&mut self, id: PanelId, amount: f32) {
        self.panels.damage(id, amount);
    }

    fn panel_rect(&self, id: PanelId) -> Option<Rect> {
        self.panels.rect(id)
    }

    fn upgrade_level(&self, key: &str) -> u32 {
        self.upgrades.level(key)
    }
}

/// Side-effect interface for combat resolution handlers.
///
/// `hit` routes damage through shield interception before destruction;
/// `destroy` bypasses health entirely. Both carry the FX kind and spray
/// angle used if the target ends up destroyed.
pub trait CombatCtx {
    fn damage_player(&mut self, amount: i32);
    fn hit(&mut self, target: Entity, amount: i32, fx: Option<&'static str>, angle: f32);
    fn destroy(&mut self, target: Entity, fx: Option<&'static str>, angle: f32);
    fn spawn_fx(&mut self, kind: &'static str, pos: Vec2, angle: f32);
    fn play_audio(&mut self, key: &'static str);
    fn play_spatial_audio(&mut self, key: &'static str, x: f32);
    fn add_trauma(&mut self, amount: f32);
}

/// One queued combat side effect, applied in emission order after all
/// handlers for the tick have run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatCmd {
    DamagePlayer { amount: i32 },
    Hit { target: Entity, amount: i32, fx: Option<&'static str>, angle: f32 },
    Destroy { target: Entity, fx: Option<&'static str>, angle: f32 },
    Fx { kind: &'static str, pos: Vec2, angle: f32 },
    Audio { key: &'static str, pan_x: Option<f32> },
    Trauma { amount: f32 },
}

/// Engine-side `CombatCtx`: records commands for deferred application so
/// handlers stay free of registry borrows.
#[derive(Debug, Default)]
pub struct QueuedCombatCtx {
    pub cmds: Vec<CombatCmd>,
}

impl CombatCtx for QueuedCombatCtx {
    fn damage_player(&mut self, amount: i32) {
        self.cmds.push(CombatCmd::DamagePlayer { amount });
    }

    fn hit(&mut self, target: Entity, amount: i32, fx: Option<&'static str>, angle: f32) {
        self.cmds.push(CombatCmd::Hit { target, amount, fx, angle });
    }

    fn destroy(&mut self, target: Entity, fx: Option<&'static str>, angle: f32) {
        self.cmds.push(CombatCmd::Destroy { target, fx, angle });
    }

    fn spawn_fx(&mut self, kind: &'static str, pos: Vec2, angle: f32) {
        self.cmds.push(CombatCmd::Fx { kind, pos, angle });
    }

    fn play_audio(&mut self, key: &'static str) {
        self.cmds.push(CombatCmd::Audio { key, pan_x: None });
    }

    fn play_spatial_audio(&mut self, key: &'static str, x: f32) {
        self.cmds.push(CombatCmd::Audio { key, pan_x: Some(x) });
    }

    fn add_trauma(&mut self, amount: f32) {
        self.cmds.push(CombatCmd::Trauma { amount });
    }
}
