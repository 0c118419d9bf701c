//! Combat resolution: layer-pair dispatch over confirmed contacts, with
//! queued side effects applied in emission order.
//!
//! Destruction ordering matters: the domain event is emitted first (while
//! the entity's data is still valid for listeners), then the entity leaves
//! the registry, then the FX request goes out.

use std::collections::HashMap;
use std::sync::Arc;

use ecs_core::components::{layer, AiState, Archetype, Collider, Health, Identity, Transform};
use ecs_core::Entity;
use glam::Vec2;

use crate::context::{CombatCmd, CombatCtx, QueuedCombatCtx};
use crate::events::{AudioRequest, FxRequest, SimEvent};
use crate::schedule::Ctx;
use crate::spawn::SHIELD_KEY;
use crate::SimState;

/// One side of a colliding pair, snapshotted before handlers run.
#[derive(Debug, Clone, Copy)]
pub struct PairSide {
    pub entity: Entity,
    pub pos: Vec2,
    pub layer: u32,
    pub hp: i32,
    pub archetype: Option<Archetype>,
    /// Damage the player takes if this side crashes into them.
    pub crash_damage: i32,
}

pub type Handler = fn(&PairSide, &PairSide, &mut dyn CombatCtx);

/// Dispatch table keyed by canonicalized (smaller layer, larger layer).
#[derive(Clone, Default)]
pub struct CombatTable {
    map: Arc<HashMap<(u32, u32), Handler>>,
}

impl CombatTable {
    /// The stock pairings.
    pub fn standard() -> Self {
        let mut map: HashMap<(u32, u32), Handler> = HashMap::new();
        map.insert(key_for(layer::PLAYER, layer::ENEMY), crash);
        map.insert(key_for(layer::PLAYER, layer::ENEMY_BOLT), bolt_hit);
        map.insert(key_for(layer::ENEMY, layer::PLAYER_BOLT), mass_exchange);
        map.insert(key_for(layer::PLAYER_BOLT, layer::ENEMY_BOLT), mass_exchange);
        Self { map: Arc::new(map) }
    }

    pub fn handler(&self, a: u32, b: u32) -> Option<Handler> {
        self.map.get(&key_for(a, b)).copied()
    }
}

#[inline]
fn key_for(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Spray angle convention: the raw impact vector from impactor to victim,
/// so destruction particles fly outward along the force direction.
#[inline]
pub fn spray_angle(impactor: Vec2, victim: Vec2) -> f32 {
    let v = victim - impactor;
    v.y.atan2(v.x)
}

/// Player crashes through an enemy: fixed archetype damage to the player,
/// the enemy is destroyed along the impact direction.
fn crash(player: &PairSide, enemy: &PairSide, ctx: &mut dyn CombatCtx) {
    ctx.damage_player(enemy.crash_damage);
    ctx.destroy(enemy.entity, Some("burst"), spray_angle(player.pos, enemy.pos));
    ctx.add_trauma(0.35);
    ctx.play_spatial_audio("crash", enemy.pos.x);
}

/// Enemy ordnance reaches the player: fixed damage, round destroyed.
fn bolt_hit(player: &PairSide, bolt: &PairSide, ctx: &mut dyn CombatCtx) {
    ctx.damage_player(bolt.hp);
    ctx.destroy(bolt.entity, Some("hit"), spray_angle(player.pos, bolt.pos));
    ctx.add_trauma(0.15);
    ctx.play_spatial_audio("hit", bolt.pos.x);
}

/// The two colliders trade health points equal to min(hpA, hpB); each side
/// reaching zero is destroyed.
fn mass_exchange(a: &PairSide, b: &PairSide, ctx: &mut dyn CombatCtx) {
    let trade = a.hp.min(b.hp);
    if trade <= 0 {
        return;
    }
    ctx.hit(a.entity, trade, Some("burst"), spray_angle(b.pos, a.pos));
    ctx.hit(b.entity, trade, Some("burst"), spray_angle(a.pos, b.pos));
    ctx.play_spatial_audio("exchange", (a.pos.x + b.pos.x) * 0.5);
}

fn side_of(state: &SimState, e: Entity, col: &Collider) -> PairSide {
    let pos = state.ecs.get::<Transform>(e).map(|t| t.pos).unwrap_or(Vec2::ZERO);
    let hp = state.ecs.get::<Health>(e).map(|h| h.hp).unwrap_or(0);
    let archetype = state.ecs.get::<Identity>(e).map(|i| i.archetype);
    let crash_damage = archetype
        .filter(|a| a.is_enemy())
        .and_then(|a| state.archetypes.get(a.key()))
        .map(|s| s.crash_damage)
        .unwrap_or(0);
    PairSide { entity: e, pos, layer: col.layer, hp, archetype, crash_damage }
}

/// Resolve every contact found this tick, then apply queued side effects.
pub fn resolve(state: &mut SimState, ctx: &mut Ctx) {
    if ctx.contacts.is_empty() {
        return;
    }
    let table = state.combat.clone();
    let mut sink = QueuedCombatCtx::default();
    for c in &ctx.contacts {
        // Earlier pairs this tick may already have despawned a side.
        if !state.ecs.is_alive(c.a) || !state.ecs.is_alive(c.b) {
            continue;
        }
        let (Some(ca), Some(cb)) = (
            state.ecs.get::<Collider>(c.a).copied(),
            state.ecs.get::<Collider>(c.b).copied(),
        ) else {
            continue;
        };
        let Some(handler) = table.handler(ca.layer, cb.layer) else {
            log::trace!("combat: no handler for layers {:#x}/{:#x}", ca.layer, cb.layer);
            continue;
        };
        let sa = side_of(state, c.a, &ca);
        let sb = side_of(state, c.b, &cb);
        // Hand sides over in canonical (smaller layer first) order.
        if sa.layer <= sb.layer {
            handler(&sa, &sb, &mut sink);
        } else {
            handler(&sb, &sa, &mut sink);
        }
        // Apply immediately so later contacts observe this pair's outcome
        // (a bolt spent on one enemy doesn't also kill a second).
        apply(state, std::mem::take(&mut sink.cmds));
    }
}

fn apply(state: &mut SimState, cmds: Vec<CombatCmd>) {
    for cmd in cmds {
        match cmd {
            CombatCmd::DamagePlayer { amount } => damage_player(state, amount),
            CombatCmd::Hit { target, amount, fx, angle } => {
                hit_entity(state, target, amount, fx, angle);
            }
            CombatCmd::Destroy { target, fx, angle } => destroy_entity(state, target, fx, angle),
            CombatCmd::Fx { kind, pos, angle } => {
                state.fx.push(FxRequest::Effect { kind, pos, angle });
            }
            CombatCmd::Audio { key, pan_x } => {
                state.audio.push(AudioRequest { key, pan_x });
            }
            CombatCmd::Trauma { amount } => state.add_trauma(amount),
        }
    }
}

/// Route damage through shield interception, then health, then
/// destruction.
fn hit_entity(state: &mut SimState, e: Entity, amount: i32, fx: Option<&'static str>, angle: f32) {
    if !state.ecs.is_alive(e) || amount <= 0 {
        return;
    }
    let mut remaining = amount;
    if let Some(ai) = state.ecs.get_mut::<AiState>(e) {
        let shield = ai.counters.get(SHIELD_KEY).unwrap_or(0);
        if shield > 0 {
            let absorbed = shield.min(remaining as u32);
            ai.counters.set(SHIELD_KEY, shield - absorbed);
            remaining -= absorbed as i32;
            let pos = state.ecs.get::<Transform>(e).map(|t| t.pos).unwrap_or(Vec2::ZERO);
            state.fx.push(FxRequest::Effect { kind: "shield_flare", pos, angle });
        }
    }
    if remaining <= 0 {
        return;
    }
    let Some(h) = state.ecs.get_mut::<Health>(e) else {
        return;
    };
    h.hp = (h.hp - remaining).max(0);
    if h.hp == 0 {
        destroy_entity(state, e, fx, angle);
    }
}

/// Destroy an entity: domain event first, then registry despawn, then the
/// FX request.
pub(crate) fn destroy_entity(
    state: &mut SimState,
    e: Entity,
    fx: Option<&'static str>,
    angle: f32,
) {
    if !state.ecs.is_alive(e) {
        return;
    }
    let pos = state.ecs.get::<Transform>(e).map(|t| t.pos).unwrap_or(Vec2::ZERO);
    if let Some(archetype) = state.ecs.get::<Identity>(e).map(|i| i.archetype) {
        if archetype.is_enemy() {
            state.events.push(SimEvent::EnemyDestroyed { archetype, pos });
            metrics::counter!("sim.enemies_destroyed_total").increment(1);
        }
    }
    state.ecs.despawn(e);
    if let Some(kind) = fx {
        state.fx.push(FxRequest::Effect { kind, pos, angle });
    }
}

fn damage_player(state: &mut SimState, amount: i32) {
    let Some(p) = state.player.filter(|p| state.ecs.is_alive(*p)) else {
        return;
    };
    let Some(h) = state.ecs.get_mut::<Health>(p) else {
        return;
    };
    h.hp = (h.hp - amount).max(0);
    let after = h.hp;
    state.events.push(SimEvent::PlayerDamaged { amount, hp_after: after });
    if after == 0 {
        log::info!("combat: player destroyed");
        state.events.push(SimEvent::PlayerDestroyed);
        state.ecs.despawn(p);
        state.player = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::systems::collision::Contact;
    use ecs_core::components::{tag, OrdnanceKind};

    fn bolt(state: &mut SimState, pos: Vec2, hp: i32, lay: u32, mask: u32) -> Entity {
        let e = state.ecs.spawn(tag::BOLT);
        state.ecs.insert(e, Transform::at(pos));
        state.ecs.insert(e, Collider::circle(4.0, lay, mask));
        state.ecs.insert(e, Health::full(hp));
        state
            .ecs
            .insert(e, Identity::of(Archetype::Ordnance(OrdnanceKind::Bolt)));
        e
    }

    #[test]
    fn mass_exchange_trades_min_health() {
        let mut state = SimState::with_seed(1).expect("state");
        let a = bolt(&mut state, Vec2::ZERO, 3, layer::PLAYER_BOLT, layer::ENEMY_BOLT);
        let b = bolt(&mut state, Vec2::new(2.0, 0.0), 5, layer::ENEMY_BOLT, layer::PLAYER_BOLT);
        let mut ctx = Ctx::default();
        ctx.contacts.push(Contact { a, b });
        resolve(&mut state, &mut ctx);
        // 3 vs 5: the weaker side dies, the stronger keeps the difference.
        assert!(!state.ecs.is_alive(a));
        assert!(state.ecs.is_alive(b));
        assert_eq!(state.ecs.get::<Health>(b).unwrap().hp, 2);
    }

    #[test]
    fn crash_damages_player_and_destroys_enemy() {
        let mut state = SimState::with_seed(1).expect("state");
        let p = crate::spawn::spawn_player(&mut state.ecs, Vec2::ZERO);
        state.player = Some(p);
        let e = crate::spawn::spawn_enemy(
            &mut state.ecs,
            &state.archetypes.clone(),
            Archetype::Driller,
            Vec2::new(10.0, 0.0),
            0.0,
        )
        .expect("enemy");
        let crash_damage = state.archetypes.get("driller").unwrap().crash_damage;
        let mut ctx = Ctx::default();
        ctx.contacts.push(Contact { a: p, b: e });
        resolve(&mut state, &mut ctx);
        assert!(!state.ecs.is_alive(e));
        assert_eq!(
            state.ecs.get::<Health>(p).unwrap().hp,
            crate::spawn::PLAYER_MAX_HP - crash_damage
        );
        // Destruction event precedes the FX request in queue order.
        let events: Vec<SimEvent> = state.events.drain().collect();
        assert!(events
            .iter()
            .any(|ev| matches!(ev, SimEvent::EnemyDestroyed { archetype: Archetype::Driller, .. })));
        assert!(state.trauma > 0.0);
    }

    #[test]
    fn spray_angle_points_from_impactor_to_victim() {
        let a = spray_angle(Vec2::ZERO, Vec2::new(0.0, 5.0));
        assert!((a - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn warden_shield_absorbs_before_health() {
        let mut state = SimState::with_seed(1).expect("state");
        let specs = state.archetypes.clone();
        let w = crate::spawn::spawn_enemy(&mut state.ecs, &specs, Archetype::Warden, Vec2::ZERO, 0.0)
            .expect("warden");
        // Force out of spawn grace so the hit applies normally.
        state.ecs.get_mut::<AiState>(w).unwrap().phase = ecs_core::components::AiPhase::Active;
        let shield = specs.get("warden").unwrap().shield_hp;
        let hp = specs.get("warden").unwrap().hp;
        hit_entity(&mut state, w, shield + 2, Some("burst"), 0.0);
        assert!(state.ecs.is_alive(w));
        assert_eq!(state.ecs.get::<Health>(w).unwrap().hp, hp - 2);
        assert_eq!(
            state.ecs.get::<AiState>(w).unwrap().counters.get(SHIELD_KEY),
            Some(0)
        );
    }

    #[test]
    fn player_death_emits_destroyed_event() {
        let mut state = SimState::with_seed(1).expect("state");
        let p = crate::spawn::spawn_player(&mut state.ecs, Vec2::ZERO);
        state.player = Some(p);
        damage_player(&mut state, crate::spawn::PLAYER_MAX_HP + 10);
        assert!(state.player.is_none());
        let events: Vec<SimEvent> = state.events.drain().collect();
        assert!(events.iter().any(|ev| matches!(ev, SimEvent::PlayerDestroyed)));
    }
}
