//! Entity construction helpers used by the wave director, behavior leaves
//! and the outer shell.

use data_runtime::specs::archetypes::ArchetypeSpecDb;
use data_runtime::specs::ordnance::OrdnanceSpecDb;
use ecs_core::components::{
    layer, tag, AiState, Archetype, Collider, Health, Identity, Motion, Orbital, Ordnance,
    OrdnanceKind, OrdnancePhase, Target, TargetKind, Transform,
};
use ecs_core::{Entity, Registry};
use glam::Vec2;

pub const PLAYER_RADIUS: f32 = 16.0;
pub const PLAYER_MAX_HP: i32 = 100;
/// Scratch key for a depletable shield pool, read by combat resolution.
pub const SHIELD_KEY: &str = "shield.hp";

pub fn spawn_player(ecs: &mut Registry, pos: Vec2) -> Entity {
    let e = ecs.spawn(tag::PLAYER);
    ecs.insert(e, Transform::at(pos));
    ecs.insert(e, Motion { vel: Vec2::ZERO, friction: 3.0 });
    ecs.insert(
        e,
        Collider::circle(PLAYER_RADIUS, layer::PLAYER, layer::ENEMY | layer::ENEMY_BOLT),
    );
    ecs.insert(e, Health::full(PLAYER_MAX_HP));
    ecs.insert(e, Identity::of(Archetype::Player));
    ecs.insert(e, Target::seeking(TargetKind::Enemy));
    e
}

/// Spawn an enemy of `archetype` in the SPAWN grace phase. Returns `None`
/// (and logs) when the archetype has no registered spec.
pub fn spawn_enemy(
    ecs: &mut Registry,
    specs: &ArchetypeSpecDb,
    archetype: Archetype,
    pos: Vec2,
    grace_s: f32,
) -> Option<Entity> {
    let Some(spec) = specs.get(archetype.key()) else {
        log::warn!("spawn: no archetype spec for '{}'", archetype.key());
        return None;
    };
    let e = ecs.spawn(tag::ENEMY);
    ecs.insert(e, Transform::at(pos));
    ecs.insert(e, Motion { vel: Vec2::ZERO, friction: 1.5 });
    ecs.insert(
        e,
        Collider::circle(spec.radius, layer::ENEMY, layer::PLAYER | layer::PLAYER_BOLT),
    );
    ecs.insert(e, Health::full(spec.hp));
    ecs.insert(e, Identity::of(archetype));
    let mut ai = AiState::spawning(grace_s);
    if spec.shield_hp > 0 {
        ai.counters.set(SHIELD_KEY, spec.shield_hp as u32);
    }
    ecs.insert(e, ai);
    // Drillers gnaw on hull panels; everyone else hunts the player.
    let seek = match archetype {
        Archetype::Driller => TargetKind::Panel,
        _ => TargetKind::Player,
    };
    ecs.insert(e, Target::seeking(seek));
    if matches!(archetype, Archetype::Warden) {
        ecs.insert(
            e,
            Orbital { center: pos, radius: 42.0, angular_speed: 1.1, angle: 0.0 },
        );
    }
    metrics::counter!("sim.spawns_total").increment(1);
    Some(e)
}

/// Spawn ordnance owned by `owner`. Charging ordnance rides the owner at
/// the `hold` offset until a behavior leaf releases it; flight ordnance
/// moves under `vel` immediately.
#[allow(clippy::too_many_arguments)]
pub fn spawn_ordnance(
    ecs: &mut Registry,
    specs: &OrdnanceSpecDb,
    owner: Entity,
    owner_is_player: bool,
    kind: OrdnanceKind,
    pos: Vec2,
    vel: Vec2,
    charging: bool,
    hold: Vec2,
) -> Option<Entity> {
    let Some(spec) = specs.get(kind.key()) else {
        log::warn!("spawn: no ordnance spec for '{}'", kind.key());
        return None;
    };
    let (lay, mask) = if owner_is_player {
        (layer::PLAYER_BOLT, layer::ENEMY | layer::ENEMY_BOLT)
    } else {
        (layer::ENEMY_BOLT, layer::PLAYER | layer::PLAYER_BOLT)
    };
    let e = ecs.spawn(tag::BOLT);
    ecs.insert(e, Transform::at(pos));
    ecs.insert(e, Collider::circle(spec.radius, lay, mask));
    ecs.insert(e, Health::full(spec.damage.max(1)));
    ecs.insert(e, Identity::of(Archetype::Ordnance(kind)));
    let phase = if charging { OrdnancePhase::Charging } else { OrdnancePhase::Flight };
    ecs.insert(e, Ordnance { phase, owner, kind, age_s: 0.0, hold });
    if !charging {
        ecs.insert(e, Motion { vel, friction: 0.0 });
    }
    Some(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ecs_core::components::AiPhase;

    #[test]
    fn warden_gets_shield_and_orbit() {
        let mut ecs = Registry::new();
        let specs = ArchetypeSpecDb::builtin();
        let e = spawn_enemy(&mut ecs, &specs, Archetype::Warden, Vec2::ZERO, 1.0).expect("spawn");
        let ai = ecs.get::<AiState>(e).unwrap();
        assert_eq!(ai.phase, AiPhase::Spawn);
        assert!(ai.counters.get(SHIELD_KEY).unwrap() > 0);
        assert!(ecs.get::<Orbital>(e).is_some());
    }

    #[test]
    fn unknown_archetype_spec_is_skipped() {
        let mut ecs = Registry::new();
        let specs = ArchetypeSpecDb::default();
        assert!(spawn_enemy(&mut ecs, &specs, Archetype::Mite, Vec2::ZERO, 1.0).is_none());
        assert_eq!(ecs.len(), 0);
    }

    #[test]
    fn charging_ordnance_has_no_motion() {
        let mut ecs = Registry::new();
        let specs = OrdnanceSpecDb::builtin();
        let owner = ecs.spawn(tag::ENEMY);
        let e = spawn_ordnance(
            &mut ecs,
            &specs,
            owner,
            false,
            OrdnanceKind::Torpedo,
            Vec2::ZERO,
            Vec2::ZERO,
            true,
            Vec2::new(10.0, 0.0),
        )
        .expect("spawn");
        assert!(ecs.get::<Motion>(e).is_none());
        assert_eq!(ecs.get::<Ordnance>(e).unwrap().phase, OrdnancePhase::Charging);
    }
}
