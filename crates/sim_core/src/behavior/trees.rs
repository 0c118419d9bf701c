//! Archetype behavior trees.
//!
//! One tree per enemy archetype, constructed once with stats baked in from
//! the spec databases and shared by every entity of that archetype. The
//! registry is explicitly constructed and injected into the behavior
//! system; there is no global state.

use std::collections::HashMap;
use std::sync::Arc;

use data_runtime::specs::archetypes::ArchetypeSpecDb;
use data_runtime::specs::ordnance::OrdnanceSpecDb;
use ecs_core::components::{Archetype, OrdnanceKind};

use super::leaves::{
    ChargeRelease, DrillPanel, FaceTarget, FireOrdnance, HoverBand, MoveToTarget, Spin,
    TrailParticles, Wait, WithinRange,
};
use super::{Behavior, MemorySequence, Parallel, Selector, Sequence};

#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    trees: HashMap<Archetype, Arc<dyn Behavior>>,
}

impl BehaviorRegistry {
    pub fn tree(&self, archetype: Archetype) -> Option<Arc<dyn Behavior>> {
        self.trees.get(&archetype).cloned()
    }

    /// Build the stock tree set from the spec databases.
    pub fn build(archetypes: &ArchetypeSpecDb, _ordnance: &OrdnanceSpecDb) -> Self {
        let speed = |key: &str| {
            archetypes.get(key).map(|s| s.move_speed).unwrap_or_else(|| {
                log::warn!("behavior: no archetype spec for '{key}', using fallback speed");
                50.0
            })
        };

        let mut trees: HashMap<Archetype, Arc<dyn Behavior>> = HashMap::new();

        // Driller: close on the locked panel and gnaw; chase whatever the
        // target falls back to otherwise.
        trees.insert(
            Archetype::Driller,
            Arc::new(Parallel::new(vec![
                Box::new(TrailParticles {
                    key: "driller.trail",
                    every_s: 0.12,
                    color: [1.0, 0.6, 0.2],
                }),
                Box::new(Selector::new(vec![
                    Box::new(Sequence::new(vec![
                        Box::new(MoveToTarget { speed: speed("driller"), arrive: 26.0 }),
                        Box::new(DrillPanel { dps: 9.0, range: 44.0 }),
                    ])),
                    Box::new(MoveToTarget { speed: speed("driller"), arrive: 8.0 }),
                ])),
            ])),
        );

        // Hunter: approach, aim, snap off a bolt, rest. The memory sequence
        // resumes mid-cycle after RUNNING children.
        trees.insert(
            Archetype::Hunter,
            Arc::new(Parallel::new(vec![
                Box::new(TrailParticles {
                    key: "hunter.trail",
                    every_s: 0.2,
                    color: [0.4, 0.8, 1.0],
                }),
                Box::new(MemorySequence::new(
                    "hunter.cycle",
                    vec![
                        Box::new(MoveToTarget { speed: speed("hunter"), arrive: 180.0 }),
                        Box::new(FaceTarget),
                        Box::new(Wait { key: "hunter.aim", secs: 0.35 }),
                        Box::new(FireOrdnance { kind: OrdnanceKind::Bolt, sound: "enemy_fire" }),
                        Box::new(Wait { key: "hunter.rest", secs: 0.9 }),
                    ],
                )),
            ])),
        );

        // Lancer: hold a standoff band and run charge-and-release attacks
        // while the player stays in reach.
        trees.insert(
            Archetype::Lancer,
            Arc::new(Selector::new(vec![
                Box::new(Sequence::new(vec![
                    Box::new(WithinRange { dist: 260.0 }),
                    Box::new(Parallel::new(vec![
                        Box::new(HoverBand {
                            min_r: 140.0,
                            max_r: 240.0,
                            speed: speed("lancer"),
                            key: "lancer.hover",
                        }),
                        Box::new(MemorySequence::new(
                            "lancer.attack",
                            vec![
                                Box::new(FaceTarget),
                                Box::new(Wait { key: "lancer.aim", secs: 0.5 }),
                                Box::new(ChargeRelease {
                                    kind: OrdnanceKind::Lance,
                                    key: "lancer.charge",
                                }),
                                Box::new(Wait { key: "lancer.cool", secs: 1.2 }),
                            ],
                        )),
                    ])),
                ])),
                Box::new(MoveToTarget { speed: speed("lancer"), arrive: 200.0 }),
            ])),
        );

        // Mite: spinning kamikaze; the crash handler does the damage.
        trees.insert(
            Archetype::Mite,
            Arc::new(Parallel::new(vec![
                Box::new(Spin { rate: 6.0 }),
                Box::new(MoveToTarget { speed: speed("mite"), arrive: 4.0 }),
            ])),
        );

        // Warden: orbits its anchor (motion system) and lobs torpedoes when
        // the player comes close.
        trees.insert(
            Archetype::Warden,
            Arc::new(Parallel::new(vec![
                Box::new(Spin { rate: 1.5 }),
                Box::new(Sequence::new(vec![
                    Box::new(WithinRange { dist: 320.0 }),
                    Box::new(MemorySequence::new(
                        "warden.cycle",
                        vec![
                            Box::new(Wait { key: "warden.aim", secs: 0.6 }),
                            Box::new(FireOrdnance {
                                kind: OrdnanceKind::Torpedo,
                                sound: "torpedo_fire",
                            }),
                        ],
                    )),
                ])),
            ])),
        );

        Self { trees }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_enemy_archetype() {
        let reg = BehaviorRegistry::build(&ArchetypeSpecDb::builtin(), &OrdnanceSpecDb::builtin());
        for a in [
            Archetype::Driller,
            Archetype::Hunter,
            Archetype::Lancer,
            Archetype::Mite,
            Archetype::Warden,
        ] {
            assert!(reg.tree(a).is_some(), "missing tree for {a:?}");
        }
        assert!(reg.tree(Archetype::Player).is_none());
    }
}
