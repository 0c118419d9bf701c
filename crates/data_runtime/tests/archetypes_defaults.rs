#![allow(clippy::unwrap_used, clippy::expect_used)]

use data_runtime::specs::archetypes::ArchetypeSpecDb;
use data_runtime::specs::ordnance::OrdnanceSpecDb;

#[test]
fn archetype_db_loads_with_or_without_file() {
    let db = ArchetypeSpecDb::load_default().expect("load archetypes");
    for key in ["driller", "hunter", "lancer", "mite", "warden"] {
        let spec = db.get(key).unwrap_or_else(|| panic!("no spec for {key}"));
        assert!(spec.radius > 0.0);
        assert!(spec.hp > 0);
        assert!(spec.spawn_weight > 0.0);
    }
    // Mites are the weakest archetype and must outweigh wardens in breach rolls.
    let mite = db.get("mite").expect("mite");
    let warden = db.get("warden").expect("warden");
    assert!(mite.spawn_weight > warden.spawn_weight);
}

#[test]
fn ordnance_db_loads_with_or_without_file() {
    let db = OrdnanceSpecDb::load_default().expect("load ordnance");
    for key in ["bolt", "lance", "torpedo"] {
        let spec = db.get(key).unwrap_or_else(|| panic!("no spec for {key}"));
        assert!(spec.speed > 0.0);
        assert!(spec.damage > 0);
        assert!(spec.life_s > 0.0);
    }
}
