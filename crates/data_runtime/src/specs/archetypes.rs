//! Enemy archetype specifications for wave and breach spawns.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

fn default_shield() -> i32 {
    0
}
fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchetypeSpec {
    pub radius: f32,
    pub move_speed: f32,
    pub hp: i32,
    /// Damage the player takes when this archetype crashes into them.
    pub crash_damage: i32,
    /// Relative weight for breach spawns; higher = more common.
    #[serde(default = "default_weight")]
    pub spawn_weight: f32,
    /// Depletable shield pool intercepting damage (wardens only in the
    /// stock data).
    #[serde(default = "default_shield")]
    pub shield_hp: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchetypeSpecDb {
    /// Map from archetype key (e.g. "driller") to spec.
    pub entries: HashMap<String, ArchetypeSpec>,
}

impl ArchetypeSpecDb {
    pub fn get(&self, key: &str) -> Option<&ArchetypeSpec> {
        self.entries.get(key)
    }

    pub fn load_default() -> Result<Self> {
        let path = crate::data_root().join("config/archetypes.toml");
        if path.is_file() {
            let txt = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            let db: Self = toml::from_str(&txt).context("parse archetypes TOML")?;
            Ok(db)
        } else {
            Ok(Self::builtin())
        }
    }

    /// In-code defaults mirroring `data/config/archetypes.toml`.
    pub fn builtin() -> Self {
        let mut db = Self::default();
        db.entries.insert(
            "driller".into(),
            ArchetypeSpec {
                radius: 14.0,
                move_speed: 55.0,
                hp: 3,
                crash_damage: 8,
                spawn_weight: 4.0,
                shield_hp: 0,
            },
        );
        db.entries.insert(
            "hunter".into(),
            ArchetypeSpec {
                radius: 16.0,
                move_speed: 80.0,
                hp: 4,
                crash_damage: 10,
                spawn_weight: 3.0,
                shield_hp: 0,
            },
        );
        db.entries.insert(
            "lancer".into(),
            ArchetypeSpec {
                radius: 18.0,
                move_speed: 40.0,
                hp: 6,
                crash_damage: 12,
                spawn_weight: 2.0,
                shield_hp: 0,
            },
        );
        db.entries.insert(
            "mite".into(),
            ArchetypeSpec {
                radius: 9.0,
                move_speed: 95.0,
                hp: 1,
                crash_damage: 4,
                spawn_weight: 6.0,
                shield_hp: 0,
            },
        );
        db.entries.insert(
            "warden".into(),
            ArchetypeSpec {
                radius: 20.0,
                move_speed: 30.0,
                hp: 8,
                crash_damage: 14,
                spawn_weight: 1.0,
                shield_hp: 6,
            },
        );
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn builtin_covers_all_archetypes() {
        let db = ArchetypeSpecDb::builtin();
        for key in ["driller", "hunter", "lancer", "mite", "warden"] {
            assert!(db.get(key).is_some(), "missing builtin spec for {key}");
        }
        assert!(db.get("warden").map(|s| s.shield_hp).unwrap_or(0) > 0);
    }
}
