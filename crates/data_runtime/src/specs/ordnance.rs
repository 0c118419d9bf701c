//! Ordnance (projectile) specifications: damage/speed/lifetime profiles.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

fn default_charge() -> f32 {
    0.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdnanceSpec {
    pub speed: f32,
    pub radius: f32,
    pub damage: i32,
    pub life_s: f32,
    /// Seconds spent attached to the owner before release; 0 fires
    /// immediately in FLIGHT.
    #[serde(default = "default_charge")]
    pub charge_s: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdnanceSpecDb {
    /// Map from ordnance key (e.g. "bolt") to spec.
    pub entries: HashMap<String, OrdnanceSpec>,
}

impl OrdnanceSpecDb {
    pub fn get(&self, key: &str) -> Option<&OrdnanceSpec> {
        self.entries.get(key)
    }

    pub fn load_default() -> Result<Self> {
        let path = crate::data_root().join("config/ordnance.toml");
        if path.is_file() {
            let txt = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            let db: Self = toml::from_str(&txt).context("parse ordnance TOML")?;
            Ok(db)
        } else {
            Ok(Self::builtin())
        }
    }

    /// In-code defaults mirroring `data/config/ordnance.toml`.
    pub fn builtin() -> Self {
        let mut db = Self::default();
        db.entries.insert(
            "bolt".into(),
            OrdnanceSpec { speed: 240.0, radius: 4.0, damage: 1, life_s: 2.5, charge_s: 0.0 },
        );
        db.entries.insert(
            "lance".into(),
            OrdnanceSpec { speed: 320.0, radius: 5.0, damage: 2, life_s: 2.0, charge_s: 0.9 },
        );
        db.entries.insert(
            "torpedo".into(),
            OrdnanceSpec { speed: 120.0, radius: 7.0, damage: 3, life_s: 4.0, charge_s: 1.4 },
        );
        db
    }
}
