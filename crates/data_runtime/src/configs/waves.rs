//! Wave timeline configuration: scheduled spawn entries plus breach and
//! grace-period tuning.

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WaveEntry {
    /// Wave-clock time this entry becomes due, in seconds.
    pub at: f32,
    /// Archetype key into the archetype spec db.
    pub archetype: String,
    pub count: u32,
    /// Per-unit stagger within the entry, in seconds.
    pub interval: f32,
}

fn default_loop_scale() -> f32 {
    1.35
}
fn default_breach_base() -> f32 {
    0.02
}
fn default_breach_ramp() -> f32 {
    0.004
}
fn default_grace_min() -> f32 {
    0.5
}
fn default_grace_max() -> f32 {
    3.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaveConfig {
    pub entries: Vec<WaveEntry>,
    /// Spawn-count multiplier applied per completed timeline loop.
    #[serde(default = "default_loop_scale")]
    pub loop_scale: f32,
    /// Per-second breach spawn chance per destroyed panel at wave time 0.
    #[serde(default = "default_breach_base")]
    pub breach_base_chance: f32,
    /// Linear increase of the breach chance per second of wave time.
    #[serde(default = "default_breach_ramp")]
    pub breach_ramp: f32,
    /// SPAWN-phase grace timer range for fresh enemies, in seconds.
    #[serde(default = "default_grace_min")]
    pub grace_min_s: f32,
    #[serde(default = "default_grace_max")]
    pub grace_max_s: f32,
}

impl WaveConfig {
    pub fn load_default() -> Result<Self> {
        let path = crate::data_root().join("config/waves.toml");
        if path.is_file() {
            let txt = std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            let cfg: Self = toml::from_str(&txt).context("parse waves TOML")?;
            Ok(cfg)
        } else {
            Ok(Self::builtin())
        }
    }

    /// In-code default timeline mirroring `data/config/waves.toml`.
    pub fn builtin() -> Self {
        let entry = |at: f32, archetype: &str, count: u32, interval: f32| WaveEntry {
            at,
            archetype: archetype.into(),
            count,
            interval,
        };
        Self {
            entries: vec![
                entry(2.0, "mite", 4, 0.4),
                entry(8.0, "driller", 3, 0.8),
                entry(16.0, "hunter", 2, 1.0),
                entry(26.0, "driller", 4, 0.6),
                entry(34.0, "lancer", 2, 1.2),
                entry(45.0, "warden", 1, 0.0),
                entry(52.0, "mite", 8, 0.25),
            ],
            loop_scale: default_loop_scale(),
            breach_base_chance: default_breach_base(),
            breach_ramp: default_breach_ramp(),
            grace_min_s: default_grace_min(),
            grace_max_s: default_grace_max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn builtin_timeline_is_ordered() {
        let cfg = WaveConfig::builtin();
        assert!(!cfg.entries.is_empty());
        for pair in cfg.entries.windows(2) {
            assert!(pair[0].at <= pair[1].at, "timeline entries out of order");
        }
        assert!(cfg.grace_min_s < cfg.grace_max_s);
    }
}
