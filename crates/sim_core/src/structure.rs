//! Structure health service: authoritative hull-panel state.
//!
//! Panels are a fixed, externally-registered set (one per on-screen panel),
//! not ECS entities. The service owns health/destroyed flags, aggregates
//! overall integrity, and emits edge-triggered events that the schedule
//! forwards to the domain queue.

use ecs_core::components::PanelId;

use crate::geom::Rect;

pub const PANEL_MAX_HEALTH: f32 = 100.0;
/// Fraction of max health a repaired panel comes back with.
pub const RESTORE_FRACTION: f32 = 0.35;
/// Minimum integrity delta (percent points) that notifies listeners.
const INTEGRITY_NOTIFY_STEP: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct Panel {
    pub id: PanelId,
    pub name: String,
    pub rect: Rect,
    pub health: f32,
    pub destroyed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StructureEvent {
    PanelDestroyed(PanelId),
    PanelRestored(PanelId),
    IntegrityChanged { percent: f32 },
}

#[derive(Debug, Default)]
pub struct StructureHealth {
    panels: Vec<Panel>,
    next_id: u32,
    integrity: Option<f32>,
    last_notified: Option<f32>,
    events: Vec<StructureEvent>,
}

impl StructureHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a panel with its world rect; done once per panel at setup.
    pub fn register(&mut self, name: &str, rect: Rect) -> PanelId {
        let id = PanelId(self.next_id);
        self.next_id += 1;
        self.panels.push(Panel {
            id,
            name: name.to_owned(),
            rect,
            health: PANEL_MAX_HEALTH,
            destroyed: false,
        });
        self.recompute_integrity();
        log::debug!("structure: registered panel '{name}' as {id:?}");
        id
    }

    pub fn unregister(&mut self, id: PanelId) {
        self.panels.retain(|p| p.id != id);
        self.recompute_integrity();
    }

    /// Refresh a panel's geometry (panels can move with layout).
    pub fn update_rect(&mut self, id: PanelId, rect: Rect) {
        if let Some(p) = self.panel_mut(id) {
            p.rect = rect;
        }
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    pub fn rect(&self, id: PanelId) -> Option<Rect> {
        self.panel(id).map(|p| p.rect)
    }

    pub fn is_destroyed(&self, id: PanelId) -> bool {
        self.panel(id).map(|p| p.destroyed).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn destroyed_panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter().filter(|p| p.destroyed)
    }

    pub fn any_destroyed(&self) -> bool {
        self.panels.iter().any(|p| p.destroyed)
    }

    /// Apply damage. Clamps at zero and flips `destroyed` exactly once at
    /// the transition; further damage on a destroyed panel is ignored.
    pub fn damage(&mut self, id: PanelId, amount: f32) {
        let Some(p) = self.panel_mut(id) else {
            log::debug!("structure: damage on unknown panel {id:?}");
            return;
        };
        if p.destroyed || amount <= 0.0 {
            return;
        }
        p.health = (p.health - amount).max(0.0);
        if p.health <= 0.0 {
            p.destroyed = true;
            let pid = p.id;
            log::info!("structure: panel {:?} '{}' destroyed", pid, p.name);
            metrics::counter!("sim.panels_destroyed_total").increment(1);
            self.events.push(StructureEvent::PanelDestroyed(pid));
        }
        self.recompute_integrity();
    }

    /// Apply repair. Live panels clamp at max. Destroyed panels accumulate
    /// repair progress; crossing the max threshold resurrects the panel at
    /// `RESTORE_FRACTION` of max (not full) and emits a restored event.
    pub fn heal(&mut self, id: PanelId, amount: f32) {
        let Some(p) = self.panel_mut(id) else {
            log::debug!("structure: heal on unknown panel {id:?}");
            return;
        };
        if amount <= 0.0 {
            return;
        }
        if p.destroyed {
            p.health += amount;
            if p.health >= PANEL_MAX_HEALTH {
                p.destroyed = false;
                p.health = PANEL_MAX_HEALTH * RESTORE_FRACTION;
                let pid = p.id;
                log::info!("structure: panel {:?} '{}' restored", pid, p.name);
                self.events.push(StructureEvent::PanelRestored(pid));
            }
        } else {
            p.health = (p.health + amount).min(PANEL_MAX_HEALTH);
        }
        self.recompute_integrity();
    }

    /// Bleed repair progress off an already-destroyed panel. Never flips
    /// state and does nothing to live panels.
    pub fn decay(&mut self, id: PanelId, amount: f32) {
        let Some(p) = self.panel_mut(id) else {
            return;
        };
        if !p.destroyed || amount <= 0.0 {
            return;
        }
        p.health = (p.health - amount).max(0.0);
        self.recompute_integrity();
    }

    /// Aggregate integrity percentage: health sum over non-destroyed panels
    /// divided by total possible health, clamped [0, 100]. 100 with zero
    /// panels registered.
    pub fn integrity(&self) -> f32 {
        self.integrity.unwrap_or(100.0)
    }

    fn recompute_integrity(&mut self) {
        let next = if self.panels.is_empty() {
            100.0
        } else {
            let total: f32 = self
                .panels
                .iter()
                .filter(|p| !p.destroyed)
                .map(|p| p.health)
                .sum();
            (total / (self.panels.len() as f32 * PANEL_MAX_HEALTH) * 100.0).clamp(0.0, 100.0)
        };
        self.integrity = Some(next);
        // Edge-triggered notification to avoid flooding listeners.
        let notify = match self.last_notified {
            Some(prev) => (next - prev).abs() >= INTEGRITY_NOTIFY_STEP || (next == 0.0) != (prev == 0.0),
            None => true,
        };
        if notify {
            self.last_notified = Some(next);
            self.events.push(StructureEvent::IntegrityChanged { percent: next });
        }
    }

    /// Take all pending events (drained once per tick by the schedule).
    pub fn drain_events(&mut self) -> Vec<StructureEvent> {
        std::mem::take(&mut self.events)
    }
}
