#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Structure events surface exactly once on the domain queue, in order.

use glam::Vec2;
use sim_core::events::SimEvent;
use sim_core::geom::Rect;
use sim_core::structure::{PANEL_MAX_HEALTH, RESTORE_FRACTION};
use sim_core::SimState;

#[test]
fn panel_destruction_and_restore_reach_the_domain_queue_once() {
    let mut state = SimState::with_seed(2).expect("state");
    state.peace = true;
    let id = state
        .panels
        .register("aft", Rect::from_center(Vec2::new(120.0, 0.0), 100.0, 40.0));
    state.drain_events();
    state.step(0.05);
    state.drain_events();

    // Overkill across several calls: one destroyed event total.
    state.panels.damage(id, 70.0);
    state.panels.damage(id, 70.0);
    state.panels.damage(id, 70.0);
    state.step(0.05);
    let events = state.drain_events();
    let destroyed = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PanelDestroyed(p) if *p == id))
        .count();
    assert_eq!(destroyed, 1);

    // Repair past the max threshold: one restored event, fractional health.
    state.panels.heal(id, PANEL_MAX_HEALTH + 10.0);
    state.step(0.05);
    let events = state.drain_events();
    let restored = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PanelRestored(p) if *p == id))
        .count();
    assert_eq!(restored, 1);
    let hp = state.panels.panel(id).unwrap().health;
    assert!((hp - PANEL_MAX_HEALTH * RESTORE_FRACTION).abs() < 1e-4);

    // Integrity follows the aggregate formula for the single panel.
    let expected = hp / PANEL_MAX_HEALTH * 100.0;
    assert!((state.panels.integrity() - expected).abs() < 1e-3);
}
