//! Bounded request/event queues for temporal decoupling.
//!
//! Combat and behavior code push FX/audio requests and domain events here;
//! the owning external system drains each queue exactly once per tick. A
//! full queue drops the excess silently (graceful degradation) and counts
//! the drops.

use ecs_core::components::{Archetype, PanelId};
use glam::Vec2;

/// Single bounded FIFO. Not a concurrency primitive: producers and the
/// consumer run on the same thread in fixed tick order.
#[derive(Debug)]
pub struct EventQueue<T> {
    items: std::collections::VecDeque<T>,
    cap: usize,
    dropped: u64,
}

impl<T> EventQueue<T> {
    pub fn new(cap: usize) -> Self {
        Self { items: std::collections::VecDeque::with_capacity(cap), cap, dropped: 0 }
    }

    /// Push an item; returns false (and counts) when the queue is full.
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() >= self.cap {
            self.dropped += 1;
            metrics::counter!("sim.queue.dropped_total").increment(1);
            return false;
        }
        self.items.push_back(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total items ever dropped due to capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drain all queued items in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }
}

/// Visual-effect requests for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FxRequest {
    /// Keyed effect (explosion, shield flare, ...) with a spray angle.
    Effect { kind: &'static str, pos: Vec2, angle: f32 },
    /// Raw particle with initial velocity and lifetime.
    Particle { pos: Vec2, vel: Vec2, color: [f32; 3], life_s: f32, size: f32 },
}

/// Audio requests; `pan_x` is a world-space x for spatialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioRequest {
    pub key: &'static str,
    pub pan_x: Option<f32>,
}

/// Domain events consumed by score/UI/audio listeners. Destruction events
/// are emitted before the entity leaves the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    EnemyDestroyed { archetype: Archetype, pos: Vec2 },
    PlayerDamaged { amount: i32, hp_after: i32 },
    PlayerDestroyed,
    PanelDestroyed(PanelId),
    PanelRestored(PanelId),
    IntegrityChanged { percent: f32 },
    WaveLooped { loop_count: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drops_past_capacity() {
        let mut q = EventQueue::new(2);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(!q.push(3));
        assert_eq!(q.dropped(), 1);
        let got: Vec<i32> = q.drain().collect();
        assert_eq!(got, vec![1, 2]);
        assert!(q.is_empty());
        assert!(q.push(4));
    }
}
