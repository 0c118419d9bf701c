//! Uniform-grid broad phase for radius queries.
//!
//! Entities with a transform are bucketed by cell once per tick, before
//! collision and targeting consume the grid. Queries are conservative: they
//! return everything in the cell neighborhood covering the radius and never
//! miss an entity beyond that quantization.

use ecs_core::components::Transform;
use ecs_core::{Entity, Filter, Registry};
use glam::Vec2;
use std::collections::HashMap;

/// Fixed-capacity output buffer for grid queries. Overflow drops candidates
/// silently and counts them; callers size the buffer for the expected worst
/// case.
#[derive(Debug)]
pub struct QueryBuffer {
    items: Vec<Entity>,
    cap: usize,
    dropped: u64,
}

impl QueryBuffer {
    pub fn new(cap: usize) -> Self {
        Self { items: Vec::with_capacity(cap), cap, dropped: 0 }
    }

    #[inline]
    fn push(&mut self, e: Entity) {
        if self.items.len() < self.cap {
            self.items.push(e);
        } else {
            self.dropped += 1;
            metrics::counter!("sim.grid.dropped_total").increment(1);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.items
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[derive(Debug)]
pub struct SpatialGrid {
    cell: f32,
    buckets: HashMap<(i32, i32), Vec<Entity>>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(48.0)
    }
}

impl SpatialGrid {
    pub fn new(cell: f32) -> Self {
        Self { cell, buckets: HashMap::new() }
    }

    #[inline]
    fn key(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell).floor() as i32, (y / self.cell).floor() as i32)
    }

    /// Rebucket every live entity that has a transform. Bucket vectors are
    /// retained across ticks to avoid churn.
    pub fn rebuild(&mut self, ecs: &mut Registry) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        let filter = Filter::new().with::<Transform>();
        // Collect first: query borrows the registry immutably afterwards.
        let ents: Vec<Entity> = ecs.query(filter).to_vec();
        for e in ents {
            if let Some(tr) = ecs.get::<Transform>(e) {
                let key = self.key(tr.pos.x, tr.pos.y);
                self.buckets.entry(key).or_default().push(e);
            }
        }
    }

    /// Fill `out` with candidates in the cell neighborhood covering
    /// `radius` around `pos`. Conservative: no distance filtering.
    pub fn query(&self, pos: Vec2, radius: f32, out: &mut QueryBuffer) {
        out.clear();
        let reach = (radius / self.cell).ceil() as i32;
        let (cx, cy) = self.key(pos.x, pos.y);
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy)) {
                    for &e in bucket {
                        out.push(e);
                    }
                }
            }
        }
    }
}
