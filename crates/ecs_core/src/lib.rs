//! Entity registry with cached component/tag queries.
//!
//! Storage is a slot arena: each slot carries a generation counter, a tag
//! bitset and a component-presence bitset, with one column per component
//! type. Handles from destroyed-and-reused slots fail lookup instead of
//! aliasing the new occupant. Queries are cached per (component set, tag
//! set) descriptor and updated incrementally on every mutation, so systems
//! can call them every tick without rescanning the world.

pub mod components;
pub mod parse;

use components::{
    AiState, Collider, Health, Identity, Motion, Orbital, Ordnance, Target, Transform,
};

/// Entity handle: slot index plus generation. Copyable, cheap to compare,
/// invalid after the slot is despawned and reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    idx: u32,
    gen: u32,
}

impl Entity {
    #[inline]
    pub fn idx(&self) -> u32 {
        self.idx
    }
    #[inline]
    pub fn gen(&self) -> u32 {
        self.gen
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    gen: u32,
    alive: bool,
    tags: u32,
    comps: u32,
}

/// Query descriptor: all listed components required, and at least one of
/// `tags_any` when nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filter {
    comps: u32,
    tags_any: u32,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        self.comps |= C::BIT;
        self
    }

    #[must_use]
    pub fn any_tags(mut self, tags: u32) -> Self {
        self.tags_any |= tags;
        self
    }

    #[inline]
    fn matches(&self, comps: u32, tags: u32) -> bool {
        comps & self.comps == self.comps && (self.tags_any == 0 || tags & self.tags_any != 0)
    }
}

/// Per-type component column access. Implemented for every component in the
/// fixed catalog; not intended for downstream impls.
pub trait Component: Sized {
    const BIT: u32;
    #[doc(hidden)]
    fn col(cols: &Columns) -> &Vec<Option<Self>>;
    #[doc(hidden)]
    fn col_mut(cols: &mut Columns) -> &mut Vec<Option<Self>>;
}

macro_rules! component_columns {
    ( $( $field:ident : $ty:ty => $bit:expr ),+ $(,)? ) => {
        /// Component storage columns, one `Vec<Option<C>>` per type.
        #[derive(Default)]
        pub struct Columns {
            $( $field: Vec<Option<$ty>>, )+
        }

        impl Columns {
            fn grow_to(&mut self, n: usize) {
                $( if self.$field.len() < n { self.$field.resize_with(n, || None); } )+
            }
            fn clear_slot(&mut self, i: usize) {
                $( if let Some(v) = self.$field.get_mut(i) { *v = None; } )+
            }
        }

        $(
            impl Component for $ty {
                const BIT: u32 = $bit;
                fn col(cols: &Columns) -> &Vec<Option<Self>> { &cols.$field }
                fn col_mut(cols: &mut Columns) -> &mut Vec<Option<Self>> { &mut cols.$field }
            }
        )+
    };
}

component_columns! {
    transforms: Transform => 1 << 0,
    motions:    Motion    => 1 << 1,
    colliders:  Collider  => 1 << 2,
    healths:    Health    => 1 << 3,
    identities: Identity  => 1 << 4,
    ai_states:  AiState   => 1 << 5,
    targets:    Target    => 1 << 6,
    ordnances:  Ordnance  => 1 << 7,
    orbitals:   Orbital   => 1 << 8,
}

#[derive(Debug)]
struct CachedQuery {
    filter: Filter,
    ents: Vec<Entity>,
}

/// The registry. Exactly one exists per simulation; all systems mutate it
/// in strict tick order, so no interior locking is needed.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    alive: usize,
    cols: Columns,
    cache: Vec<CachedQuery>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.alive
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    /// Allocate a fresh entity carrying the given tag bits.
    pub fn spawn(&mut self, tags: u32) -> Entity {
        let idx = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.alive = true;
            slot.tags = tags;
            slot.comps = 0;
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot { gen: 0, alive: true, tags, comps: 0 });
            self.cols.grow_to(self.slots.len());
            idx
        };
        self.alive += 1;
        let e = Entity { idx, gen: self.slots[idx as usize].gen };
        self.touch(idx);
        e
    }

    /// Logically destroy an entity: clears components, drops it from every
    /// cached query and bumps the slot generation so stale handles fail.
    /// Despawning an already-dead or stale handle is a no-op.
    pub fn despawn(&mut self, e: Entity) -> bool {
        if !self.is_alive(e) {
            return false;
        }
        let i = e.idx as usize;
        self.cols.clear_slot(i);
        {
            let slot = &mut self.slots[i];
            slot.alive = false;
            slot.comps = 0;
            slot.tags = 0;
            slot.gen = slot.gen.wrapping_add(1);
        }
        self.alive -= 1;
        self.free.push(e.idx);
        self.touch(e.idx);
        true
    }

    #[inline]
    pub fn is_alive(&self, e: Entity) -> bool {
        self.slots
            .get(e.idx as usize)
            .map(|s| s.alive && s.gen == e.gen)
            .unwrap_or(false)
    }

    /// Tag bits, or 0 for dead/stale handles.
    #[inline]
    pub fn tags(&self, e: Entity) -> u32 {
        if self.is_alive(e) { self.slots[e.idx as usize].tags } else { 0 }
    }

    pub fn add_tags(&mut self, e: Entity, tags: u32) {
        if self.is_alive(e) {
            self.slots[e.idx as usize].tags |= tags;
            self.touch(e.idx);
        }
    }

    /// Attach or replace a component. No-op on dead/stale handles.
    pub fn insert<C: Component>(&mut self, e: Entity, c: C) -> bool {
        if !self.is_alive(e) {
            return false;
        }
        C::col_mut(&mut self.cols)[e.idx as usize] = Some(c);
        self.slots[e.idx as usize].comps |= C::BIT;
        self.touch(e.idx);
        true
    }

    pub fn remove<C: Component>(&mut self, e: Entity) -> Option<C> {
        if !self.is_alive(e) {
            return None;
        }
        let v = C::col_mut(&mut self.cols)[e.idx as usize].take()?;
        self.slots[e.idx as usize].comps &= !C::BIT;
        self.touch(e.idx);
        Some(v)
    }

    /// Component lookup; absent for dead/stale handles or missing
    /// components, never a panic.
    #[inline]
    pub fn get<C: Component>(&self, e: Entity) -> Option<&C> {
        if !self.is_alive(e) {
            return None;
        }
        C::col(&self.cols).get(e.idx as usize)?.as_ref()
    }

    #[inline]
    pub fn get_mut<C: Component>(&mut self, e: Entity) -> Option<&mut C> {
        if !self.is_alive(e) {
            return None;
        }
        C::col_mut(&mut self.cols).get_mut(e.idx as usize)?.as_mut()
    }

    /// Cached query. The first call with a new filter scans the world;
    /// afterwards the list is maintained incrementally and iterating it
    /// never yields a despawned entity. Entities are ordered by slot index.
    pub fn query(&mut self, filter: Filter) -> &[Entity] {
        if let Some(i) = self.cache.iter().position(|c| c.filter == filter) {
            return &self.cache[i].ents;
        }
        let mut ents = Vec::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.alive && filter.matches(slot.comps, slot.tags) {
                ents.push(Entity { idx: idx as u32, gen: slot.gen });
            }
        }
        let i = self.cache.len();
        self.cache.push(CachedQuery { filter, ents });
        &self.cache[i].ents
    }

    /// Copy the current query result into `out` (cleared first). Handy when
    /// the caller mutates the registry while walking the result.
    pub fn collect(&mut self, filter: Filter, out: &mut Vec<Entity>) {
        out.clear();
        out.extend_from_slice(self.query(filter));
    }

    /// Re-evaluate cached query membership for one slot.
    fn touch(&mut self, idx: u32) {
        let slot = self.slots[idx as usize];
        let e = Entity { idx, gen: slot.gen };
        for q in &mut self.cache {
            let matched = slot.alive && q.filter.matches(slot.comps, slot.tags);
            match q.ents.binary_search_by_key(&idx, |e| e.idx) {
                Ok(p) => {
                    if matched {
                        q.ents[p] = e;
                    } else {
                        q.ents.remove(p);
                    }
                }
                Err(p) => {
                    if matched {
                        q.ents.insert(p, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::components::{tag, Health, Transform};
    use super::*;
    use glam::Vec2;

    #[test]
    fn stale_handle_fails_lookup_after_reuse() {
        let mut reg = Registry::new();
        let a = reg.spawn(tag::ENEMY);
        reg.insert(a, Health::full(10));
        assert!(reg.despawn(a));
        // Slot is reused by a fresh entity with a bumped generation.
        let b = reg.spawn(tag::ENEMY);
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a.gen(), b.gen());
        assert!(!reg.is_alive(a));
        assert!(reg.get::<Health>(a).is_none());
        assert!(!reg.despawn(a));
        assert!(reg.is_alive(b));
    }

    #[test]
    fn query_cache_tracks_insert_remove_despawn() {
        let mut reg = Registry::new();
        let f = Filter::new().with::<Transform>().with::<Health>();
        assert!(reg.query(f).is_empty());

        let a = reg.spawn(tag::ENEMY);
        reg.insert(a, Transform::at(Vec2::ZERO));
        assert!(reg.query(f).is_empty(), "missing Health must exclude");
        reg.insert(a, Health::full(5));
        assert_eq!(reg.query(f), &[a]);

        let b = reg.spawn(tag::ENEMY);
        reg.insert(b, Transform::at(Vec2::ONE));
        reg.insert(b, Health::full(5));
        assert_eq!(reg.query(f).len(), 2);

        reg.remove::<Health>(a);
        assert_eq!(reg.query(f), &[b]);

        reg.despawn(b);
        assert!(reg.query(f).is_empty());
    }

    #[test]
    fn tag_filter_matches_any_of() {
        let mut reg = Registry::new();
        let e = reg.spawn(tag::ENEMY);
        let p = reg.spawn(tag::PLAYER);
        let _w = reg.spawn(tag::WORLD);
        let f = Filter::new().any_tags(tag::ENEMY | tag::PLAYER);
        let got: Vec<Entity> = reg.query(f).to_vec();
        assert_eq!(got, vec![e, p]);
    }

    #[test]
    fn query_never_yields_despawned_entities() {
        let mut reg = Registry::new();
        let f = Filter::new().any_tags(tag::ENEMY);
        let mut spawned = Vec::new();
        for _ in 0..16 {
            spawned.push(reg.spawn(tag::ENEMY));
        }
        for e in spawned.iter().step_by(2) {
            reg.despawn(*e);
        }
        for e in reg.query(f) {
            assert!(spawned.iter().step_by(2).all(|d| d != e));
        }
        assert_eq!(reg.query(f).len(), 8);
        assert_eq!(reg.len(), 8);
    }

    #[test]
    fn insert_on_dead_entity_is_ignored() {
        let mut reg = Registry::new();
        let a = reg.spawn(0);
        reg.despawn(a);
        assert!(!reg.insert(a, Health::full(1)));
        assert!(reg.get_mut::<Health>(a).is_none());
    }
}
