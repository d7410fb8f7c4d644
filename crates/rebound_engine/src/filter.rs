//! Standing filter/aspect queries with incrementally maintained caches.
//!
//! A [`FilterDescriptor`] declares which component types an entity must hold
//! (`all`), may hold at least one of (`any`), and must not hold (`none`). A
//! [`Filter`] pairs a descriptor with a cached, duplicate-free, ordered list
//! of matching entities.
//!
//! The cache is seeded with exactly one full scan when the filter is
//! registered. From then on it is maintained by **transition detection**:
//! each relevant [`ComponentEvent`] re-evaluates only the affected entity,
//! and the entity enters or leaves the cache only when its match status
//! actually flips. Consulting the cache is O(1) to obtain and O(k) to
//! iterate k matches — it never touches the full entity population.

use std::collections::HashSet;

use rebound_ecs::{Component, ComponentEvent, ComponentEventKind, ComponentStore, ComponentTypeId, Entity};

/// Declares the component-type interest of a filter or per-entity system.
///
/// An entity matches iff it holds every type in `all`, holds at least one
/// type in `any` (when `any` is non-empty), and holds no type in `none`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterDescriptor {
    /// Component types the entity must hold.
    pub all: Vec<ComponentTypeId>,
    /// Component types the entity must hold at least one of (ignored if empty).
    pub any: Vec<ComponentTypeId>,
    /// Component types the entity must not hold.
    pub none: Vec<ComponentTypeId>,
}

impl FilterDescriptor {
    /// Create a new empty descriptor (matches every live entity).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the given component type.
    #[must_use]
    pub fn all(mut self, type_id: ComponentTypeId) -> Self {
        self.all.push(type_id);
        self
    }

    /// Require at least one of the `any` types once this is non-empty.
    #[must_use]
    pub fn any(mut self, type_id: ComponentTypeId) -> Self {
        self.any.push(type_id);
        self
    }

    /// Exclude entities holding the given component type.
    #[must_use]
    pub fn none(mut self, type_id: ComponentTypeId) -> Self {
        self.none.push(type_id);
        self
    }

    /// Typed convenience for [`FilterDescriptor::all`].
    #[must_use]
    pub fn all_of<T: Component>(self) -> Self {
        let id = ComponentTypeId::of::<T>();
        self.all(id)
    }

    /// Typed convenience for [`FilterDescriptor::any`].
    #[must_use]
    pub fn any_of<T: Component>(self) -> Self {
        let id = ComponentTypeId::of::<T>();
        self.any(id)
    }

    /// Typed convenience for [`FilterDescriptor::none`].
    #[must_use]
    pub fn none_of<T: Component>(self) -> Self {
        let id = ComponentTypeId::of::<T>();
        self.none(id)
    }

    /// Returns `true` if the type participates in this query
    /// (member of `all` ∪ `any` ∪ `none`). Events for irrelevant types can
    /// never change membership and are skipped without touching the store.
    #[must_use]
    pub fn is_relevant(&self, type_id: ComponentTypeId) -> bool {
        self.all.contains(&type_id) || self.any.contains(&type_id) || self.none.contains(&type_id)
    }

    /// Evaluate the predicate against a holds-type probe.
    #[must_use]
    pub fn matches(&self, holds: impl Fn(ComponentTypeId) -> bool) -> bool {
        if !self.all.iter().all(|&id| holds(id)) {
            return false;
        }
        if !self.any.is_empty() && !self.any.iter().any(|&id| holds(id)) {
            return false;
        }
        self.none.iter().all(|&id| !holds(id))
    }

    /// Evaluate the predicate against a live entity in the store.
    ///
    /// A non-live entity never matches.
    #[must_use]
    pub fn matches_entity(&self, store: &ComponentStore, entity: Entity) -> bool {
        store.contains(entity) && self.matches(|id| store.has_type(entity, id))
    }
}

/// Identifies a registered [`Filter`] within one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(pub usize);

/// A standing query plus its incrementally maintained result cache.
///
/// Member order reflects the order entities most recently transitioned into
/// matching status; the seed scan orders by entity ID. The cache is always
/// duplicate-free.
#[derive(Debug)]
pub struct Filter {
    descriptor: FilterDescriptor,
    members: Vec<Entity>,
    index: HashSet<Entity>,
    full_scans: u64,
}

impl Filter {
    /// Create an unseeded filter for the given descriptor.
    #[must_use]
    pub fn new(descriptor: FilterDescriptor) -> Self {
        Self {
            descriptor,
            members: Vec::new(),
            index: HashSet::new(),
            full_scans: 0,
        }
    }

    /// Returns the descriptor this filter was built from.
    #[must_use]
    pub fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    /// Compute the initial matching set with one scan over the live entities.
    ///
    /// This is the only operation that visits the full entity population;
    /// [`Filter::full_scans`] counts how often it ran.
    pub fn seed(&mut self, store: &ComponentStore) {
        self.full_scans += 1;
        self.members.clear();
        self.index.clear();

        let mut matching: Vec<Entity> = store
            .entities()
            .filter(|&e| self.descriptor.matches(|id| store.has_type(e, id)))
            .collect();
        matching.sort();

        self.index.extend(matching.iter().copied());
        self.members = matching;
    }

    /// Apply a single component change, adjusting membership only when the
    /// affected entity's match status flipped.
    pub fn apply(&mut self, event: &ComponentEvent, store: &ComponentStore) {
        if !self.descriptor.is_relevant(event.type_id) {
            return;
        }
        // A replaced value leaves the held type set unchanged.
        if event.kind == ComponentEventKind::Replaced {
            return;
        }

        let now = self.descriptor.matches_entity(store, event.entity);
        let was = self.index.contains(&event.entity);
        if now == was {
            return;
        }
        if now {
            self.insert(event.entity);
        } else {
            self.forget(event.entity);
        }
    }

    /// Judge a freshly admitted entity once against its full bundle.
    ///
    /// This is the batch path for entity construction: the world attaches
    /// the whole initial bundle first, then each filter evaluates the entity
    /// exactly once, so partial membership is never observable.
    pub fn admit(&mut self, entity: Entity, store: &ComponentStore) {
        if !self.index.contains(&entity) && self.descriptor.matches_entity(store, entity) {
            self.insert(entity);
        }
    }

    /// Unconditionally drop an entity from the cache (entity destruction).
    pub fn forget(&mut self, entity: Entity) {
        if self.index.remove(&entity)
            && let Some(pos) = self.members.iter().position(|&e| e == entity)
        {
            self.members.remove(pos);
        }
    }

    /// The cached matching entities, in transition order.
    #[must_use]
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    /// Returns `true` if the entity is currently in the cache.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains(&entity)
    }

    /// Number of cached matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no entity matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// How many full entity scans this filter has performed. Stays at 1 for
    /// the whole life of a filter unless it is explicitly re-seeded.
    #[must_use]
    pub fn full_scans(&self) -> u64 {
        self.full_scans
    }

    fn insert(&mut self, entity: Entity) {
        self.index.insert(entity);
        self.members.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use rebound_ecs::Component;

    use super::*;

    #[derive(Debug, Clone, Copy, serde::Serialize)]
    struct A;
    #[derive(Debug, Clone, Copy, serde::Serialize)]
    struct B;
    #[derive(Debug, Clone, Copy, serde::Serialize)]
    struct C;

    impl Component for A {
        fn type_name() -> &'static str {
            "A"
        }
    }
    impl Component for B {
        fn type_name() -> &'static str {
            "B"
        }
    }
    impl Component for C {
        fn type_name() -> &'static str {
            "C"
        }
    }

    fn spawn(store: &mut ComponentStore, id: u64) -> Entity {
        let e = Entity::from_raw(id);
        store.insert_entity(e);
        e
    }

    #[test]
    fn test_descriptor_all_any_none() {
        let d = FilterDescriptor::new().all_of::<A>().any_of::<B>().none_of::<C>();

        let a = ComponentTypeId::of::<A>();
        let b = ComponentTypeId::of::<B>();
        let c = ComponentTypeId::of::<C>();

        // all + any satisfied, none absent.
        assert!(d.matches(|id| id == a || id == b));
        // missing `all`.
        assert!(!d.matches(|id| id == b));
        // missing every `any`.
        assert!(!d.matches(|id| id == a));
        // `none` held.
        assert!(!d.matches(|id| id == a || id == b || id == c));
    }

    #[test]
    fn test_empty_any_is_ignored() {
        let d = FilterDescriptor::new().all_of::<A>();
        let a = ComponentTypeId::of::<A>();
        assert!(d.matches(|id| id == a));
    }

    #[test]
    fn test_relevance() {
        let d = FilterDescriptor::new().all_of::<A>().none_of::<C>();
        assert!(d.is_relevant(ComponentTypeId::of::<A>()));
        assert!(d.is_relevant(ComponentTypeId::of::<C>()));
        assert!(!d.is_relevant(ComponentTypeId::of::<B>()));
    }

    #[test]
    fn test_seed_scans_once_and_sorts() {
        let mut store = ComponentStore::new();
        for id in [3, 1, 2] {
            let e = spawn(&mut store, id);
            store.set(e, A).unwrap();
        }

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);

        assert_eq!(filter.full_scans(), 1);
        assert_eq!(
            filter.members(),
            &[Entity::from_raw(1), Entity::from_raw(2), Entity::from_raw(3)]
        );
    }

    #[test]
    fn test_apply_detects_transition_in() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>().all_of::<B>());
        filter.seed(&store);
        assert!(filter.is_empty());

        let ev = store.set(e, A).unwrap();
        filter.apply(&ev, &store);
        assert!(!filter.contains(e), "A alone must not match");

        let ev = store.set(e, B).unwrap();
        filter.apply(&ev, &store);
        assert!(filter.contains(e));
        assert_eq!(filter.full_scans(), 1, "incremental update must not rescan");
    }

    #[test]
    fn test_apply_detects_transition_out() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);
        store.set(e, A).unwrap();

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);
        assert!(filter.contains(e));

        let ev = store.remove::<A>(e).unwrap().unwrap();
        filter.apply(&ev, &store);
        assert!(!filter.contains(e));
    }

    #[test]
    fn test_none_transition() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);
        store.set(e, A).unwrap();

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>().none_of::<C>());
        filter.seed(&store);
        assert!(filter.contains(e));

        // Attaching an excluded type expels the entity.
        let ev = store.set(e, C).unwrap();
        filter.apply(&ev, &store);
        assert!(!filter.contains(e));

        // Detaching it re-admits.
        let ev = store.remove::<C>(e).unwrap().unwrap();
        filter.apply(&ev, &store);
        assert!(filter.contains(e));
    }

    #[test]
    fn test_replaced_is_membership_neutral() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);
        store.set(e, A).unwrap();

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);

        let ev = store.set(e, A).unwrap();
        assert_eq!(ev.kind, ComponentEventKind::Replaced);
        filter.apply(&ev, &store);
        assert!(filter.contains(e));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_irrelevant_event_is_skipped() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);
        store.set(e, A).unwrap();

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);

        let ev = store.set(e, B).unwrap();
        filter.apply(&ev, &store);
        assert_eq!(filter.members(), &[e]);
    }

    #[test]
    fn test_forget_is_unconditional() {
        let mut store = ComponentStore::new();
        let e = spawn(&mut store, 1);
        store.set(e, A).unwrap();

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);
        filter.forget(e);
        assert!(filter.is_empty());
        // Forgetting an absent entity is a no-op.
        filter.forget(e);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_member_order_tracks_transition_order() {
        let mut store = ComponentStore::new();
        let e1 = spawn(&mut store, 1);
        let e2 = spawn(&mut store, 2);

        let mut filter = Filter::new(FilterDescriptor::new().all_of::<A>());
        filter.seed(&store);

        // e2 transitions in first, then e1.
        let ev = store.set(e2, A).unwrap();
        filter.apply(&ev, &store);
        let ev = store.set(e1, A).unwrap();
        filter.apply(&ev, &store);
        assert_eq!(filter.members(), &[e2, e1]);

        // e2 leaves and re-enters: it moves to the back.
        let ev = store.remove::<A>(e2).unwrap().unwrap();
        filter.apply(&ev, &store);
        let ev = store.set(e2, A).unwrap();
        filter.apply(&ev, &store);
        assert_eq!(filter.members(), &[e1, e2]);
    }
}
