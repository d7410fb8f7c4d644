//! World state — the single authoritative instance of entities, components,
//! and registered filters.
//!
//! The [`World`] routes every component mutation through the store and fans
//! the resulting [`ComponentEvent`] out to all registered filters before the
//! mutating call returns. Systems therefore never observe a filter cache
//! that lags behind the store.
//!
//! ## Entity construction
//!
//! A created entity starts **staged**: it has an identity and buffers its
//! initial component bundle, but is invisible to filters. [`World::admit`]
//! (or [`EntityBuilder::insert`]) moves it into the live set with the whole
//! bundle attached and lets each filter judge it exactly once — partial
//! bundles are never exposed mid-construction.

use std::any::Any;
use std::collections::HashMap;

use tracing::debug;

use rebound_ecs::{
    Component, ComponentEvent, ComponentMeta, ComponentStore, ComponentTypeId, EcsError, Entity,
    EntityAllocator,
};

use crate::filter::{Filter, FilterDescriptor, FilterId};

/// Buffered component bundle of a staged (not yet admitted) entity.
#[derive(Default)]
struct StagedRecord {
    components: HashMap<ComponentTypeId, (ComponentMeta, Box<dyn Any + Send + Sync>)>,
}

/// Owns the entity set, the component store, and every registered filter.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    store: ComponentStore,
    staged: HashMap<Entity, StagedRecord>,
    /// Filter slots; a released slot is `None` and may be reused.
    filters: Vec<Option<Filter>>,
}

impl World {
    /// Create a new empty world with a fresh ID sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            store: ComponentStore::new(),
            staged: HashMap::new(),
            filters: Vec::new(),
        }
    }

    // ── Entity lifecycle ─────────────────────────────────────────────

    /// Allocate a new entity in the staged state: it has a permanent
    /// identity but no filter will see it until [`World::admit`].
    pub fn create(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.staged.insert(entity, StagedRecord::default());
        entity
    }

    /// Start building an entity fluently; [`EntityBuilder::insert`] admits it.
    pub fn spawn(&mut self) -> EntityBuilder<'_> {
        let entity = self.create();
        EntityBuilder {
            world: self,
            entity,
        }
    }

    /// Move a staged entity into the live set with its full initial bundle
    /// attached, then let every filter evaluate it once.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not staged (already
    /// admitted, destroyed, or foreign).
    pub fn admit(&mut self, entity: Entity) -> Result<(), EcsError> {
        let record = self
            .staged
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;
        self.admit_record(entity, record);
        Ok(())
    }

    fn admit_record(&mut self, entity: Entity, record: StagedRecord) {
        self.store.insert_entity(entity);

        // Attach the buffered bundle in deterministic order. The per-component
        // events are deliberately dropped: filters judge the entity once below.
        let mut bundle: Vec<(ComponentMeta, Box<dyn Any + Send + Sync>)> =
            record.components.into_values().collect();
        bundle.sort_by_key(|(meta, _)| meta.type_id);
        let component_count = bundle.len();
        for (meta, value) in bundle {
            // The entity was inserted just above, so this cannot fail.
            let _ = self.store.set_erased(entity, meta, value);
        }

        let store = &self.store;
        for filter in self.filters.iter_mut().flatten() {
            filter.admit(entity, store);
        }

        debug!(%entity, components = component_count, "entity admitted");
    }

    /// Destroy an entity: all components are removed atomically and the
    /// entity is expelled from every filter cache before this returns.
    /// A staged entity is silently discarded (it was never visible).
    ///
    /// The identity is never reused.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is neither staged nor live.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        if self.staged.remove(&entity).is_some() {
            return Ok(());
        }
        let events = self.store.remove_entity(entity)?;
        for filter in self.filters.iter_mut().flatten() {
            filter.forget(entity);
        }
        debug!(%entity, components = events.len(), "entity destroyed");
        Ok(())
    }

    /// Returns `true` if the entity is live (admitted and not destroyed).
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    /// Returns `true` if the entity is staged (created but not admitted).
    #[must_use]
    pub fn is_staged(&self, entity: Entity) -> bool {
        self.staged.contains_key(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    /// Returns an iterator over all live entities (arbitrary order).
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.store.entities()
    }

    // ── Component operations ─────────────────────────────────────────

    /// Store or overwrite a component (upsert). On a live entity the change
    /// is visible to every filter before this returns; on a staged entity it
    /// is buffered into the initial bundle.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is neither staged nor live.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) -> Result<(), EcsError> {
        if let Some(record) = self.staged.get_mut(&entity) {
            let meta = T::meta();
            record.components.insert(meta.type_id, (meta, Box::new(value)));
            return Ok(());
        }
        let event = self.store.set(entity, value)?;
        self.fan_out(event);
        Ok(())
    }

    /// Get a shared reference to a component on a live or staged entity.
    /// Absence is `None`, never an error.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if let Some(value) = self.store.get::<T>(entity) {
            return Some(value);
        }
        self.staged
            .get(&entity)?
            .components
            .get(&ComponentTypeId::of::<T>())?
            .1
            .downcast_ref::<T>()
    }

    /// Get a mutable reference to a component on a live or staged entity.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if self.store.has::<T>(entity) {
            return self.store.get_mut::<T>(entity);
        }
        self.staged
            .get_mut(&entity)?
            .components
            .get_mut(&ComponentTypeId::of::<T>())?
            .1
            .downcast_mut::<T>()
    }

    /// Remove a component. Removing an absent type is a no-op and produces
    /// no filter traffic.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is neither staged nor live.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        if let Some(record) = self.staged.get_mut(&entity) {
            record.components.remove(&ComponentTypeId::of::<T>());
            return Ok(());
        }
        if let Some(event) = self.store.remove::<T>(entity)? {
            self.fan_out(event);
        }
        Ok(())
    }

    /// Returns `true` if the entity (live or staged) holds a component of type `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store.has::<T>(entity)
            || self
                .staged
                .get(&entity)
                .is_some_and(|r| r.components.contains_key(&ComponentTypeId::of::<T>()))
    }

    /// Render a live entity's component bundle as JSON for diagnostics.
    #[must_use]
    pub fn snapshot(&self, entity: Entity) -> Option<serde_json::Value> {
        self.store.snapshot(entity)
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    // ── Filters ──────────────────────────────────────────────────────

    /// Register a standing filter. The cache is seeded immediately with one
    /// full scan; afterwards it is maintained incrementally. Multiple
    /// filters update independently on every relevant mutation.
    pub fn register_filter(&mut self, descriptor: FilterDescriptor) -> FilterId {
        let mut filter = Filter::new(descriptor);
        filter.seed(&self.store);

        if let Some(idx) = self.filters.iter().position(Option::is_none) {
            self.filters[idx] = Some(filter);
            FilterId(idx)
        } else {
            self.filters.push(Some(filter));
            FilterId(self.filters.len() - 1)
        }
    }

    /// Release a registered filter; its slot may be reused.
    pub fn release_filter(&mut self, id: FilterId) {
        if let Some(slot) = self.filters.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Look up a registered filter.
    #[must_use]
    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(id.0)?.as_ref()
    }

    /// Forward one store event to every registered filter, synchronously.
    fn fan_out(&mut self, event: ComponentEvent) {
        let store = &self.store;
        for filter in self.filters.iter_mut().flatten() {
            filter.apply(&event, store);
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("live", &self.store.len())
            .field("staged", &self.staged.len())
            .field("filters", &self.filters.iter().flatten().count())
            .finish()
    }
}

/// Fluent construction of a staged entity; [`EntityBuilder::insert`] admits
/// it to the live set atomically with respect to filters.
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl EntityBuilder<'_> {
    /// Attach a component to the pending bundle.
    #[must_use]
    pub fn with<T: Component>(self, value: T) -> Self {
        // The entity is staged for the builder's whole lifetime, so this
        // buffers into the bundle and cannot fail.
        let meta = T::meta();
        if let Some(record) = self.world.staged.get_mut(&self.entity) {
            record.components.insert(meta.type_id, (meta, Box::new(value)));
        }
        self
    }

    /// The entity being built (already allocated, still staged).
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Admit the entity with its full bundle and return its handle.
    pub fn insert(self) -> Entity {
        let entity = self.entity;
        let record = self.world.staged.remove(&entity).unwrap_or_default();
        self.world.admit_record(entity, record);
        entity
    }
}
