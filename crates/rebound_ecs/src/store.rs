//! The authoritative component store.
//!
//! [`ComponentStore`] maps `(entity, component type)` to a component value.
//! Values are stored type-erased (one boxed slot per component) together
//! with their [`ComponentMeta`], so the store can be queried, mutated, and
//! snapshotted without knowing concrete types.
//!
//! Every mutation returns a [`ComponentEvent`] describing what changed. The
//! store has exactly one caller — the world — which forwards events to all
//! registered filters before its own mutating call returns. That keeps
//! filter caches consistent with the store at every observation point,
//! without the store knowing filters exist.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{Component, ComponentMeta, ComponentTypeId};
use crate::entity::Entity;
use crate::error::EcsError;

/// What kind of change a [`ComponentEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentEventKind {
    /// A component type the entity did not previously hold was attached.
    Added,
    /// An existing component value was overwritten (upsert on a held type).
    /// Membership-neutral for filters: the type was held before and after.
    Replaced,
    /// A component type the entity held was detached.
    Removed,
}

/// A change notification emitted by every store mutation.
#[derive(Debug, Clone, Copy)]
pub struct ComponentEvent {
    /// The entity whose component set changed.
    pub entity: Entity,
    /// The component type that was added, replaced, or removed.
    pub type_id: ComponentTypeId,
    /// The kind of change.
    pub kind: ComponentEventKind,
}

/// A single type-erased component value plus its metadata.
struct Slot {
    meta: ComponentMeta,
    value: Box<dyn Any + Send + Sync>,
}

/// One live entity's component set.
#[derive(Default)]
struct EntityRecord {
    components: HashMap<ComponentTypeId, Slot>,
}

/// Maps `(entity, component type)` to component values.
///
/// All operations are O(1) amortised per component type. The store tracks
/// only **live** entities; staged (under-construction) entities are the
/// world's concern and never appear here.
#[derive(Default)]
pub struct ComponentStore {
    records: HashMap<Entity, EntityRecord>,
}

impl ComponentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    // ── Entity slots ─────────────────────────────────────────────────

    /// Admit an entity into the live set with an empty component set.
    ///
    /// Returns `false` if the entity already has a slot.
    pub fn insert_entity(&mut self, entity: Entity) -> bool {
        if self.records.contains_key(&entity) {
            return false;
        }
        self.records.insert(entity, EntityRecord::default());
        true
    }

    /// Remove an entity and all of its components atomically.
    ///
    /// Returns one `Removed` event per held component type, ordered by
    /// type ID for determinism. The entity is unaddressable by the time the
    /// events are returned.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not live.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<Vec<ComponentEvent>, EcsError> {
        let record = self
            .records
            .remove(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let mut events: Vec<ComponentEvent> = record
            .components
            .keys()
            .map(|&type_id| ComponentEvent {
                entity,
                type_id,
                kind: ComponentEventKind::Removed,
            })
            .collect();
        events.sort_by_key(|ev| ev.type_id);
        Ok(events)
    }

    /// Returns `true` if the entity is in the live set.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entities are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns an iterator over all live entities (arbitrary order).
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records.keys().copied()
    }

    // ── Component operations ─────────────────────────────────────────

    /// Store or overwrite a component for an entity (upsert).
    ///
    /// Returns an `Added` event when the type was not previously held, a
    /// `Replaced` event when an existing value was overwritten.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not live.
    pub fn set<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<ComponentEvent, EcsError> {
        self.set_erased(entity, T::meta(), Box::new(value))
    }

    /// Type-erased upsert. Used by the world to admit staged entities whose
    /// initial bundle was buffered before the concrete types were visible.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not live.
    pub fn set_erased(
        &mut self,
        entity: Entity,
        meta: ComponentMeta,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<ComponentEvent, EcsError> {
        let record = self
            .records
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        let type_id = meta.type_id;
        let previous = record.components.insert(type_id, Slot { meta, value });
        Ok(ComponentEvent {
            entity,
            type_id,
            kind: if previous.is_some() {
                ComponentEventKind::Replaced
            } else {
                ComponentEventKind::Added
            },
        })
    }

    /// Get a shared reference to a component, or `None` if the entity does
    /// not hold that type (or is not live). Absence is an ordinary result,
    /// never a fault — systems must not assume a component exists unless it
    /// is in their filter's `all` set.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.records
            .get(&entity)?
            .components
            .get(&ComponentTypeId::of::<T>())?
            .value
            .downcast_ref::<T>()
    }

    /// Get a mutable reference to a component, or `None` if absent.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.records
            .get_mut(&entity)?
            .components
            .get_mut(&ComponentTypeId::of::<T>())?
            .value
            .downcast_mut::<T>()
    }

    /// Remove a component from an entity.
    ///
    /// Removing a type the entity does not hold is a no-op: `Ok(None)`, no
    /// event, no filter traffic.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not live.
    pub fn remove<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<ComponentEvent>, EcsError> {
        self.remove_type(entity, ComponentTypeId::of::<T>())
    }

    /// Remove a component by type ID. Same semantics as [`ComponentStore::remove`].
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownEntity`] if the entity is not live.
    pub fn remove_type(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Result<Option<ComponentEvent>, EcsError> {
        let record = self
            .records
            .get_mut(&entity)
            .ok_or(EcsError::UnknownEntity(entity))?;

        Ok(record.components.remove(&type_id).map(|_| ComponentEvent {
            entity,
            type_id,
            kind: ComponentEventKind::Removed,
        }))
    }

    /// Returns `true` if the entity is live and holds a component of type `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.has_type(entity, ComponentTypeId::of::<T>())
    }

    /// Returns `true` if the entity is live and holds the given component type.
    #[must_use]
    pub fn has_type(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.records
            .get(&entity)
            .is_some_and(|record| record.components.contains_key(&type_id))
    }

    /// Returns the component types held by an entity, sorted by type ID,
    /// or `None` if the entity is not live.
    #[must_use]
    pub fn type_ids(&self, entity: Entity) -> Option<Vec<ComponentTypeId>> {
        let record = self.records.get(&entity)?;
        let mut ids: Vec<ComponentTypeId> = record.components.keys().copied().collect();
        ids.sort();
        Some(ids)
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Render an entity's full component bundle as a JSON object keyed by
    /// component name. Returns `None` if the entity is not live.
    ///
    /// Intended for logging and inspection, not persistence.
    #[must_use]
    pub fn snapshot(&self, entity: Entity) -> Option<serde_json::Value> {
        let record = self.records.get(&entity)?;
        let mut object = serde_json::Map::new();
        let mut slots: Vec<&Slot> = record.components.values().collect();
        slots.sort_by_key(|slot| slot.meta.type_id);
        for slot in slots {
            object.insert(slot.meta.name.to_string(), (slot.meta.snapshot_fn)(&*slot.value));
        }
        Some(serde_json::Value::Object(object))
    }
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("entities", &self.records.len())
            .finish()
    }
}
