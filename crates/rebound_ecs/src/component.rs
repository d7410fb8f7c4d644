//! Core [`Component`] trait and associated metadata.
//!
//! Every piece of data stored in the ECS must implement [`Component`]. The
//! trait requires `Send + Sync + 'static` so component values can cross the
//! one asynchronous boundary in the runtime (the resize latch handle), and
//! `Serialize` so the store can render diagnostic snapshots.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. The ID is deterministic across runs and
//! builds, which makes it a stable storage key and keeps log output readable
//! when correlated with component names.

use std::any::Any;

use serde::Serialize;

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
///
/// The ID is deterministic: hashing the same UTF-8 name bytes always
/// produces the same `ComponentTypeId`, in any build, on any platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name using
    /// the FNV-1a 64-bit hash algorithm.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    ///
    /// This calls `T::type_name()` and hashes it with FNV-1a, producing the
    /// same result as [`ComponentTypeId::from_name`] with the same string.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// Metadata about a component type, used by the type-erased store.
#[derive(Clone)]
pub struct ComponentMeta {
    /// The unique type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component (e.g. `"Position"`).
    pub name: &'static str,
    /// Render a type-erased slot to a JSON value for diagnostics.
    pub snapshot_fn: fn(&(dyn Any + Send + Sync)) -> serde_json::Value,
}

impl std::fmt::Debug for ComponentMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMeta")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .finish()
    }
}

/// The core component trait.
///
/// A component is a plain data record with no identity of its own; identity
/// is the (entity, type) pair held by the store. At most one value per type
/// may be attached to an entity.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use rebound_ecs::Component;
///
/// #[derive(Debug, Clone, Copy, Serialize)]
/// struct Lifetime {
///     remaining: f32,
/// }
///
/// impl Component for Lifetime {
///     fn type_name() -> &'static str { "Lifetime" }
/// }
/// ```
pub trait Component: Send + Sync + 'static + Serialize {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    ///
    /// The default implementation hashes [`Component::type_name()`] with
    /// FNV-1a 64-bit.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }

    /// Returns the [`ComponentMeta`] descriptor for this component type.
    fn meta() -> ComponentMeta
    where
        Self: Sized,
    {
        ComponentMeta {
            type_id: Self::component_type_id(),
            name: Self::type_name(),
            snapshot_fn: |slot| match slot.downcast_ref::<Self>() {
                Some(value) => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                None => serde_json::Value::Null,
            },
        }
    }
}
