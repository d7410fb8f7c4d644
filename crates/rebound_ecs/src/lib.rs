//! # rebound_ecs
//!
//! The "E" and "C" of the ECS runtime — entity identity and the authoritative
//! component store.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — monotonically increasing, engine-scoped ID allocator.
//! - [`Component`] trait — the contract all ECS data must satisfy.
//! - [`ComponentStore`] — the (entity, component type) → value mapping, with
//!   change events for filter maintenance.
//! - [`EcsError`] — storage-layer error types.

pub mod component;
pub mod entity;
pub mod error;
pub mod store;

pub use component::{Component, ComponentMeta, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use error::EcsError;
pub use store::{ComponentEvent, ComponentEventKind, ComponentStore};
