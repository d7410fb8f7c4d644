//! # rebound_engine
//!
//! The runtime half of the rebound ECS: standing filter queries, the system
//! scheduler, and the frame loop.
//!
//! This crate provides:
//!
//! - [`FilterDescriptor`] / [`Filter`] — all/any/none queries with a live,
//!   incrementally maintained membership cache.
//! - [`World`] — the single authoritative owner of entities, components, and
//!   registered filters; every mutation is visible to every filter before
//!   the mutating call returns.
//! - [`System`] — per-frame behaviour with a priority and an optional
//!   declared filter (whole-frame or per-entity shape).
//! - [`Engine`] — priority-ordered scheduler driving one update pass per
//!   [`Engine::run`] call.
//! - [`FrameClock`] — fixed-timestep external driver.
//! - [`ResizeLatch`] — flag-plus-delta bridge for asynchronous window
//!   resize events.

pub mod clock;
pub mod engine;
pub mod error;
pub mod filter;
pub mod system;
pub mod viewport;
pub mod world;

pub use clock::{ClockConfig, FrameClock};
pub use engine::Engine;
pub use error::EngineError;
pub use filter::{Filter, FilterDescriptor, FilterId};
pub use system::{Frame, System};
pub use viewport::{PendingResize, ResizeHandle, ResizeLatch, Viewport};
pub use world::{EntityBuilder, World};
