//! # rebound_math
//!
//! Math types for the rebound ECS runtime. Re-exports [`glam`] for linear
//! algebra and defines the spatial component kinds that implement
//! [`Component`](rebound_ecs::Component): [`Position`], [`Velocity`], and
//! [`Size`].

pub mod position;
pub mod size;
pub mod velocity;

// Re-export glam types for convenience.
pub use glam::Vec2;

pub use position::Position;
pub use size::Size;
pub use velocity::Velocity;
