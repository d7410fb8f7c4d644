//! 2D position component.

use glam::Vec2;
use rebound_ecs::Component;
use serde::{Deserialize, Serialize};

/// A 2D world-space position.
///
/// This is the primary spatial component — nearly every visible entity will
/// have a `Position`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// World-space coordinates.
    pub point: Vec2,
}

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self { point: Vec2::ZERO };

    /// Create a position at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            point: Vec2::new(x, y),
        }
    }

    /// Returns a copy translated by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.point += offset;
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}
