//! 2D velocity component.

use glam::Vec2;
use rebound_ecs::Component;
use serde::{Deserialize, Serialize};

/// A 2D linear velocity in world units per second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    /// Linear velocity.
    pub linear: Vec2,
}

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Self = Self { linear: Vec2::ZERO };

    /// Create a velocity of `(x, y)` units per second.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            linear: Vec2::new(x, y),
        }
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_default() {
        assert_eq!(Velocity::default(), Velocity::ZERO);
    }

    #[test]
    fn test_new() {
        let v = Velocity::new(1.0, -2.0);
        assert_eq!(v.linear, Vec2::new(1.0, -2.0));
    }
}
