//! 2D extent component.

use glam::Vec2;
use rebound_ecs::Component;
use serde::{Deserialize, Serialize};

/// A 2D extent (width × height) for rectangular entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Size {
    /// Width and height.
    pub extent: Vec2,
}

impl Size {
    /// Create a size of `width` × `height`.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            extent: Vec2::new(width, height),
        }
    }

    /// Returns the width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.extent.x
    }

    /// Returns the height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.extent.y
    }
}

impl Component for Size {
    fn type_name() -> &'static str {
        "Size"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let s = Size::new(5.0, 10.0);
        assert_eq!(s.width(), 5.0);
        assert_eq!(s.height(), 10.0);
    }
}
