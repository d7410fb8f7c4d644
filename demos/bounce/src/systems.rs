//! The demo's systems: gravity, movement, wall bouncing, resize handling,
//! and a log-based painter.

use anyhow::Result;
use tracing::{debug, info};

use rebound_ecs::Entity;
use rebound_engine::{FilterDescriptor, Frame, ResizeLatch, System, Viewport};
use rebound_math::{Position, Size, Velocity};

/// Downward acceleration in world units per second squared.
const GRAVITY: f32 = 200.0;

/// Accelerates every moving entity downward.
pub struct GravitySystem;

impl System for GravitySystem {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn filter(&self) -> Option<FilterDescriptor> {
        Some(FilterDescriptor::new().all_of::<Velocity>())
    }

    fn process_entity(&mut self, entity: Entity, frame: &mut Frame<'_>) -> Result<()> {
        if let Some(velocity) = frame.world.get_mut::<Velocity>(entity) {
            velocity.linear.y += GRAVITY * frame.dt as f32;
        }
        Ok(())
    }
}

/// Integrates position by velocity.
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn filter(&self) -> Option<FilterDescriptor> {
        Some(FilterDescriptor::new().all_of::<Position>().all_of::<Velocity>())
    }

    fn process_entity(&mut self, entity: Entity, frame: &mut Frame<'_>) -> Result<()> {
        let velocity = *frame
            .world
            .get::<Velocity>(entity)
            .ok_or_else(|| anyhow::anyhow!("{entity} lost Velocity mid-turn"))?;
        if let Some(position) = frame.world.get_mut::<Position>(entity) {
            position.point += velocity.linear * frame.dt as f32;
        }
        Ok(())
    }
}

/// Bounces rectangles off the viewport edges: velocity reflects and the
/// position clamps so the rectangle stays fully inside the canvas.
pub struct BoundsSystem {
    pub viewport_entity: Entity,
}

impl System for BoundsSystem {
    fn name(&self) -> &'static str {
        "bounds"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn filter(&self) -> Option<FilterDescriptor> {
        Some(
            FilterDescriptor::new()
                .all_of::<Position>()
                .all_of::<Velocity>()
                .all_of::<Size>(),
        )
    }

    fn process_entity(&mut self, entity: Entity, frame: &mut Frame<'_>) -> Result<()> {
        let viewport = *frame
            .world
            .get::<Viewport>(self.viewport_entity)
            .ok_or_else(|| anyhow::anyhow!("viewport entity lost its component"))?;
        let size = *frame
            .world
            .get::<Size>(entity)
            .ok_or_else(|| anyhow::anyhow!("{entity} lost Size mid-turn"))?;
        let mut velocity = *frame
            .world
            .get::<Velocity>(entity)
            .ok_or_else(|| anyhow::anyhow!("{entity} lost Velocity mid-turn"))?;

        let mut bounced = false;
        if let Some(position) = frame.world.get_mut::<Position>(entity) {
            if position.point.x < 0.0 {
                position.point.x = 0.0;
                velocity.linear.x = velocity.linear.x.abs();
                bounced = true;
            }
            if position.point.x + size.width() > viewport.width {
                position.point.x = viewport.width - size.width();
                velocity.linear.x = -velocity.linear.x.abs();
                bounced = true;
            }
            if position.point.y < 0.0 {
                position.point.y = 0.0;
                velocity.linear.y = velocity.linear.y.abs();
                bounced = true;
            }
            if position.point.y + size.height() > viewport.height {
                position.point.y = viewport.height - size.height();
                velocity.linear.y = -velocity.linear.y.abs();
                bounced = true;
            }
        }
        if bounced {
            frame.world.set(entity, velocity)?;
            debug!(%entity, frame_id = frame.frame_id, "bounced");
        }
        Ok(())
    }
}

/// Applies pending window resizes to the viewport entity. Runs first so the
/// rest of the frame sees the new canvas extent.
pub struct ResizeSystem {
    pub viewport_entity: Entity,
    pub latch: ResizeLatch,
}

impl System for ResizeSystem {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn process(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        if let Some(pending) = self.latch.take() {
            info!(
                width = pending.width,
                height = pending.height,
                delta_width = pending.delta_width,
                delta_height = pending.delta_height,
                "viewport resized"
            );
            frame
                .world
                .set(self.viewport_entity, Viewport::new(pending.width, pending.height))?;
        }
        Ok(())
    }
}

/// Stand-in renderer: logs every visible rectangle. Runs last.
pub struct PaintSystem;

impl System for PaintSystem {
    fn name(&self) -> &'static str {
        "paint"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn filter(&self) -> Option<FilterDescriptor> {
        Some(FilterDescriptor::new().all_of::<Position>().all_of::<Size>())
    }

    fn process_entity(&mut self, entity: Entity, frame: &mut Frame<'_>) -> Result<()> {
        if let Some(bundle) = frame.world.snapshot(entity) {
            debug!(%entity, frame_id = frame.frame_id, %bundle, "paint");
        }
        Ok(())
    }
}
