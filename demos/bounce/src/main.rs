//! # bounce — bouncing rectangles demo
//!
//! A handful of rectangles fall under gravity inside a resizable canvas,
//! bouncing off its edges. A background thread plays the role of the host
//! window and shrinks the canvas partway through the run; the resize
//! reaches the simulation through the latch, never directly.
//!
//! Run with `RUST_LOG=bounce=debug,rebound_engine=info` for per-frame
//! detail.

mod systems;

use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rebound_engine::{ClockConfig, Engine, FrameClock, ResizeLatch, Viewport};
use rebound_math::{Position, Size, Velocity};

use systems::{BoundsSystem, GravitySystem, MovementSystem, PaintSystem, ResizeSystem};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bounce=info".parse()?))
        .init();

    info!("bounce demo starting");

    let mut engine = Engine::new();

    let viewport_entity = engine
        .world_mut()
        .spawn()
        .with(Viewport::new(800.0, 600.0))
        .insert();

    for (x, y, vx, side) in [
        (100.0, 50.0, 40.0, 20.0),
        (300.0, 120.0, -25.0, 30.0),
        (500.0, 80.0, 60.0, 15.0),
        (650.0, 200.0, -50.0, 25.0),
    ] {
        engine
            .world_mut()
            .spawn()
            .with(Position::new(x, y))
            .with(Velocity::new(vx, 0.0))
            .with(Size::new(side, side))
            .insert();
    }

    let latch = ResizeLatch::new();
    let resize_handle = latch.handle();

    // Attachment order is deliberately not the execution order; the
    // scheduler sorts by priority.
    engine.attach(Box::new(PaintSystem))?;
    engine.attach(Box::new(BoundsSystem { viewport_entity }))?;
    engine.attach(Box::new(ResizeSystem {
        viewport_entity,
        latch,
    }))?;
    engine.attach(Box::new(MovementSystem))?;
    engine.attach(Box::new(GravitySystem))?;

    // Host-window stand-in: shrink the canvas after half a second.
    let window = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(500));
        resize_handle.notify(640.0, 480.0);
        std::thread::sleep(Duration::from_millis(100));
        resize_handle.notify(400.0, 300.0);
    });

    let clock = FrameClock::new(ClockConfig {
        frame_rate: 60.0,
        max_frames: 120, // two seconds
    });
    clock.run(&mut engine);

    window.join().map_err(|_| anyhow::anyhow!("window thread panicked"))?;

    info!(
        frames = engine.frame_id(),
        entities = engine.world().entity_count(),
        "bounce demo finished"
    );
    Ok(())
}
