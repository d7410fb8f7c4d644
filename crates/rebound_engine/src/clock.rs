//! Fixed-timestep frame clock.
//!
//! The clock is the external driver of the engine: it invokes
//! [`Engine::run`] exactly once per tick and never overlaps invocations,
//! which is how the no-concurrent-frames rule is upheld in practice.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::engine::Engine;

/// Configuration for the frame clock.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Target frames per second.
    pub frame_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_frames: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            max_frames: 0,
        }
    }
}

/// Blocking fixed-timestep loop driving an [`Engine`].
#[derive(Debug)]
pub struct FrameClock {
    config: ClockConfig,
}

impl FrameClock {
    /// Create a clock with the given configuration.
    #[must_use]
    pub fn new(config: ClockConfig) -> Self {
        Self { config }
    }

    /// Drive the engine for the configured number of frames, or
    /// indefinitely. Each frame gets the fixed timestep as its delta; when a
    /// frame exceeds its budget the next one starts immediately and the
    /// overrun is logged.
    pub fn run(&self, engine: &mut Engine) {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        let mut frames = 0u64;

        info!(
            frame_rate = self.config.frame_rate,
            max_frames = self.config.max_frames,
            "frame clock starting"
        );

        loop {
            let start = Instant::now();

            engine.run(frame_duration.as_secs_f64());

            frames += 1;
            if self.config.max_frames > 0 && frames >= self.config.max_frames {
                info!(frames, "frame clock complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            } else {
                warn!(
                    frame_id = engine.frame_id(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = frame_duration.as_millis() as u64,
                    "frame exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_limited_frames() {
        let config = ClockConfig {
            frame_rate: 1000.0, // fast for testing
            max_frames: 5,
        };
        let mut engine = Engine::new();
        FrameClock::new(config).run(&mut engine);
        assert_eq!(engine.frame_id(), 5);
    }

    #[test]
    fn test_default_config() {
        let config = ClockConfig::default();
        assert_eq!(config.frame_rate, 60.0);
        assert_eq!(config.max_frames, 0);
    }
}
