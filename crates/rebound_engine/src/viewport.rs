//! Canvas size and the asynchronous resize latch.
//!
//! Window resize notifications arrive outside the frame loop (typically on
//! another thread). The latch decouples that event source from the
//! synchronous per-frame model: the asynchronous side only records a
//! flag-plus-delta record behind a mutex, and a scheduled system consumes
//! it on its next `process` call. Nothing else crosses threads.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use rebound_ecs::Component;

/// The current canvas extent.
///
/// Also a [`Component`], so a world-singleton entity can carry it and every
/// system reads it through the ordinary store contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    /// Canvas width in world units.
    pub width: f32,
    /// Canvas height in world units.
    pub height: f32,
}

impl Viewport {
    /// Create a viewport of `width` × `height`.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Component for Viewport {
    fn type_name() -> &'static str {
        "Viewport"
    }
}

/// The coalesced record of resize notifications since the last consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingResize {
    /// Latest notified width.
    pub width: f32,
    /// Latest notified height.
    pub height: f32,
    /// Width change accumulated across all notifications since the last take.
    pub delta_width: f32,
    /// Height change accumulated across all notifications since the last take.
    pub delta_height: f32,
}

#[derive(Debug, Default)]
struct LatchState {
    /// Last extent ever notified, kept across takes so deltas stay correct.
    last_seen: Option<(f32, f32)>,
    pending: Option<PendingResize>,
}

/// Thread-safe flag-plus-delta latch for window resize events.
///
/// The simulation side owns the latch and calls [`ResizeLatch::take`] once
/// per scheduled pass; the window side holds cloned [`ResizeHandle`]s and
/// may call [`ResizeHandle::notify`] from any thread at any time.
#[derive(Debug, Default)]
pub struct ResizeLatch {
    shared: Arc<Mutex<LatchState>>,
}

impl ResizeLatch {
    /// Create an empty latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cloneable handle for the asynchronous notifier side.
    #[must_use]
    pub fn handle(&self) -> ResizeHandle {
        ResizeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Consume the pending record, if any. Called synchronously from the
    /// scheduled resize system; never blocks for long (the notifier only
    /// holds the lock to write two floats).
    #[must_use]
    pub fn take(&self) -> Option<PendingResize> {
        self.shared.lock().pending.take()
    }
}

/// Notifier handle held by the host window callback.
#[derive(Debug, Clone)]
pub struct ResizeHandle {
    shared: Arc<Mutex<LatchState>>,
}

impl ResizeHandle {
    /// Record a resize to `width` × `height`. Successive notifications
    /// between two takes coalesce: the latest extent wins and the deltas
    /// accumulate.
    pub fn notify(&self, width: f32, height: f32) {
        let mut state = self.shared.lock();
        let (dw, dh) = match state.last_seen {
            Some((w, h)) => (width - w, height - h),
            None => (0.0, 0.0),
        };
        state.last_seen = Some((width, height));
        state.pending = Some(match state.pending {
            Some(p) => PendingResize {
                width,
                height,
                delta_width: p.delta_width + dw,
                delta_height: p.delta_height + dh,
            },
            None => PendingResize {
                width,
                height,
                delta_width: dw,
                delta_height: dh,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_latch_takes_nothing() {
        let latch = ResizeLatch::new();
        assert!(latch.take().is_none());
    }

    #[test]
    fn test_single_notify() {
        let latch = ResizeLatch::new();
        latch.handle().notify(800.0, 600.0);

        let pending = latch.take().unwrap();
        assert_eq!(pending.width, 800.0);
        assert_eq!(pending.height, 600.0);
        // First notification has no baseline, so no delta.
        assert_eq!(pending.delta_width, 0.0);
        assert_eq!(pending.delta_height, 0.0);
        assert!(latch.take().is_none(), "take consumes the record");
    }

    #[test]
    fn test_notifications_coalesce() {
        let latch = ResizeLatch::new();
        let handle = latch.handle();
        handle.notify(800.0, 600.0);
        handle.notify(820.0, 580.0);
        handle.notify(850.0, 590.0);

        let pending = latch.take().unwrap();
        assert_eq!(pending.width, 850.0);
        assert_eq!(pending.height, 590.0);
        assert_eq!(pending.delta_width, 50.0);
        assert_eq!(pending.delta_height, -10.0);
    }

    #[test]
    fn test_delta_baseline_survives_take() {
        let latch = ResizeLatch::new();
        let handle = latch.handle();
        handle.notify(800.0, 600.0);
        let _ = latch.take();

        handle.notify(900.0, 600.0);
        let pending = latch.take().unwrap();
        assert_eq!(pending.delta_width, 100.0);
        assert_eq!(pending.delta_height, 0.0);
    }

    #[test]
    fn test_notify_from_other_thread() {
        let latch = ResizeLatch::new();
        let handle = latch.handle();
        std::thread::spawn(move || handle.notify(640.0, 480.0))
            .join()
            .unwrap();
        assert_eq!(latch.take().unwrap().width, 640.0);
    }
}
