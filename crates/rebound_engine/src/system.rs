//! The [`System`] trait and the per-frame [`Frame`] context.
//!
//! A system is a unit of per-frame behaviour with a priority and an optional
//! declared component-type interest. One trait covers both processing
//! shapes:
//!
//! - **whole-frame**: [`System::filter`] returns `None`; the engine calls
//!   [`System::process`] once per frame and the system manages its own
//!   queries.
//! - **per-entity**: [`System::filter`] returns a descriptor; the engine
//!   registers it, snapshots the cached members at the start of the
//!   system's turn, and calls [`System::process_entity`] once per member.
//!
//! Callbacks return [`anyhow::Result`] so a faulting system can report an
//! arbitrary error; the engine logs contained faults and keeps the frame
//! going.

use anyhow::Result;
use rebound_ecs::Entity;

use crate::filter::FilterDescriptor;
use crate::world::World;

/// Deferred structural change requested from inside a system callback,
/// applied by the engine at a safe point in the pass.
#[derive(Debug)]
pub(crate) enum Command {
    /// Detach the named system; it stops receiving invocations immediately.
    DetachSystem(String),
}

/// Context handed to a system for one turn of one frame.
pub struct Frame<'a> {
    /// The authoritative world. Mutations are visible to filters before the
    /// mutating call returns.
    pub world: &'a mut World,
    /// Elapsed time covered by this frame, in seconds.
    pub dt: f64,
    /// Monotonic frame counter (first frame is 1).
    pub frame_id: u64,
    pub(crate) commands: &'a mut Vec<Command>,
}

impl Frame<'_> {
    /// Request that the named system be detached. Safe to call mid-frame;
    /// the target is skipped for the remainder of the current pass and
    /// detached once the pass completes.
    pub fn detach_system(&mut self, name: impl Into<String>) {
        self.commands.push(Command::DetachSystem(name.into()));
    }
}

impl std::fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("dt", &self.dt)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

/// A unit of per-frame behaviour.
///
/// Execution is single-threaded and cooperative: the engine invokes attached
/// systems in ascending [`System::priority`] order (ties broken by
/// attachment order), once per frame.
pub trait System {
    /// Unique name within one engine; used for logging, duplicate-attach
    /// detection, and deferred detach requests.
    fn name(&self) -> &'static str;

    /// Scheduling priority; lower runs first. Defaults to 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Declared component interest. `Some` selects the per-entity shape:
    /// the engine maintains a filter cache for the descriptor and feeds the
    /// system one matching entity at a time.
    fn filter(&self) -> Option<FilterDescriptor> {
        None
    }

    /// Called once when the system is attached to an engine.
    fn on_attach(&mut self, _world: &mut World) {}

    /// Called once when the system is detached from an engine.
    fn on_detach(&mut self, _world: &mut World) {}

    /// Whole-frame entry point; called once per frame for systems without a
    /// declared filter.
    ///
    /// # Errors
    ///
    /// A returned error is logged and contained; the frame continues with
    /// the next system.
    fn process(&mut self, _frame: &mut Frame<'_>) -> Result<()> {
        Ok(())
    }

    /// Per-entity entry point; called once per cached filter member for
    /// systems with a declared filter.
    ///
    /// # Errors
    ///
    /// A returned error is logged and contained; iteration continues with
    /// the remaining entities.
    fn process_entity(&mut self, _entity: Entity, _frame: &mut Frame<'_>) -> Result<()> {
        Ok(())
    }
}
