//! The engine — owner of the world and the priority-ordered system list,
//! and driver of the per-frame update pass.
//!
//! ## Ordering
//!
//! Systems run in ascending priority order; equal priorities keep their
//! attachment order. The order is identical every frame until the system
//! set changes.
//!
//! ## Re-entrancy
//!
//! [`Engine::run`] takes `&mut self` and systems are never handed the
//! engine itself, so a frame can never start while another is executing —
//! the single-threaded invariant is enforced at compile time rather than by
//! a runtime guard.

use tracing::{debug, info, warn};

use rebound_ecs::Entity;

use crate::error::EngineError;
use crate::filter::FilterId;
use crate::system::{Command, Frame, System};
use crate::world::World;

/// One attached system and its scheduling bookkeeping.
struct SystemSlot {
    /// Taken out (`None`) only while the system's own turn is executing.
    system: Option<Box<dyn System>>,
    name: &'static str,
    priority: i32,
    /// Filter registered for the per-entity shape, if declared.
    filter_id: Option<FilterId>,
    /// Set by a mid-frame detach request; the slot is skipped for the rest
    /// of the pass and removed when the pass completes.
    retired: bool,
}

/// Owns the entity set, component store (via [`World`]), and the ordered
/// system list; drives one frame per [`Engine::run`] call.
#[derive(Default)]
pub struct Engine {
    world: World,
    /// Sorted by `(priority, attachment order)` — stable.
    systems: Vec<SystemSlot>,
    frame_id: u64,
}

impl Engine {
    /// Create a new engine with an empty world and no systems.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            systems: Vec::new(),
            frame_id: 0,
        }
    }

    /// Read access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world (entity setup between frames).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Frames run so far.
    #[must_use]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Number of attached systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if a system with the given name is attached.
    #[must_use]
    pub fn has_system(&self, name: &str) -> bool {
        self.systems.iter().any(|slot| slot.name == name)
    }

    /// Attached system names in execution order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|slot| slot.name).collect()
    }

    /// Attach a system, registering its declared filter and firing
    /// [`System::on_attach`]. Insertion preserves ascending priority with
    /// stable ties.
    ///
    /// # Errors
    ///
    /// [`EngineError::DuplicateAttach`] if a system with the same name is
    /// already attached.
    pub fn attach(&mut self, mut system: Box<dyn System>) -> Result<(), EngineError> {
        let name = system.name();
        if self.has_system(name) {
            return Err(EngineError::DuplicateAttach(name.to_string()));
        }

        let priority = system.priority();
        let filter_id = system.filter().map(|d| self.world.register_filter(d));
        system.on_attach(&mut self.world);

        // First slot with a strictly greater priority; equal priorities stay
        // in attachment order.
        let index = self.systems.partition_point(|slot| slot.priority <= priority);
        self.systems.insert(
            index,
            SystemSlot {
                system: Some(system),
                name,
                priority,
                filter_id,
                retired: false,
            },
        );

        info!(system = name, priority, per_entity = filter_id.is_some(), "system attached");
        Ok(())
    }

    /// Detach a system by name, releasing its filter and firing
    /// [`System::on_detach`]. Returns the system box to the caller.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownSystem`] if no attached system has this name.
    pub fn detach(&mut self, name: &str) -> Result<Box<dyn System>, EngineError> {
        let index = self
            .systems
            .iter()
            .position(|slot| slot.name == name)
            .ok_or_else(|| EngineError::UnknownSystem(name.to_string()))?;

        let slot = self.systems.remove(index);
        Ok(self.release_slot(slot))
    }

    fn release_slot(&mut self, slot: SystemSlot) -> Box<dyn System> {
        if let Some(filter_id) = slot.filter_id {
            self.world.release_filter(filter_id);
        }
        // The box is always present outside a running turn.
        let mut system = slot
            .system
            .unwrap_or_else(|| unreachable!("system box missing outside its turn"));
        system.on_detach(&mut self.world);
        info!(system = slot.name, "system detached");
        system
    }

    /// Run one frame: invoke every attached system in priority order,
    /// passing the elapsed time `dt` in seconds.
    ///
    /// Per-entity systems iterate a snapshot of their filter's cached
    /// members taken at the start of their turn; membership changes they
    /// cause do not retroactively alter the in-progress iteration, and
    /// entities destroyed earlier in the same turn are skipped. Faulting
    /// callbacks are logged and contained.
    pub fn run(&mut self, dt: f64) {
        self.frame_id += 1;
        debug!(
            frame_id = self.frame_id,
            dt,
            systems = self.systems.len(),
            "frame start"
        );

        let mut commands: Vec<Command> = Vec::new();
        let mut turn = 0;
        while turn < self.systems.len() {
            if self.systems[turn].retired {
                turn += 1;
                continue;
            }
            let Some(mut system) = self.systems[turn].system.take() else {
                turn += 1;
                continue;
            };
            let name = self.systems[turn].name;
            let filter_id = self.systems[turn].filter_id;

            match filter_id {
                Some(filter_id) => {
                    // Snapshot at the start of this system's turn.
                    let members: Vec<Entity> = self
                        .world
                        .filter(filter_id)
                        .map(|f| f.members().to_vec())
                        .unwrap_or_default();

                    for entity in members {
                        // Destroyed by an earlier callback of this same turn.
                        if !self.world.contains(entity) {
                            continue;
                        }
                        let mut frame = Frame {
                            world: &mut self.world,
                            dt,
                            frame_id: self.frame_id,
                            commands: &mut commands,
                        };
                        if let Err(error) = system.process_entity(entity, &mut frame) {
                            warn!(system = name, %entity, %error, "entity callback fault contained");
                        }
                    }
                }
                None => {
                    let mut frame = Frame {
                        world: &mut self.world,
                        dt,
                        frame_id: self.frame_id,
                        commands: &mut commands,
                    };
                    if let Err(error) = system.process(&mut frame) {
                        warn!(system = name, %error, "system fault contained");
                    }
                }
            }

            self.systems[turn].system = Some(system);
            self.apply_commands(&mut commands);
            turn += 1;
        }

        // Remove slots retired during the pass.
        let mut index = 0;
        while index < self.systems.len() {
            if self.systems[index].retired {
                let slot = self.systems.remove(index);
                drop(self.release_slot(slot));
            } else {
                index += 1;
            }
        }
    }

    /// Mark detach requests; actual removal happens after the pass so the
    /// iteration in progress stays valid.
    fn apply_commands(&mut self, commands: &mut Vec<Command>) {
        for command in commands.drain(..) {
            match command {
                Command::DetachSystem(name) => {
                    match self.systems.iter_mut().find(|slot| slot.name == name) {
                        Some(slot) => slot.retired = true,
                        None => warn!(system = %name, "detach requested for unknown system"),
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("frame_id", &self.frame_id)
            .field("systems", &self.system_names())
            .field("world", &self.world)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records its name into a shared log every time it runs.
    struct Probe {
        name: &'static str,
        priority: i32,
        log: Rc<RefCell<Vec<&'static str>>>,
        attach_events: Rc<RefCell<Vec<String>>>,
    }

    impl Probe {
        fn boxed(
            name: &'static str,
            priority: i32,
            log: &Rc<RefCell<Vec<&'static str>>>,
            attach_events: &Rc<RefCell<Vec<String>>>,
        ) -> Box<dyn System> {
            Box::new(Self {
                name,
                priority,
                log: Rc::clone(log),
                attach_events: Rc::clone(attach_events),
            })
        }
    }

    impl System for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn on_attach(&mut self, _world: &mut World) {
            self.attach_events.borrow_mut().push(format!("+{}", self.name));
        }

        fn on_detach(&mut self, _world: &mut World) {
            self.attach_events.borrow_mut().push(format!("-{}", self.name));
        }

        fn process(&mut self, _frame: &mut Frame<'_>) -> anyhow::Result<()> {
            self.log.borrow_mut().push(self.name);
            Ok(())
        }
    }

    fn probe_fixture() -> (Rc<RefCell<Vec<&'static str>>>, Rc<RefCell<Vec<String>>>) {
        (Rc::new(RefCell::new(Vec::new())), Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn test_priority_order_executes_ascending() {
        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Probe::boxed("p3", 3, &log, &hooks)).unwrap();
        engine.attach(Probe::boxed("p1", 1, &log, &hooks)).unwrap();
        engine.attach(Probe::boxed("p2", 2, &log, &hooks)).unwrap();

        engine.run(1.0 / 60.0);
        assert_eq!(*log.borrow(), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_equal_priority_preserves_attachment_order() {
        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Probe::boxed("p3", 3, &log, &hooks)).unwrap();
        engine.attach(Probe::boxed("p1a", 1, &log, &hooks)).unwrap();
        engine.attach(Probe::boxed("p2", 2, &log, &hooks)).unwrap();
        // Late attach at priority 1 lands after the earlier priority-1 system.
        engine.attach(Probe::boxed("p1b", 1, &log, &hooks)).unwrap();

        engine.run(1.0 / 60.0);
        assert_eq!(*log.borrow(), vec!["p1a", "p1b", "p2", "p3"]);
    }

    #[test]
    fn test_duplicate_attach_rejected() {
        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Probe::boxed("dup", 0, &log, &hooks)).unwrap();
        let result = engine.attach(Probe::boxed("dup", 5, &log, &hooks));
        assert!(matches!(result, Err(EngineError::DuplicateAttach(n)) if n == "dup"));
        assert_eq!(engine.system_count(), 1);
    }

    #[test]
    fn test_detach_unknown_rejected() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.detach("ghost"),
            Err(EngineError::UnknownSystem(n)) if n == "ghost"
        ));
    }

    #[test]
    fn test_lifecycle_hooks_fire() {
        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Probe::boxed("sys", 0, &log, &hooks)).unwrap();
        let _ = engine.detach("sys").unwrap();
        assert_eq!(*hooks.borrow(), vec!["+sys", "-sys"]);
        assert!(!engine.has_system("sys"));
    }

    #[test]
    fn test_faulting_system_does_not_halt_frame() {
        struct Faulty;
        impl System for Faulty {
            fn name(&self) -> &'static str {
                "faulty"
            }
            fn priority(&self) -> i32 {
                0
            }
            fn process(&mut self, _frame: &mut Frame<'_>) -> anyhow::Result<()> {
                anyhow::bail!("deliberate fault")
            }
        }

        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Box::new(Faulty)).unwrap();
        engine.attach(Probe::boxed("after", 1, &log, &hooks)).unwrap();

        engine.run(1.0);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn test_mid_frame_detach_skips_remainder_of_pass() {
        /// Detaches the target system during its own turn.
        struct Detacher {
            target: &'static str,
        }
        impl System for Detacher {
            fn name(&self) -> &'static str {
                "detacher"
            }
            fn priority(&self) -> i32 {
                0
            }
            fn process(&mut self, frame: &mut Frame<'_>) -> anyhow::Result<()> {
                frame.detach_system(self.target);
                Ok(())
            }
        }

        let (log, hooks) = probe_fixture();
        let mut engine = Engine::new();
        engine.attach(Box::new(Detacher { target: "victim" })).unwrap();
        engine.attach(Probe::boxed("victim", 1, &log, &hooks)).unwrap();
        engine.attach(Probe::boxed("after", 2, &log, &hooks)).unwrap();

        engine.run(1.0);
        // The victim never ran this frame and is gone afterwards.
        assert_eq!(*log.borrow(), vec!["after"]);
        assert!(!engine.has_system("victim"));
        assert_eq!(*hooks.borrow(), vec!["+victim", "+after", "-victim"]);
    }

    #[test]
    fn test_frame_counter_advances() {
        let mut engine = Engine::new();
        assert_eq!(engine.frame_id(), 0);
        engine.run(0.016);
        engine.run(0.016);
        assert_eq!(engine.frame_id(), 2);
    }
}
