//! Phased system scheduling and execution.
//!
//! Systems are named callbacks grouped into a fixed sequence of phases.
//! Within a phase, systems run in insertion order; phases run in their
//! declared order. Execution is single-threaded and cooperative: a system
//! runs to completion before the next starts.
//!
//! ## Structural synchronization
//! Deferred commands are applied at phase boundaries: `step` flushes the
//! world's command buffer before each phase, so commands a system enqueues
//! are visible to every later phase of the same step.
//!
//! ## Access declarations
//! Each system declares the components it reads and writes. The scheduler
//! stores the declaration for diagnostics; it does not enforce it at
//! execution time.

use log::trace;

use crate::engine::error::{WorldError, WorldResult};
use crate::engine::types::SystemAccess;
use crate::engine::world::World;

/// Execution phases, in their fixed run order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the main update.
    PreUpdate,
    /// Main simulation update.
    Update,
    /// After the main update.
    PostUpdate,
    /// Before render extraction.
    PreRender,
    /// Render extraction.
    Render,
}

impl Phase {
    /// All phases in run order.
    pub const ORDER: [Phase; 5] = [
        Phase::PreUpdate,
        Phase::Update,
        Phase::PostUpdate,
        Phase::PreRender,
        Phase::Render,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::PreUpdate => "PreUpdate",
            Phase::Update => "Update",
            Phase::PostUpdate => "PostUpdate",
            Phase::PreRender => "PreRender",
            Phase::Render => "Render",
        })
    }
}

/// Callback type executed for a system each phase run.
pub type SystemFn = Box<dyn FnMut(&mut World, f32) -> WorldResult<()>>;

struct SystemSlot {
    name: String,
    phase: Phase,
    access: SystemAccess,
    enabled: bool,
    run: SystemFn,
}

/// Stores systems and executes them phase by phase against a world.
pub struct Scheduler {
    systems: Vec<SystemSlot>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self { systems: Vec::new() }
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Registers a system under a unique name.
    ///
    /// ## Errors
    /// `DuplicateSystem` if the name is taken.
    pub fn add_system(
        &mut self,
        name: &str,
        phase: Phase,
        access: SystemAccess,
        run: impl FnMut(&mut World, f32) -> WorldResult<()> + 'static,
    ) -> WorldResult<()> {
        if self.systems.iter().any(|s| s.name == name) {
            return Err(WorldError::DuplicateSystem { name: name.to_owned() });
        }
        self.systems.push(SystemSlot {
            name: name.to_owned(),
            phase,
            access,
            enabled: true,
            run: Box::new(run),
        });
        Ok(())
    }

    fn position(&self, name: &str) -> WorldResult<usize> {
        self.systems
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| WorldError::UnknownSystem { name: name.to_owned() })
    }

    /// Removes a system by name.
    pub fn remove_system(&mut self, name: &str) -> WorldResult<()> {
        let at = self.position(name)?;
        self.systems.remove(at);
        Ok(())
    }

    /// Enables a system by name.
    pub fn enable_system(&mut self, name: &str) -> WorldResult<()> {
        let at = self.position(name)?;
        self.systems[at].enabled = true;
        Ok(())
    }

    /// Disables a system by name; it stays registered but is skipped.
    pub fn disable_system(&mut self, name: &str) -> WorldResult<()> {
        let at = self.position(name)?;
        self.systems[at].enabled = false;
        Ok(())
    }

    /// Returns a system's enabled flag, if registered.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.systems.iter().find(|s| s.name == name).map(|s| s.enabled)
    }

    /// Declared access of a system, for diagnostics.
    pub fn access_of(&self, name: &str) -> Option<&SystemAccess> {
        self.systems.iter().find(|s| s.name == name).map(|s| &s.access)
    }

    /// Names of the systems registered for a phase, insertion order.
    pub fn systems_in(&self, phase: Phase) -> impl Iterator<Item = &str> {
        self.systems
            .iter()
            .filter(move |s| s.phase == phase)
            .map(|s| s.name.as_str())
    }

    /// Runs every enabled system of one phase, insertion order.
    ///
    /// A system error aborts the phase and propagates.
    pub fn run_phase(&mut self, world: &mut World, phase: Phase, dt: f32) -> WorldResult<()> {
        for slot in self.systems.iter_mut().filter(|s| s.phase == phase && s.enabled) {
            trace!("system {} ({phase})", slot.name);
            (slot.run)(world, dt)?;
        }
        Ok(())
    }

    /// Runs all phases in their fixed order, without flushing.
    pub fn run_systems(&mut self, world: &mut World, dt: f32) -> WorldResult<()> {
        for phase in Phase::ORDER {
            self.run_phase(world, phase, dt)?;
        }
        Ok(())
    }

    /// Advances the world one step.
    ///
    /// Flushes pending commands, then for each phase in order flushes again
    /// and runs the phase, so commands accumulated in one phase are visible
    /// to the next. With change tracking enabled, the change sets are
    /// cleared at the end of the step.
    pub fn step(&mut self, world: &mut World, dt: f32) -> WorldResult<()> {
        world.flush();
        for phase in Phase::ORDER {
            world.flush();
            self.run_phase(world, phase, dt)?;
        }
        if world.tracking_changes() {
            world.clear_changes();
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
