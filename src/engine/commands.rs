//! Deferred command buffer.
//!
//! An append-only log of structural mutations, recorded while iteration or
//! deferred mode forbids applying them directly, and drained in insertion
//! order by `World::flush`.
//!
//! The queue is interior-mutable so `defer_*` calls compose with live query
//! iteration: enqueueing needs only `&World`. Draining pops from the front
//! while later commands (including ones appended by spawn callbacks during
//! the drain) keep arriving at the back and are consumed in the same pass.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::engine::error::WorldResult;
use crate::engine::types::{ComponentID, Entity};
use crate::engine::world::World;

/// Callback run when a deferred spawn record is consumed.
///
/// Receives the now-alive entity; further deferred commands enqueued inside
/// the callback are flushed in the same pass.
pub type SpawnCallback = Box<dyn FnOnce(&mut World, Entity) -> WorldResult<()>>;

/// One recorded mutation.
pub enum Command {
    /// Bring a reserved entity to life, then run the callback.
    Spawn {
        /// Handle reserved at enqueue time.
        entity: Entity,
        /// Optional post-spawn callback.
        callback: Option<SpawnCallback>,
    },
    /// Destroy an entity.
    Destroy {
        /// Target entity.
        entity: Entity,
    },
    /// Add a tag component.
    Add {
        /// Target entity.
        entity: Entity,
        /// Component to add.
        component: ComponentID,
    },
    /// Store a payload on a value component.
    Set {
        /// Target entity.
        entity: Entity,
        /// Component to write.
        component: ComponentID,
        /// Boxed payload.
        value: Box<dyn Any>,
    },
    /// Remove a component.
    Remove {
        /// Target entity.
        entity: Entity,
        /// Component to remove.
        component: ComponentID,
    },
    /// Insert or overwrite a relation triple.
    Relate {
        /// Edge source.
        source: Entity,
        /// Relation label.
        relation: ComponentID,
        /// Edge target.
        target: Entity,
        /// Optional edge payload.
        payload: Option<Box<dyn Any>>,
    },
    /// Remove a relation triple.
    Unrelate {
        /// Edge source.
        source: Entity,
        /// Relation label.
        relation: ComponentID,
        /// Edge target.
        target: Entity,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Spawn { entity, .. } => write!(f, "Spawn({entity})"),
            Command::Destroy { entity } => write!(f, "Destroy({entity})"),
            Command::Add { entity, component } => write!(f, "Add({entity}, c{component})"),
            Command::Set { entity, component, .. } => write!(f, "Set({entity}, c{component})"),
            Command::Remove { entity, component } => {
                write!(f, "Remove({entity}, c{component})")
            }
            Command::Relate { source, relation, target, .. } => {
                write!(f, "Relate({source}, c{relation}, {target})")
            }
            Command::Unrelate { source, relation, target } => {
                write!(f, "Unrelate({source}, c{relation}, {target})")
            }
        }
    }
}

/// Interior-mutable FIFO of recorded commands.
pub struct CommandBuffer {
    queue: RefCell<VecDeque<Command>>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { queue: RefCell::new(VecDeque::new()) }
    }

    /// Appends a command.
    pub fn push(&self, command: Command) {
        self.queue.borrow_mut().push_back(command);
    }

    /// Pops the oldest command, if any.
    ///
    /// The borrow is released before returning, so applying the popped
    /// command may enqueue freely.
    pub fn pop(&self) -> Option<Command> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns `true` if no command is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}
