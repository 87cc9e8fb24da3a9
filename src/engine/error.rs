//! Error types for world operations.
//!
//! This module declares the focused error types used across the entity,
//! component, query, prefab, and scheduler layers. Each error carries enough
//! context to make failures actionable while remaining small and cheap to
//! pass around or convert into the aggregate [`WorldError`].
//!
//! ## Typical flow
//! Low-level store operations return small, dedicated error types (e.g.
//! [`TypeMismatchError`]). Higher-level orchestration uses `?` to bubble
//! failures into [`WorldError`], which callers can match on for control flow
//! or log with user-readable messages.
//!
//! ## Silent no-ops
//! Not every boundary is an error. `destroy` and `remove` on a dead entity
//! are contractually no-ops, as is a re-entrant `flush`. With the world's
//! `debug` option enabled those boundaries emit `log::warn!` instead.

use std::any::TypeId;
use std::fmt;

use crate::engine::component::StoreKind;
use crate::engine::types::{ComponentID, Entity};

/// Returned when a value's dynamic type does not match the element type a
/// component store was registered with.
///
/// This is a logic error surfaced by typed access (e.g. writing a `Velocity`
/// payload into a component registered for `Position`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Component whose store rejected the value.
    pub component: ComponentID,

    /// Element type the store declares.
    pub expected: TypeId,

    /// Element type name the store declares.
    pub expected_name: &'static str,

    /// Dynamic type of the value provided by the caller.
    pub actual: TypeId,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type mismatch on component {}: store holds {}, got {:?}",
            self.component, self.expected_name, self.actual
        )
    }
}

impl std::error::Error for TypeMismatchError {}

/// Aggregate error for world operations.
///
/// Variants preserve the offending identifiers so diagnostics stay
/// actionable without reproducing the failure.
#[derive(Debug)]
pub enum WorldError {
    /// An entity handle was stale or referred to a destroyed entity.
    UnknownEntity {
        /// The offending handle.
        entity: Entity,
    },

    /// A component id was never registered with this world.
    UnknownComponent {
        /// The offending id.
        component: ComponentID,
    },

    /// A value-style operation hit a tag component, or a presence-style
    /// operation hit a value component.
    WrongKind {
        /// The offending component.
        component: ComponentID,
        /// The kind that component was registered with.
        kind: StoreKind,
    },

    /// A payload's dynamic type did not match the store's element type.
    TypeMismatch(TypeMismatchError),

    /// `add_system` was called with a name that is already registered.
    DuplicateSystem {
        /// The conflicting system name.
        name: String,
    },

    /// A system operation referenced a name that is not registered.
    UnknownSystem {
        /// The unknown system name.
        name: String,
    },

    /// `spawn_named` referenced a prefab name that is not registered.
    UnknownPrefab {
        /// The unknown prefab name.
        name: String,
    },

    /// Component registration exceeded the per-world capacity.
    CapacityExceeded {
        /// The configured component capacity.
        cap: usize,
    },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::UnknownEntity { entity } => {
                write!(f, "stale or dead entity reference: {entity}")
            }
            WorldError::UnknownComponent { component } => {
                write!(f, "component {component} is not registered")
            }
            WorldError::WrongKind { component, kind } => {
                write!(f, "operation not valid for {kind} component {component}")
            }
            WorldError::TypeMismatch(e) => write!(f, "{e}"),
            WorldError::DuplicateSystem { name } => {
                write!(f, "system name already registered: {name}")
            }
            WorldError::UnknownSystem { name } => {
                write!(f, "no system registered under name: {name}")
            }
            WorldError::UnknownPrefab { name } => {
                write!(f, "no prefab registered under name: {name}")
            }
            WorldError::CapacityExceeded { cap } => {
                write!(f, "component capacity reached ({cap})")
            }
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::TypeMismatch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TypeMismatchError> for WorldError {
    fn from(e: TypeMismatchError) -> Self {
        WorldError::TypeMismatch(e)
    }
}

/// Convenience alias used by every fallible world operation.
pub type WorldResult<T> = Result<T, WorldError>;
