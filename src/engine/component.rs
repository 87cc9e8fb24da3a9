//! Component registry.
//!
//! Assigns compact, stable [`ComponentID`] values to registered component
//! types and records per-component metadata used for validation and
//! diagnostics.
//!
//! ## Design
//! - Ids are allocated sequentially in `[0, COMPONENT_CAP)` and are
//!   immutable for the life of the world.
//! - Each id carries a [`ComponentDesc`]: storage kind, payload type info,
//!   and an optional default-producer closure, exposed as metadata for
//!   embedder tooling.
//! - The registry is world-local. Two worlds may assign the same id to
//!   different types; ids never travel between worlds.
//!
//! ## Invariants
//! - `descriptors[id]` exists for every allocated id.
//! - A descriptor's `type_id` is `Some` exactly when the kind carries a
//!   payload (sparse or dense).

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::engine::error::{WorldError, WorldResult};
use crate::engine::types::{ComponentID, COMPONENT_CAP};

/// Producer of a boxed default payload for a component.
pub type DefaultProducer = Rc<dyn Fn() -> Box<dyn Any>>;

/// Storage kind of a registered component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// Entity-indexed mapping to arbitrary payloads.
    Sparse,
    /// Reserved packed layout; currently backed by sparse storage.
    Dense,
    /// Presence-only set, no payload.
    Tag,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Sparse => "sparse",
            StoreKind::Dense => "dense",
            StoreKind::Tag => "tag",
        })
    }
}

/// Describes a registered component.
#[derive(Clone)]
pub struct ComponentDesc {
    /// Runtime identifier assigned by the registry.
    pub component: ComponentID,

    /// Storage kind registered for this component.
    pub kind: StoreKind,

    /// Payload type name for diagnostics; `"(tag)"` for tags.
    pub name: &'static str,

    /// Payload `TypeId`; `None` for tags.
    pub type_id: Option<TypeId>,

    /// Optional producer of a default payload.
    pub default: Option<DefaultProducer>,
}

impl ComponentDesc {
    /// Constructs a descriptor for a payload-bearing component of type `T`.
    pub fn of<T: 'static>(component: ComponentID, kind: StoreKind) -> Self {
        Self {
            component,
            kind,
            name: type_name::<T>(),
            type_id: Some(TypeId::of::<T>()),
            default: None,
        }
    }

    /// Constructs a descriptor for a tag component.
    pub fn tag(component: ComponentID) -> Self {
        Self {
            component,
            kind: StoreKind::Tag,
            name: "(tag)",
            type_id: None,
            default: None,
        }
    }

    /// Returns a copy of this descriptor with a default-producer installed.
    pub fn with_default(mut self, producer: DefaultProducer) -> Self {
        self.default = Some(producer);
        self
    }
}

impl fmt::Debug for ComponentDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDesc")
            .field("component", &self.component)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

/// World-local mapping from component ids to descriptors.
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDesc>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { descriptors: Vec::new() }
    }

    /// Allocates the next id and records `make(id)` as its descriptor.
    ///
    /// ## Errors
    /// `CapacityExceeded` once `COMPONENT_CAP` ids exist.
    pub fn register(
        &mut self,
        make: impl FnOnce(ComponentID) -> ComponentDesc,
    ) -> WorldResult<ComponentID> {
        let id = self.descriptors.len();
        if id >= COMPONENT_CAP {
            return Err(WorldError::CapacityExceeded { cap: COMPONENT_CAP });
        }
        let id = id as ComponentID;
        self.descriptors.push(make(id));
        Ok(id)
    }

    /// Returns the descriptor for `component`, if registered.
    pub fn descriptor(&self, component: ComponentID) -> Option<&ComponentDesc> {
        self.descriptors.get(component as usize)
    }

    /// Returns the descriptor for `component` or `UnknownComponent`.
    pub fn require(&self, component: ComponentID) -> WorldResult<&ComponentDesc> {
        self.descriptor(component)
            .ok_or(WorldError::UnknownComponent { component })
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates over all descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDesc> {
        self.descriptors.iter()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
