//! Prefab templates.
//!
//! A prefab is an ordered template of `(component, payload producer)` pairs.
//! Instantiating one spawns an entity and applies each entry in template
//! order through the same set/add semantics as direct calls, so add hooks
//! fire per component.
//!
//! Payloads are opaque and not clonable in general, so templates store
//! producer closures rather than values; `with_value` captures a `Clone`
//! payload and clones it per instantiation. A bare `with` entry is valid
//! for tag components only, exactly like direct `add`; instantiation fails
//! with `WrongKind` when the entry names a value component.

use std::any::Any;
use std::rc::Rc;

use crate::engine::types::ComponentID;
use crate::engine::world::World;

/// One template entry.
pub enum PrefabEntry {
    /// Component with an explicit payload producer.
    Value {
        /// Component to set.
        component: ComponentID,
        /// Produces one boxed payload per instantiation.
        produce: Rc<dyn Fn() -> Box<dyn Any>>,
    },
    /// Component without a payload; must be tag-kind.
    Bare {
        /// Component to add.
        component: ComponentID,
    },
}

/// Ordered component template, optionally registered under a name.
pub struct Prefab {
    name: Option<String>,
    entries: Vec<PrefabEntry>,
}

impl Prefab {
    /// Name the template was registered under, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Template entries in application order.
    pub fn entries(&self) -> &[PrefabEntry] {
        &self.entries
    }
}

/// Fluent builder for a [`Prefab`], obtained from `World::prefab`.
pub struct PrefabBuilder<'w> {
    world: &'w mut World,
    entries: Vec<PrefabEntry>,
}

impl<'w> PrefabBuilder<'w> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        Self { world, entries: Vec::new() }
    }

    /// Appends a component with an explicit payload.
    ///
    /// The payload is cloned once per instantiation.
    pub fn with_value<T: Clone + 'static>(mut self, component: ComponentID, value: T) -> Self {
        self.entries.push(PrefabEntry::Value {
            component,
            produce: Rc::new(move || Box::new(value.clone())),
        });
        self
    }

    /// Appends a component without a payload.
    ///
    /// Valid for tag-kind components only; a value component here fails at
    /// spawn time with `WrongKind`.
    pub fn with(mut self, component: ComponentID) -> Self {
        self.entries.push(PrefabEntry::Bare { component });
        self
    }

    /// Finalizes the template.
    ///
    /// With a name, the template is registered in the world's prefab
    /// registry, replacing (with a warning) any prior entry under that name.
    pub fn build(self, name: Option<&str>) -> Rc<Prefab> {
        let prefab = Rc::new(Prefab {
            name: name.map(str::to_owned),
            entries: self.entries,
        });
        if let Some(name) = name {
            self.world.register_prefab(name, prefab.clone());
        }
        prefab
    }
}
