//! Frame-scoped change tracking.
//!
//! When the world is configured with `track_changes`, every component event
//! lands in one of three per-component sets: `added`, `removed`, `changed`.
//! The sets describe what crossed a presence or value boundary since the
//! last clear, which the scheduler performs at the end of each step.
//!
//! ## Coalescing rules
//! - add: entity joins `added`, leaves `removed`.
//! - remove: an entity still in `added` this frame simply leaves it (the
//!   add/remove pair cancels); otherwise it joins `removed` and leaves
//!   `changed`.
//! - change: an entity in `added` stays there (still "new this frame");
//!   otherwise it joins `changed`.
//!
//! ## Invariant
//! `added[c]` and `removed[c]` are disjoint at every moment within a frame.

use std::collections::{HashMap, HashSet};

use crate::engine::types::{ComponentID, Entity};

/// Per-component added/removed/changed entity sets for the current frame.
pub struct ChangeTracker {
    enabled: bool,
    added: HashMap<ComponentID, HashSet<Entity>>,
    removed: HashMap<ComponentID, HashSet<Entity>>,
    changed: HashMap<ComponentID, HashSet<Entity>>,
}

impl ChangeTracker {
    /// Creates a tracker; a disabled tracker records nothing.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            added: HashMap::new(),
            removed: HashMap::new(),
            changed: HashMap::new(),
        }
    }

    /// Returns `true` if recording is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Records a component-added event.
    pub fn record_add(&mut self, component: ComponentID, entity: Entity) {
        if !self.enabled {
            return;
        }
        self.added.entry(component).or_default().insert(entity);
        if let Some(set) = self.removed.get_mut(&component) {
            set.remove(&entity);
        }
    }

    /// Records a component-removed event, cancelling a same-frame add.
    pub fn record_remove(&mut self, component: ComponentID, entity: Entity) {
        if !self.enabled {
            return;
        }
        let cancelled = self
            .added
            .get_mut(&component)
            .map(|set| set.remove(&entity))
            .unwrap_or(false);
        if cancelled {
            return;
        }
        self.removed.entry(component).or_default().insert(entity);
        if let Some(set) = self.changed.get_mut(&component) {
            set.remove(&entity);
        }
    }

    /// Records a component-changed event.
    pub fn record_change(&mut self, component: ComponentID, entity: Entity) {
        if !self.enabled {
            return;
        }
        let still_new = self
            .added
            .get(&component)
            .map(|set| set.contains(&entity))
            .unwrap_or(false);
        if still_new {
            return;
        }
        self.changed.entry(component).or_default().insert(entity);
    }

    /// Entities whose component was added this frame.
    pub fn added(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.added.get(&component).into_iter().flatten().copied()
    }

    /// Entities whose component was removed this frame.
    pub fn removed(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.removed.get(&component).into_iter().flatten().copied()
    }

    /// Entities whose component value changed this frame.
    pub fn changed(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.changed.get(&component).into_iter().flatten().copied()
    }

    /// Resets all three sets for every component.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.changed.clear();
    }
}
