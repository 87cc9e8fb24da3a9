//! Component lifecycle hooks.
//!
//! Callbacks subscribe to a component's add/change/remove events and are
//! invoked synchronously, in subscription order, from the mutating call.
//! Stores mutate before hooks fire, so a hook querying the world observes
//! the post-event state; change and remove hooks additionally receive the
//! displaced old payload.
//!
//! Hooks receive `&mut World`, so mutations performed inside a hook apply
//! immediately (or enqueue, when deferred mode is active). A hook returning
//! an error aborts the remaining hooks for that event and propagates through
//! the mutating call; the mutation itself is not rolled back.
//!
//! Subscriptions are identified by a [`HookID`] token; `unsubscribe` removes
//! by token. The dispatching world snapshots the callback list before
//! invoking, so a hook may subscribe or unsubscribe without disturbing the
//! event in flight.

use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::error::WorldResult;
use crate::engine::types::{ComponentID, Entity, HookValue};
use crate::engine::world::World;

/// Token identifying one hook subscription.
pub type HookID = u64;

/// Callback for component-added events.
pub type AddHookFn = Rc<dyn Fn(&mut World, Entity) -> WorldResult<()>>;

/// Callback for component-changed and component-removed events.
///
/// The [`HookValue`] carries the displaced old payload; for removals of tag
/// components it is absent.
pub type ValueHookFn = Rc<dyn Fn(&mut World, Entity, HookValue<'_>) -> WorldResult<()>>;

/// Per-component subscription lists for the three lifecycle events.
pub struct HookRegistry {
    next: HookID,
    add: HashMap<ComponentID, Vec<(HookID, AddHookFn)>>,
    change: HashMap<ComponentID, Vec<(HookID, ValueHookFn)>>,
    remove: HashMap<ComponentID, Vec<(HookID, ValueHookFn)>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            next: 0,
            add: HashMap::new(),
            change: HashMap::new(),
            remove: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> HookID {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Subscribes to add events for `component`.
    pub fn subscribe_add(&mut self, component: ComponentID, hook: AddHookFn) -> HookID {
        let id = self.next_id();
        self.add.entry(component).or_default().push((id, hook));
        id
    }

    /// Subscribes to change events for `component`.
    pub fn subscribe_change(&mut self, component: ComponentID, hook: ValueHookFn) -> HookID {
        let id = self.next_id();
        self.change.entry(component).or_default().push((id, hook));
        id
    }

    /// Subscribes to remove events for `component`.
    pub fn subscribe_remove(&mut self, component: ComponentID, hook: ValueHookFn) -> HookID {
        let id = self.next_id();
        self.remove.entry(component).or_default().push((id, hook));
        id
    }

    /// Removes a subscription by token; returns `true` if one was found.
    pub fn unsubscribe(&mut self, id: HookID) -> bool {
        for list in self.add.values_mut() {
            if let Some(at) = list.iter().position(|(hook_id, _)| *hook_id == id) {
                list.remove(at);
                return true;
            }
        }
        for list in self.change.values_mut().chain(self.remove.values_mut()) {
            if let Some(at) = list.iter().position(|(hook_id, _)| *hook_id == id) {
                list.remove(at);
                return true;
            }
        }
        false
    }

    /// Snapshot of the add callbacks for `component`, subscription order.
    pub fn add_hooks(&self, component: ComponentID) -> Vec<AddHookFn> {
        self.add
            .get(&component)
            .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the change callbacks for `component`.
    pub fn change_hooks(&self, component: ComponentID) -> Vec<ValueHookFn> {
        self.change
            .get(&component)
            .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the remove callbacks for `component`.
    pub fn remove_hooks(&self, component: ComponentID) -> Vec<ValueHookFn> {
        self.remove
            .get(&component)
            .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
