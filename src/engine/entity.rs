//! Entity identity and lifecycle.
//!
//! The [`EntityRegistry`] owns every entity slot: its generation counter,
//! liveness flag, and component signature. Entities are lightweight handles
//! into this table.
//!
//! ## Lifecycle
//! - `spawn` allocates a slot, preferring recycled indices from the free
//!   list; the recycled slot keeps its bumped generation, so handles to the
//!   previous occupant stay dead.
//! - `reserve` hands out a tentative handle without materializing the slot.
//!   Reserved indices come from a monotone watermark that never overlaps the
//!   free list, so a direct spawn between reservation and flush cannot
//!   collide with a pending deferred spawn. The handle resolves as not-alive
//!   until `activate` runs.
//! - `despawn` bumps the generation, clears the signature, and returns the
//!   index to the free list.
//!
//! ## Invariants
//! - `generations.len() == alive.len() == signatures.len()`.
//! - An entity is alive iff its index is materialized, the slot is marked
//!   alive, and the handle generation matches the slot generation.
//! - Free-list indices always refer to dead, materialized slots.

use std::cell::Cell;

use crate::engine::types::{Entity, GenerationID, IndexID, Signature};

/// Slot table for entity identity, liveness, and signatures.
pub struct EntityRegistry {
    generations: Vec<GenerationID>,
    alive: Vec<bool>,
    signatures: Vec<Signature>,
    free: Vec<IndexID>,
    next_index: Cell<IndexID>,
    live: usize,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            signatures: Vec::new(),
            free: Vec::new(),
            next_index: Cell::new(0),
            live: 0,
        }
    }

    fn materialize(&mut self, index: IndexID) {
        let needed = index as usize + 1;
        if self.generations.len() < needed {
            self.generations.resize(needed, 0);
            self.alive.resize(needed, false);
            self.signatures.resize(needed, Signature::EMPTY);
        }
    }

    /// Allocates a new alive entity with an empty signature.
    ///
    /// Recycles a destroyed slot when one is available; the handle carries
    /// the slot's current (already bumped) generation.
    pub fn spawn(&mut self) -> Entity {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.next_index.get();
                self.next_index.set(index + 1);
                index
            }
        };
        self.materialize(index);
        self.alive[index as usize] = true;
        self.signatures[index as usize] = Signature::EMPTY;
        self.live += 1;
        Entity::new(index, self.generations[index as usize])
    }

    /// Reserves a tentative handle for a deferred spawn.
    ///
    /// The slot is not materialized and the handle is not alive until
    /// [`activate`](Self::activate) runs. Reserved indices are fresh, never
    /// recycled.
    pub fn reserve(&self) -> Entity {
        let index = self.next_index.get();
        self.next_index.set(index + 1);
        Entity::new(index, 0)
    }

    /// Brings a reserved handle to life.
    ///
    /// Returns `false` if the slot is already alive or the handle is stale.
    pub fn activate(&mut self, entity: Entity) -> bool {
        let index = entity.index();
        self.materialize(index);
        let slot = index as usize;
        if self.alive[slot] || self.generations[slot] != entity.generation() {
            return false;
        }
        self.alive[slot] = true;
        self.signatures[slot] = Signature::EMPTY;
        self.live += 1;
        true
    }

    /// Destroys an entity, invalidating every handle to it.
    ///
    /// Returns `false` if the handle was stale or already dead.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        match self.generations.get_mut(slot) {
            Some(generation)
                if *generation == entity.generation()
                    && self.alive.get(slot).copied().unwrap_or(false) =>
            {
                *generation = generation.wrapping_add(1);
                self.alive[slot] = false;
                self.signatures[slot] = Signature::EMPTY;
                self.free.push(entity.index());
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the handle refers to a live entity.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index() as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation()
    }

    /// Returns the signature of a live entity.
    pub fn signature(&self, entity: Entity) -> Option<&Signature> {
        if self.is_alive(entity) {
            Some(&self.signatures[entity.index() as usize])
        } else {
            None
        }
    }

    /// Returns a mutable signature reference for a live entity.
    pub fn signature_mut(&mut self, entity: Entity) -> Option<&mut Signature> {
        if self.is_alive(entity) {
            Some(&mut self.signatures[entity.index() as usize])
        } else {
            None
        }
    }

    /// Resolves a slot index to its current live handle.
    pub fn entity_at(&self, index: IndexID) -> Option<Entity> {
        let slot = index as usize;
        if slot < self.generations.len() && self.alive[slot] {
            Some(Entity::new(index, self.generations[slot]))
        } else {
            None
        }
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Iterates live entities in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().enumerate().filter_map(|(index, &alive)| {
            alive.then(|| Entity::new(index as IndexID, self.generations[index]))
        })
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
