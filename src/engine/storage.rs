//! Component storage.
//!
//! Each registered component owns one store behind the object-safe
//! [`ComponentStore`] trait, so the world can hold heterogeneous columns in
//! a single id-indexed table and operate on them without knowing payload
//! types. Typed access downcasts through `as_any` / `as_any_mut`.
//!
//! Two concrete stores exist:
//!
//! - [`SparseStore<T>`]: an entity-index-keyed mapping to payloads of `T`.
//!   Also backs components registered as dense until a packed layout lands;
//!   the registry records the declared kind so observers can tell.
//! - [`TagStore`]: a presence bitmap with no payload.
//!
//! ## Invariants
//! - A store never holds an entry for a slot index whose entity is dead;
//!   the world removes entries before bumping generations.
//! - `len` equals the number of occupied entries.
//! - Index iteration is ascending, which keeps query rebuilds deterministic.

use std::any::{type_name, Any, TypeId};

use crate::engine::component::StoreKind;
use crate::engine::types::IndexID;

/// Type-erased interface over a component store.
///
/// `insert_boxed` hands back the rejected payload on a type mismatch so the
/// caller can surface a structured error; on success it returns the
/// displaced old value, which feeds change hooks.
pub trait ComponentStore: Any {
    /// Storage kind this store implements.
    fn kind(&self) -> StoreKind;

    /// Number of occupied entries.
    fn len(&self) -> usize;

    /// Returns `true` if an entry exists for `index`.
    fn contains(&self, index: IndexID) -> bool;

    /// Returns the stored payload for `index`. Tags always return `None`.
    fn get_value(&self, index: IndexID) -> Option<&dyn Any>;

    /// Inserts or replaces the payload for `index`.
    ///
    /// Returns `Ok(Some(old))` on replacement, `Ok(None)` on first insert,
    /// and `Err(value)` (the payload, unchanged) when its dynamic type does
    /// not match the store's element type or the store carries no payload.
    fn insert_boxed(
        &mut self,
        index: IndexID,
        value: Box<dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, Box<dyn Any>>;

    /// Marks presence for `index` on a tag store.
    ///
    /// Returns `true` if the entry was newly added. Value stores reject the
    /// call; the world validates kinds before dispatching here.
    fn insert_presence(&mut self, index: IndexID) -> bool;

    /// Removes the entry for `index`.
    ///
    /// Returns `None` if no entry existed, `Some(None)` for a removed tag,
    /// and `Some(Some(old))` for a removed payload.
    fn remove_value(&mut self, index: IndexID) -> Option<Option<Box<dyn Any>>>;

    /// Iterates occupied slot indices in ascending order.
    fn indices(&self) -> Box<dyn Iterator<Item = IndexID> + '_>;

    /// `TypeId` of the element type; `None` for tags.
    fn element_type_id(&self) -> Option<TypeId>;

    /// Element type name for diagnostics.
    fn element_type_name(&self) -> &'static str;

    /// Downcast hatch.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast hatch.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Entity-index-keyed payload store.
///
/// Slots grow to the highest inserted index; lookups are a bounds check and
/// an `Option` read.
pub struct SparseStore<T> {
    slots: Vec<Option<T>>,
    len: usize,
    kind: StoreKind,
}

impl<T> SparseStore<T> {
    /// Creates an empty store declaring the given kind (sparse or dense).
    pub fn new(kind: StoreKind) -> Self {
        debug_assert!(kind != StoreKind::Tag);
        Self { slots: Vec::new(), len: 0, kind }
    }

    fn ensure(&mut self, index: IndexID) {
        let needed = index as usize + 1;
        if self.slots.len() < needed {
            self.slots.resize_with(needed, || None);
        }
    }

    /// Inserts or replaces the payload for `index`, returning the old value.
    pub fn insert(&mut self, index: IndexID, value: T) -> Option<T> {
        self.ensure(index);
        let old = self.slots[index as usize].replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Returns a reference to the payload for `index`.
    pub fn get(&self, index: IndexID) -> Option<&T> {
        self.slots.get(index as usize).and_then(|s| s.as_ref())
    }

    /// Returns a mutable reference to the payload for `index`.
    pub fn get_mut(&mut self, index: IndexID) -> Option<&mut T> {
        self.slots.get_mut(index as usize).and_then(|s| s.as_mut())
    }

    /// Removes and returns the payload for `index`.
    pub fn remove(&mut self, index: IndexID) -> Option<T> {
        let old = self.slots.get_mut(index as usize).and_then(|s| s.take());
        if old.is_some() {
            self.len -= 1;
        }
        old
    }

    /// Iterates `(index, payload)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (IndexID, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i as IndexID, v)))
    }
}

impl<T: 'static> ComponentStore for SparseStore<T> {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, index: IndexID) -> bool {
        self.slots
            .get(index as usize)
            .map(|s| s.is_some())
            .unwrap_or(false)
    }

    fn get_value(&self, index: IndexID) -> Option<&dyn Any> {
        self.get(index).map(|v| v as &dyn Any)
    }

    fn insert_boxed(
        &mut self,
        index: IndexID,
        value: Box<dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, Box<dyn Any>> {
        match value.downcast::<T>() {
            Ok(v) => Ok(self
                .insert(index, *v)
                .map(|old| Box::new(old) as Box<dyn Any>)),
            Err(value) => Err(value),
        }
    }

    fn insert_presence(&mut self, _index: IndexID) -> bool {
        unreachable!("presence insert dispatched to a value store")
    }

    fn remove_value(&mut self, index: IndexID) -> Option<Option<Box<dyn Any>>> {
        self.remove(index)
            .map(|old| Some(Box::new(old) as Box<dyn Any>))
    }

    fn indices(&self) -> Box<dyn Iterator<Item = IndexID> + '_> {
        Box::new(self.iter().map(|(i, _)| i))
    }

    fn element_type_id(&self) -> Option<TypeId> {
        Some(TypeId::of::<T>())
    }

    fn element_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Presence-only store for tag components.
pub struct TagStore {
    bits: Vec<bool>,
    len: usize,
}

impl TagStore {
    /// Creates an empty tag store.
    pub fn new() -> Self {
        Self { bits: Vec::new(), len: 0 }
    }

    /// Marks presence for `index`; returns `true` if newly added.
    pub fn insert(&mut self, index: IndexID) -> bool {
        let needed = index as usize + 1;
        if self.bits.len() < needed {
            self.bits.resize(needed, false);
        }
        let slot = &mut self.bits[index as usize];
        if *slot {
            false
        } else {
            *slot = true;
            self.len += 1;
            true
        }
    }

    /// Clears presence for `index`; returns `true` if an entry existed.
    pub fn remove(&mut self, index: IndexID) -> bool {
        match self.bits.get_mut(index as usize) {
            Some(slot) if *slot => {
                *slot = false;
                self.len -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Default for TagStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentStore for TagStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Tag
    }

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, index: IndexID) -> bool {
        self.bits.get(index as usize).copied().unwrap_or(false)
    }

    fn get_value(&self, _index: IndexID) -> Option<&dyn Any> {
        // Tags carry no payload; presence is answered by `contains`.
        None
    }

    fn insert_boxed(
        &mut self,
        _index: IndexID,
        value: Box<dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, Box<dyn Any>> {
        Err(value)
    }

    fn insert_presence(&mut self, index: IndexID) -> bool {
        self.insert(index)
    }

    fn remove_value(&mut self, index: IndexID) -> Option<Option<Box<dyn Any>>> {
        if self.remove(index) {
            Some(None)
        } else {
            None
        }
    }

    fn indices(&self) -> Box<dyn Iterator<Item = IndexID> + '_> {
        Box::new(
            self.bits
                .iter()
                .enumerate()
                .filter_map(|(i, &b)| b.then_some(i as IndexID)),
        )
    }

    fn element_type_id(&self) -> Option<TypeId> {
        None
    }

    fn element_type_name(&self) -> &'static str {
        "(tag)"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
