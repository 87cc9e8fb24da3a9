//! Core identifiers and bit-level layouts.
//!
//! This module defines the fundamental types shared across all subsystems of
//! the world: entity handles, component identifiers, and the `Signature`
//! bitset used for query matching.
//!
//! ## Entity Representation
//!
//! Entities are encoded as a packed 64-bit integer:
//!
//! ```text
//! | generation | index |
//! ```
//!
//! - **Index** identifies the slot within the entity registry.
//! - **Generation** is incremented when the slot is destroyed, so stale
//!   handles to a recycled slot resolve as "not alive".
//!
//! The bit widths are compile-time constants validated with static
//! assertions.
//!
//! ## Signatures
//!
//! Every alive entity carries a `Signature`: a fixed-size bit array over
//! `ComponentID` with one bit per registered component. Signatures support
//! fast subset and disjointness tests, which is all query matching needs.

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Globally unique entity identifier encoded as a packed 64-bit value.
pub type EntityID = u64;
/// Index of an entity slot within the registry.
pub type IndexID = u32;
/// Generation counter used to detect stale entity handles.
pub type GenerationID = u32;

/// Unique identifier for a registered component type.
pub type ComponentID = u16;

/// Total number of bits in an [`EntityID`].
pub const ENTITY_BITS: Bits = 64;
/// Number of bits reserved for the slot index.
pub const INDEX_BITS: Bits = 32;
/// Number of bits reserved for the generation counter.
pub const GENERATION_BITS: Bits = ENTITY_BITS - INDEX_BITS;

const _: [(); 1] = [(); (INDEX_BITS > 0) as usize];
const _: [(); 1] = [(); (GENERATION_BITS > 0) as usize];
const _: [(); 1] = [(); (INDEX_BITS + GENERATION_BITS == ENTITY_BITS) as usize];

const fn mask(bits: Bits) -> EntityID {
    if bits == 0 { 0 } else { ((1 as EntityID) << bits) - 1 }
}

/// Mask selecting the index portion of an [`EntityID`].
pub const INDEX_MASK: EntityID = mask(INDEX_BITS);

/// Maximum number of registered component types per world.
pub const COMPONENT_CAP: usize = 256;
/// Number of `u64` words required to represent a full component signature.
pub const SIGNATURE_WORDS: usize = COMPONENT_CAP / 64;

const _: [(); 1] = [(); (COMPONENT_CAP % 64 == 0) as usize];
const _: [(); 1] = [(); (COMPONENT_CAP <= ComponentID::MAX as usize + 1) as usize];

/// Opaque, versioned identifier for an entity.
///
/// Two handles with the same index but different generations are distinct:
/// the older one refers to a destroyed entity and resolves as not-alive
/// everywhere. Handles are values; they are cheap to copy, hash, and
/// compare, and they may outlive the entity they reference.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Entity(pub EntityID);

impl Entity {
    /// Packs an index and generation into an entity handle.
    #[inline]
    pub const fn new(index: IndexID, generation: GenerationID) -> Self {
        Entity(((generation as EntityID) << INDEX_BITS) | (index as EntityID))
    }

    /// Returns the slot index encoded in this handle.
    #[inline]
    pub const fn index(self) -> IndexID {
        (self.0 & INDEX_MASK) as IndexID
    }

    /// Returns the generation encoded in this handle.
    #[inline]
    pub const fn generation(self) -> GenerationID {
        (self.0 >> INDEX_BITS) as GenerationID
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Bitset over registered component ids.
///
/// ## Invariant
/// For every alive entity, bit `c` is set in its signature if and only if
/// the store for component `c` contains that entity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    words: [u64; SIGNATURE_WORDS],
}

impl Default for Signature {
    fn default() -> Self {
        Self { words: [0u64; SIGNATURE_WORDS] }
    }
}

impl Signature {
    /// The empty signature.
    pub const EMPTY: Signature = Signature { words: [0u64; SIGNATURE_WORDS] };

    /// Sets the bit corresponding to `component`.
    #[inline]
    pub fn set(&mut self, component: ComponentID) {
        self.words[(component as usize) / 64] |= 1u64 << ((component as usize) % 64);
    }

    /// Clears the bit corresponding to `component`.
    #[inline]
    pub fn clear(&mut self, component: ComponentID) {
        self.words[(component as usize) / 64] &= !(1u64 << ((component as usize) % 64));
    }

    /// Clears every bit.
    #[inline]
    pub fn clear_all(&mut self) {
        self.words = [0u64; SIGNATURE_WORDS];
    }

    /// Returns `true` if `component` is present.
    ///
    /// Ids beyond [`COMPONENT_CAP`] are never present.
    #[inline]
    pub fn has(&self, component: ComponentID) -> bool {
        match self.words.get((component as usize) / 64) {
            Some(word) => (word >> ((component as usize) % 64)) & 1 == 1,
            None => false,
        }
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every bit of `other` is also set in `self`.
    #[inline]
    pub fn contains_all(&self, other: &Signature) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| (a & b) == *b)
    }

    /// Returns `true` if `self` and `other` share at least one bit.
    #[inline]
    pub fn intersects(&self, other: &Signature) -> bool {
        self.words.iter().zip(other.words.iter()).any(|(a, b)| (a & b) != 0)
    }

    /// Number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates over all component ids set in this signature, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ComponentID> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let base = word_index * 64;
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some((base + tz) as ComponentID)
            })
        })
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Builds a signature from a list of component ids.
///
/// Ids beyond [`COMPONENT_CAP`] are skipped; no registered component can
/// carry one.
pub fn build_signature(components: &[ComponentID]) -> Signature {
    let mut signature = Signature::default();
    for &component in components {
        if (component as usize) < COMPONENT_CAP {
            signature.set(component);
        }
    }
    signature
}

/// Declared component access of a system.
///
/// Metadata only: execution is single-threaded and insertion-ordered, so
/// the scheduler does not enforce access at run time. The sets are exposed
/// for diagnostics and future parallelization.
#[derive(Clone, Debug, Default)]
pub struct SystemAccess {
    /// Components the system reads.
    pub reads: Vec<ComponentID>,
    /// Components the system writes.
    pub writes: Vec<ComponentID>,
}

impl SystemAccess {
    /// Access set that touches nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds an access set from read and write id lists.
    pub fn new(reads: &[ComponentID], writes: &[ComponentID]) -> Self {
        Self { reads: reads.to_vec(), writes: writes.to_vec() }
    }
}

/// Value handed to remove/change hooks: the displaced payload, if any.
///
/// Tag components have no payload; their hooks see [`HookValue::Absent`].
pub enum HookValue<'a> {
    /// No payload (tag component).
    Absent,
    /// The payload that was displaced by the mutation.
    Value(&'a dyn std::any::Any),
}

impl<'a> HookValue<'a> {
    /// Downcasts the displaced payload to a concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&'a T> {
        match self {
            HookValue::Absent => None,
            HookValue::Value(v) => v.downcast_ref::<T>(),
        }
    }

    /// Returns `true` if no payload is carried.
    pub fn is_absent(&self) -> bool {
        matches!(self, HookValue::Absent)
    }
}
