//! # weft
//!
//! A relational Entity-Component-System world.
//!
//! Entities are opaque versioned handles; components are runtime-registered
//! typed data (or presence-only tags) attached to them; relationships are
//! directed labeled edges between entities. Queries iterate entities by
//! component signature, a deferred command buffer makes mutation during
//! iteration safe, a change tracker records per-frame added/removed/changed
//! sets, and a phased scheduler drives it all.
//!
//! ## Design Goals
//! - Runtime component registration with compact, stable ids
//! - Bitset signatures for cheap query matching
//! - Deterministic, cached query iteration
//! - Explicit, ordered deferred mutation
//! - Single-threaded cooperative execution
//!
//! ## Example
//! ```
//! use weft::prelude::*;
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! struct Position { x: f32, y: f32 }
//! #[derive(Clone, Copy)]
//! struct Velocity { x: f32, y: f32 }
//!
//! let mut world = World::default();
//! let position = world.component::<Position>().unwrap();
//! let velocity = world.component::<Velocity>().unwrap();
//!
//! let e = world.spawn();
//! world.set(e, position, Position { x: 0.0, y: 0.0 }).unwrap();
//! world.set(e, velocity, Velocity { x: 1.0, y: 2.0 }).unwrap();
//!
//! let mut moved = Vec::new();
//! for row in world.query(&[position, velocity]) {
//!     let p = row.get::<Position>(position).unwrap();
//!     let v = row.get::<Velocity>(velocity).unwrap();
//!     moved.push((row.entity, Position { x: p.x + v.x, y: p.y + v.y }));
//! }
//! for (e, p) in moved {
//!     world.set(e, position, p).unwrap();
//! }
//! assert_eq!(
//!     world.get::<Position>(e, position),
//!     Some(&Position { x: 1.0, y: 2.0 })
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::world::{EntityBuilder, World, WorldOptions};

pub use engine::types::{
    ComponentID,
    Entity,
    EntityID,
    HookValue,
    Signature,
    SystemAccess,
};

pub use engine::component::{ComponentDesc, StoreKind};

pub use engine::query::{QueryBuilder, QueryIter, QueryRow};

pub use engine::relation::RelationIndex;

pub use engine::prefab::{Prefab, PrefabBuilder};

pub use engine::hooks::HookID;

pub use engine::scheduler::{Phase, Scheduler};

pub use engine::commands::Command;

pub use engine::error::{TypeMismatchError, WorldError, WorldResult};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use weft::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ComponentID,
        Entity,
        HookValue,
        Phase,
        Scheduler,
        StoreKind,
        SystemAccess,
        World,
        WorldError,
        WorldOptions,
        WorldResult,
    };
}
