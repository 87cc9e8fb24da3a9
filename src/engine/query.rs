//! Query construction, caching, and iteration.
//!
//! A query is an access pattern over component ids: a `fetch` list (the
//! components whose values the caller wants), plus `with` and `without`
//! filters. An entity matches when it is alive, its signature contains every
//! required bit (`fetch` ∪ `with`), and shares no bit with `without`.
//!
//! ## Caching
//! Match lists are cached per pattern key. The key collapses `fetch` and
//! `with` into one sorted required set, so patterns differing only in fetch
//! order share a cache entry; value access is by component id, so no
//! per-caller reprojection is needed. Every entry records the world epoch at
//! build time; the world bumps its epoch on every signature change, and a
//! stale entry is rebuilt from a full scan on next use.
//!
//! ## Iteration
//! `iter` snapshots the cached match list, so structural changes made
//! between iterations never corrupt a live iterator, and enqueueing
//! deferred commands during iteration is the supported mutation path.
//! Results are ordered by ascending entity index, which is deterministic
//! across re-iteration of the same pattern within a flush epoch.
//!
//! ## Rebuild strategy
//! Rebuilds scan the smallest store among the required components and test
//! each candidate's signature, rather than walking every live entity.

use std::any::Any;
use std::collections::HashMap;

use crate::engine::types::{build_signature, ComponentID, Entity, Signature};
use crate::engine::world::World;

/// Cache key: the sorted, deduplicated required and forbidden id sets.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QueryKey {
    required: Vec<ComponentID>,
    forbidden: Vec<ComponentID>,
}

impl QueryKey {
    fn new(fetch: &[ComponentID], with: &[ComponentID], without: &[ComponentID]) -> Self {
        let mut required: Vec<ComponentID> = fetch.iter().chain(with.iter()).copied().collect();
        required.sort_unstable();
        required.dedup();
        let mut forbidden: Vec<ComponentID> = without.to_vec();
        forbidden.sort_unstable();
        forbidden.dedup();
        Self { required, forbidden }
    }

    /// Required component ids, sorted.
    pub fn required(&self) -> &[ComponentID] {
        &self.required
    }

    /// Forbidden component ids, sorted.
    pub fn forbidden(&self) -> &[ComponentID] {
        &self.forbidden
    }

    /// Signature over the required ids.
    pub fn required_signature(&self) -> Signature {
        build_signature(&self.required)
    }

    /// Signature over the forbidden ids.
    pub fn forbidden_signature(&self) -> Signature {
        build_signature(&self.forbidden)
    }
}

pub(crate) struct CacheEntry {
    pub entities: Vec<Entity>,
    pub epoch: u64,
}

/// Pattern-keyed store of materialized match lists.
pub(crate) struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Returns a snapshot of the cached match list if it is still valid for
    /// `epoch`.
    pub fn lookup(&self, key: &QueryKey, epoch: u64) -> Option<Vec<Entity>> {
        self.entries
            .get(key)
            .filter(|entry| entry.epoch == epoch)
            .map(|entry| entry.entities.clone())
    }

    /// Stores a freshly built match list.
    pub fn store(&mut self, key: QueryKey, entities: Vec<Entity>, epoch: u64) {
        self.entries.insert(key, CacheEntry { entities, epoch });
    }
}

/// Builder for an access pattern, obtained from `World::query`.
///
/// The builder is convertible to an iterator directly (`for row in
/// world.query(..)`) or explicitly via [`iter`](QueryBuilder::iter).
pub struct QueryBuilder<'w> {
    world: &'w World,
    fetch: Vec<ComponentID>,
    with: Vec<ComponentID>,
    without: Vec<ComponentID>,
}

impl<'w> QueryBuilder<'w> {
    pub(crate) fn new(world: &'w World, fetch: &[ComponentID]) -> Self {
        Self {
            world,
            fetch: fetch.to_vec(),
            with: Vec::new(),
            without: Vec::new(),
        }
    }

    /// Requires the listed components to be present, without fetching them.
    pub fn with(mut self, components: &[ComponentID]) -> Self {
        self.with.extend_from_slice(components);
        self
    }

    /// Excludes entities carrying any of the listed components.
    pub fn without(mut self, components: &[ComponentID]) -> Self {
        self.without.extend_from_slice(components);
        self
    }

    /// Finalizes the pattern and returns the matching iterator.
    pub fn iter(self) -> QueryIter<'w> {
        let key = QueryKey::new(&self.fetch, &self.with, &self.without);
        let matches = self.world.cached_matches(key);
        QueryIter { world: self.world, matches, cursor: 0 }
    }
}

impl<'w> IntoIterator for QueryBuilder<'w> {
    type Item = QueryRow<'w>;
    type IntoIter = QueryIter<'w>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a snapshot of the entities matching a pattern.
pub struct QueryIter<'w> {
    world: &'w World,
    matches: Vec<Entity>,
    cursor: usize,
}

impl<'w> QueryIter<'w> {
    /// Number of entities in the snapshot, including any that died since
    /// the snapshot was taken.
    pub fn snapshot_len(&self) -> usize {
        self.matches.len()
    }
}

impl<'w> Iterator for QueryIter<'w> {
    type Item = QueryRow<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.matches.len() {
            let entity = self.matches[self.cursor];
            self.cursor += 1;
            // Entities destroyed since the snapshot are skipped, not yielded.
            if self.world.alive(entity) {
                return Some(QueryRow { world: self.world, entity });
            }
        }
        None
    }
}

/// One match: the entity plus value accessors reading the store at yield
/// time.
pub struct QueryRow<'w> {
    world: &'w World,
    /// The matched entity.
    pub entity: Entity,
}

impl<'w> QueryRow<'w> {
    /// Typed payload of `component` on this entity.
    pub fn get<T: 'static>(&self, component: ComponentID) -> Option<&'w T> {
        self.world.get::<T>(self.entity, component)
    }

    /// Type-erased payload of `component`; absent for tags.
    pub fn value(&self, component: ComponentID) -> Option<&'w dyn Any> {
        self.world.get_value(self.entity, component)
    }

    /// Returns `true` if this entity carries `component`.
    pub fn has(&self, component: ComponentID) -> bool {
        self.world.has(self.entity, &[component])
    }
}
