//! Relationship index.
//!
//! Stores directed labeled edges between entities: triples
//! `(source, relation, target)` with an optional opaque payload, where the
//! relation label is a registered component id. At most one triple exists
//! per `(source, relation, target)`; relating again overwrites the payload
//! in place.
//!
//! The index is kept twice:
//!
//! - forward: `(source, relation) -> [targets + payloads]`
//! - reverse: `(relation, target) -> [sources]`
//!
//! ## Invariants
//! - Every forward edge has a mirror entry in the reverse index.
//! - Edge lists preserve insertion order; `targets` and `sources` read in
//!   that order.
//! - Relation labels do not appear in entity signatures and never fire
//!   component hooks; queries do not see relations.

use std::any::Any;
use std::collections::HashMap;

use crate::engine::types::{ComponentID, Entity};

/// One outgoing edge: the target and its optional payload.
pub struct RelationEdge {
    /// Edge target.
    pub target: Entity,
    /// Opaque payload attached to the edge, if any.
    pub payload: Option<Box<dyn Any>>,
}

/// Bidirectional index over relation triples.
pub struct RelationIndex {
    forward: HashMap<(Entity, ComponentID), Vec<RelationEdge>>,
    reverse: HashMap<(ComponentID, Entity), Vec<Entity>>,
    triples: usize,
}

impl RelationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { forward: HashMap::new(), reverse: HashMap::new(), triples: 0 }
    }

    /// Inserts or overwrites the triple `(source, relation, target)`.
    ///
    /// An existing triple keeps its insertion position; only the payload is
    /// replaced.
    pub fn relate(
        &mut self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
        payload: Option<Box<dyn Any>>,
    ) {
        let edges = self.forward.entry((source, relation)).or_default();
        if let Some(edge) = edges.iter_mut().find(|e| e.target == target) {
            edge.payload = payload;
            return;
        }
        edges.push(RelationEdge { target, payload });
        self.reverse.entry((relation, target)).or_default().push(source);
        self.triples += 1;
    }

    /// Removes the triple if present; returns `true` if one existed.
    pub fn unrelate(&mut self, source: Entity, relation: ComponentID, target: Entity) -> bool {
        let Some(edges) = self.forward.get_mut(&(source, relation)) else {
            return false;
        };
        let Some(at) = edges.iter().position(|e| e.target == target) else {
            return false;
        };
        edges.remove(at);
        if edges.is_empty() {
            self.forward.remove(&(source, relation));
        }
        if let Some(sources) = self.reverse.get_mut(&(relation, target)) {
            if let Some(at) = sources.iter().position(|&s| s == source) {
                sources.remove(at);
            }
            if sources.is_empty() {
                self.reverse.remove(&(relation, target));
            }
        }
        self.triples -= 1;
        true
    }

    /// Returns `true` if the triple exists.
    pub fn has(&self, source: Entity, relation: ComponentID, target: Entity) -> bool {
        self.forward
            .get(&(source, relation))
            .map(|edges| edges.iter().any(|e| e.target == target))
            .unwrap_or(false)
    }

    /// Returns the payload of the triple, absent if the triple does not
    /// exist or carries no payload.
    pub fn payload(
        &self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
    ) -> Option<&dyn Any> {
        self.forward
            .get(&(source, relation))?
            .iter()
            .find(|e| e.target == target)?
            .payload
            .as_deref()
    }

    /// Iterates `(target, payload)` for a source and relation, insertion
    /// order.
    pub fn targets(
        &self,
        source: Entity,
        relation: ComponentID,
    ) -> impl Iterator<Item = (Entity, Option<&dyn Any>)> + '_ {
        self.forward
            .get(&(source, relation))
            .into_iter()
            .flat_map(|edges| edges.iter().map(|e| (e.target, e.payload.as_deref())))
    }

    /// Iterates `(source, payload)` for a relation and target, insertion
    /// order.
    pub fn sources(
        &self,
        relation: ComponentID,
        target: Entity,
    ) -> impl Iterator<Item = (Entity, Option<&dyn Any>)> + '_ {
        self.reverse
            .get(&(relation, target))
            .into_iter()
            .flat_map(move |sources| {
                sources
                    .iter()
                    .map(move |&source| (source, self.payload(source, relation, target)))
            })
    }

    /// Removes every triple in which `entity` appears as source or target.
    pub fn remove_entity(&mut self, entity: Entity) {
        // Outgoing edges: drop whole forward buckets keyed by this source.
        let outgoing: Vec<(Entity, ComponentID)> = self
            .forward
            .keys()
            .filter(|(source, _)| *source == entity)
            .copied()
            .collect();
        for key in outgoing {
            let edges = self.forward.remove(&key).unwrap_or_default();
            let (_, relation) = key;
            for edge in &edges {
                if let Some(sources) = self.reverse.get_mut(&(relation, edge.target)) {
                    sources.retain(|&s| s != entity);
                    if sources.is_empty() {
                        self.reverse.remove(&(relation, edge.target));
                    }
                }
            }
            self.triples -= edges.len();
        }

        // Incoming edges: walk reverse buckets keyed by this target.
        let incoming: Vec<(ComponentID, Entity)> = self
            .reverse
            .keys()
            .filter(|(_, target)| *target == entity)
            .copied()
            .collect();
        for key in incoming {
            let sources = self.reverse.remove(&key).unwrap_or_default();
            let (relation, _) = key;
            for source in sources {
                if let Some(edges) = self.forward.get_mut(&(source, relation)) {
                    let before = edges.len();
                    edges.retain(|e| e.target != entity);
                    self.triples -= before - edges.len();
                    if edges.is_empty() {
                        self.forward.remove(&(source, relation));
                    }
                }
            }
        }
    }

    /// Total number of triples.
    pub fn len(&self) -> usize {
        self.triples
    }

    /// Returns `true` if no triple exists.
    pub fn is_empty(&self) -> bool {
        self.triples == 0
    }

    /// Enumerates every triple as `(source, relation, target, payload)`.
    ///
    /// Bucket order is unspecified; edges within a bucket read in insertion
    /// order. Sufficient for an external serializer.
    pub fn triples(
        &self,
    ) -> impl Iterator<Item = (Entity, ComponentID, Entity, Option<&dyn Any>)> + '_ {
        self.forward.iter().flat_map(|(&(source, relation), edges)| {
            edges
                .iter()
                .map(move |e| (source, relation, e.target, e.payload.as_deref()))
        })
    }
}

impl Default for RelationIndex {
    fn default() -> Self {
        Self::new()
    }
}
