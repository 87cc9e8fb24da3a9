//! The world: entity registry, component stores, relationship index,
//! query cache, change tracker, and deferred command buffer under one owner.
//!
//! ## Ownership model
//! A `World` is owned by exactly one executor at a time; all mutation goes
//! through `&mut self`. The two pieces that must be touched while a query
//! iterator holds `&World` (the command buffer and the query cache) are
//! interior-mutable, which is what makes `defer_*` during iteration the
//! supported mutation path.
//!
//! ## Hook discipline
//! Stores mutate first, hooks fire after, so hooks observe post-event state.
//! Hooks receive `&mut World` and may mutate directly; those mutations apply
//! immediately (or enqueue under deferred mode) and may fire further hooks.
//! Termination of recursive hook cascades is the caller's responsibility.
//!
//! ## Epoch
//! Every signature change (spawn, first set, add, remove, destroy) bumps a
//! world-wide epoch counter. Query cache entries record the epoch they were
//! built at and rebuild lazily when it moves.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use crate::engine::changes::ChangeTracker;
use crate::engine::commands::{Command, CommandBuffer, SpawnCallback};
use crate::engine::component::{ComponentDesc, ComponentRegistry, StoreKind};
use crate::engine::entity::EntityRegistry;
use crate::engine::error::{TypeMismatchError, WorldError, WorldResult};
use crate::engine::hooks::{HookID, HookRegistry};
use crate::engine::prefab::{Prefab, PrefabBuilder, PrefabEntry};
use crate::engine::query::{QueryBuilder, QueryCache, QueryKey};
use crate::engine::relation::RelationIndex;
use crate::engine::storage::{ComponentStore, SparseStore, TagStore};
use crate::engine::types::{ComponentID, Entity, HookValue, Signature};

/// World construction options.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorldOptions {
    /// Record per-component added/removed/changed sets each frame.
    pub track_changes: bool,
    /// Emit warnings on undefined-behavior boundaries (operations on dead
    /// entities, re-entrant flush, prefab replacement, failed deferred
    /// commands).
    pub debug: bool,
}

impl WorldOptions {
    /// Enables change tracking.
    pub fn with_track_changes(mut self, on: bool) -> Self {
        self.track_changes = on;
        self
    }

    /// Enables debug-boundary warnings.
    pub fn with_debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }
}

/// The entity-component world.
pub struct World {
    options: WorldOptions,
    entities: EntityRegistry,
    registry: ComponentRegistry,
    stores: Vec<Box<dyn ComponentStore>>,
    relations: RelationIndex,
    hooks: HookRegistry,
    tracker: ChangeTracker,
    commands: CommandBuffer,
    prefabs: HashMap<String, Rc<Prefab>>,
    cache: RefCell<QueryCache>,
    epoch: u64,
    deferred_mode: bool,
    flushing: bool,
}

impl World {
    /// Creates a world with the given options.
    pub fn new(options: WorldOptions) -> Self {
        Self {
            options,
            entities: EntityRegistry::new(),
            registry: ComponentRegistry::new(),
            stores: Vec::new(),
            relations: RelationIndex::new(),
            hooks: HookRegistry::new(),
            tracker: ChangeTracker::new(options.track_changes),
            commands: CommandBuffer::new(),
            prefabs: HashMap::new(),
            cache: RefCell::new(QueryCache::new()),
            epoch: 0,
            deferred_mode: false,
            flushing: false,
        }
    }

    /// The options this world was constructed with.
    pub fn options(&self) -> &WorldOptions {
        &self.options
    }

    // ── Registration ────────────────────────────────────────────────────

    fn register_store(
        &mut self,
        make_desc: impl FnOnce(ComponentID) -> ComponentDesc,
        store: Box<dyn ComponentStore>,
    ) -> WorldResult<ComponentID> {
        let id = self.registry.register(make_desc)?;
        self.stores.push(store);
        debug_assert_eq!(self.stores.len(), self.registry.len());
        Ok(id)
    }

    /// Registers a sparse component storing payloads of type `T`.
    pub fn component<T: 'static>(&mut self) -> WorldResult<ComponentID> {
        self.register_store(
            |id| ComponentDesc::of::<T>(id, StoreKind::Sparse),
            Box::new(SparseStore::<T>::new(StoreKind::Sparse)),
        )
    }

    /// Registers a sparse component with a default-producer.
    ///
    /// The producer is recorded in the component's descriptor as metadata
    /// for embedder tooling (template systems, deserializers); no core
    /// operation consumes it.
    pub fn component_with_default<T: 'static>(
        &mut self,
        producer: impl Fn() -> T + 'static,
    ) -> WorldResult<ComponentID> {
        let producer: Rc<dyn Fn() -> Box<dyn Any>> = Rc::new(move || Box::new(producer()));
        self.register_store(
            |id| ComponentDesc::of::<T>(id, StoreKind::Sparse).with_default(producer),
            Box::new(SparseStore::<T>::new(StoreKind::Sparse)),
        )
    }

    /// Registers a dense component.
    ///
    /// The descriptor records `Dense`; storage currently aliases the sparse
    /// layout, with an identical observable contract.
    pub fn dense_component<T: 'static>(&mut self) -> WorldResult<ComponentID> {
        self.register_store(
            |id| ComponentDesc::of::<T>(id, StoreKind::Dense),
            Box::new(SparseStore::<T>::new(StoreKind::Dense)),
        )
    }

    /// Registers a presence-only tag component.
    pub fn tag(&mut self) -> WorldResult<ComponentID> {
        self.register_store(ComponentDesc::tag, Box::new(TagStore::new()))
    }

    /// Descriptor of a registered component.
    pub fn descriptor(&self, component: ComponentID) -> Option<&ComponentDesc> {
        self.registry.descriptor(component)
    }

    /// Iterates all component descriptors in id order.
    pub fn component_descriptors(&self) -> impl Iterator<Item = &ComponentDesc> {
        self.registry.iter()
    }

    /// Number of registered components.
    pub fn component_count(&self) -> usize {
        self.registry.len()
    }

    // ── Entity lifecycle ────────────────────────────────────────────────

    /// Spawns a new entity with an empty signature.
    ///
    /// Always immediate, even under deferred mode; use
    /// [`defer_spawn`](Self::defer_spawn) for deferred creation.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.spawn();
        self.epoch += 1;
        entity
    }

    /// Returns `true` if the handle refers to a live entity.
    pub fn alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Destroys an entity: removes every component (firing remove hooks),
    /// removes every relation triple it appears in, and bumps its
    /// generation. No-op on a dead handle.
    pub fn destroy(&mut self, entity: Entity) -> WorldResult<()> {
        if self.defer_active() {
            self.commands.push(Command::Destroy { entity });
            return Ok(());
        }
        self.destroy_now(entity)
    }

    fn destroy_now(&mut self, entity: Entity) -> WorldResult<()> {
        if !self.entities.is_alive(entity) {
            if self.options.debug {
                warn!("destroy on dead entity {entity} ignored");
            }
            return Ok(());
        }
        // Drain the live signature rather than a snapshot: hooks may add or
        // remove components on the dying entity mid-destroy.
        loop {
            let next = self
                .entities
                .signature(entity)
                .and_then(|signature| signature.iter().next());
            match next {
                Some(component) => self.remove_now(entity, component)?,
                None => break,
            }
        }
        if self.entities.is_alive(entity) {
            self.relations.remove_entity(entity);
            self.entities.despawn(entity);
            self.epoch += 1;
        }
        Ok(())
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Iterates live entities in ascending index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// Signature of a live entity.
    pub fn signature_of(&self, entity: Entity) -> Option<&Signature> {
        self.entities.signature(entity)
    }

    // ── Component access ────────────────────────────────────────────────

    /// Stores a payload on a value component, firing the add hook on first
    /// insert or the change hook on replacement.
    pub fn set<T: 'static>(
        &mut self,
        entity: Entity,
        component: ComponentID,
        value: T,
    ) -> WorldResult<()> {
        if self.defer_active() {
            self.commands.push(Command::Set { entity, component, value: Box::new(value) });
            return Ok(());
        }
        self.set_boxed(entity, component, Box::new(value))
    }

    pub(crate) fn set_boxed(
        &mut self,
        entity: Entity,
        component: ComponentID,
        value: Box<dyn Any>,
    ) -> WorldResult<()> {
        if !self.entities.is_alive(entity) {
            if self.options.debug {
                warn!("set on dead entity {entity}");
            }
            return Err(WorldError::UnknownEntity { entity });
        }
        let kind = self.registry.require(component)?.kind;
        if kind == StoreKind::Tag {
            if self.options.debug {
                warn!("set on tag component {component}; use add");
            }
            return Err(WorldError::WrongKind { component, kind });
        }
        let index = entity.index();
        let store = self.stores[component as usize].as_mut();
        match store.insert_boxed(index, value) {
            Err(value) => Err(WorldError::TypeMismatch(TypeMismatchError {
                component,
                expected: store
                    .element_type_id()
                    .expect("value store carries an element type"),
                expected_name: store.element_type_name(),
                actual: value.as_ref().type_id(),
            })),
            Ok(None) => {
                if let Some(signature) = self.entities.signature_mut(entity) {
                    signature.set(component);
                }
                self.epoch += 1;
                self.tracker.record_add(component, entity);
                self.fire_add_hooks(entity, component)
            }
            Ok(Some(old)) => {
                self.tracker.record_change(component, entity);
                self.fire_change_hooks(entity, component, Some(&*old))
            }
        }
    }

    /// Adds a tag component. Idempotent: a present tag fires no second add
    /// hook.
    pub fn add(&mut self, entity: Entity, component: ComponentID) -> WorldResult<()> {
        if self.defer_active() {
            self.commands.push(Command::Add { entity, component });
            return Ok(());
        }
        let kind = self.registry.require(component)?.kind;
        if kind != StoreKind::Tag {
            if self.options.debug {
                warn!("add on {kind} component {component}; use set");
            }
            return Err(WorldError::WrongKind { component, kind });
        }
        self.add_now(entity, component)
    }

    fn add_now(&mut self, entity: Entity, component: ComponentID) -> WorldResult<()> {
        if !self.entities.is_alive(entity) {
            if self.options.debug {
                warn!("add on dead entity {entity}");
            }
            return Err(WorldError::UnknownEntity { entity });
        }
        let newly = self.stores[component as usize].insert_presence(entity.index());
        if !newly {
            return Ok(());
        }
        if let Some(signature) = self.entities.signature_mut(entity) {
            signature.set(component);
        }
        self.epoch += 1;
        self.tracker.record_add(component, entity);
        self.fire_add_hooks(entity, component)
    }

    /// Removes a component, firing the remove hook with the displaced
    /// value. No-op on a dead entity or an absent component.
    pub fn remove(&mut self, entity: Entity, component: ComponentID) -> WorldResult<()> {
        if self.defer_active() {
            self.commands.push(Command::Remove { entity, component });
            return Ok(());
        }
        self.registry.require(component)?;
        if !self.entities.is_alive(entity) {
            if self.options.debug {
                warn!("remove on dead entity {entity} ignored");
            }
            return Ok(());
        }
        self.remove_now(entity, component)
    }

    fn remove_now(&mut self, entity: Entity, component: ComponentID) -> WorldResult<()> {
        let Some(old) = self.stores[component as usize].remove_value(entity.index()) else {
            return Ok(());
        };
        if let Some(signature) = self.entities.signature_mut(entity) {
            signature.clear(component);
        }
        self.epoch += 1;
        self.tracker.record_remove(component, entity);
        self.fire_remove_hooks(entity, component, old.as_deref())
    }

    /// Typed payload of `component` on `entity`.
    ///
    /// `None` for dead entities, absent components, tags, and payload-type
    /// mismatches.
    pub fn get<T: 'static>(&self, entity: Entity, component: ComponentID) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.stores
            .get(component as usize)?
            .as_any()
            .downcast_ref::<SparseStore<T>>()?
            .get(entity.index())
    }

    /// Type-erased payload of `component` on `entity`; tags are always
    /// absent.
    pub fn get_value(&self, entity: Entity, component: ComponentID) -> Option<&dyn Any> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.stores.get(component as usize)?.get_value(entity.index())
    }

    /// Returns `true` if the entity is alive and carries every listed
    /// component.
    pub fn has(&self, entity: Entity, components: &[ComponentID]) -> bool {
        match self.entities.signature(entity) {
            Some(signature) => components.iter().all(|&c| signature.has(c)),
            None => false,
        }
    }

    // ── Hooks ───────────────────────────────────────────────────────────

    /// Subscribes to add events for `component`.
    pub fn on_add(
        &mut self,
        component: ComponentID,
        hook: impl Fn(&mut World, Entity) -> WorldResult<()> + 'static,
    ) -> HookID {
        self.hooks.subscribe_add(component, Rc::new(hook))
    }

    /// Subscribes to change events for `component`. The hook receives the
    /// displaced old payload; the new payload is readable from the world.
    pub fn on_change(
        &mut self,
        component: ComponentID,
        hook: impl Fn(&mut World, Entity, HookValue<'_>) -> WorldResult<()> + 'static,
    ) -> HookID {
        self.hooks.subscribe_change(component, Rc::new(hook))
    }

    /// Subscribes to remove events for `component`. The hook receives the
    /// removed payload (absent for tags).
    pub fn on_remove(
        &mut self,
        component: ComponentID,
        hook: impl Fn(&mut World, Entity, HookValue<'_>) -> WorldResult<()> + 'static,
    ) -> HookID {
        self.hooks.subscribe_remove(component, Rc::new(hook))
    }

    /// Cancels a hook subscription; returns `true` if it existed.
    pub fn unsubscribe(&mut self, hook: HookID) -> bool {
        self.hooks.unsubscribe(hook)
    }

    fn fire_add_hooks(&mut self, entity: Entity, component: ComponentID) -> WorldResult<()> {
        let hooks = self.hooks.add_hooks(component);
        for hook in hooks {
            hook(self, entity)?;
        }
        Ok(())
    }

    fn fire_change_hooks(
        &mut self,
        entity: Entity,
        component: ComponentID,
        old: Option<&dyn Any>,
    ) -> WorldResult<()> {
        let hooks = self.hooks.change_hooks(component);
        for hook in hooks {
            let value = match old {
                Some(v) => HookValue::Value(v),
                None => HookValue::Absent,
            };
            hook(self, entity, value)?;
        }
        Ok(())
    }

    fn fire_remove_hooks(
        &mut self,
        entity: Entity,
        component: ComponentID,
        old: Option<&dyn Any>,
    ) -> WorldResult<()> {
        let hooks = self.hooks.remove_hooks(component);
        for hook in hooks {
            let value = match old {
                Some(v) => HookValue::Value(v),
                None => HookValue::Absent,
            };
            hook(self, entity, value)?;
        }
        Ok(())
    }

    // ── Relationships ───────────────────────────────────────────────────

    fn relate_boxed(
        &mut self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
        payload: Option<Box<dyn Any>>,
    ) -> WorldResult<()> {
        if !self.entities.is_alive(source) {
            return Err(WorldError::UnknownEntity { entity: source });
        }
        if !self.entities.is_alive(target) {
            return Err(WorldError::UnknownEntity { entity: target });
        }
        self.registry.require(relation)?;
        self.relations.relate(source, relation, target, payload);
        Ok(())
    }

    /// Inserts or refreshes the triple `(source, relation, target)` with no
    /// payload.
    pub fn relate(
        &mut self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
    ) -> WorldResult<()> {
        if self.defer_active() {
            self.commands
                .push(Command::Relate { source, relation, target, payload: None });
            return Ok(());
        }
        self.relate_boxed(source, relation, target, None)
    }

    /// Inserts or overwrites the triple with a payload.
    pub fn relate_with<T: 'static>(
        &mut self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
        payload: T,
    ) -> WorldResult<()> {
        if self.defer_active() {
            self.commands.push(Command::Relate {
                source,
                relation,
                target,
                payload: Some(Box::new(payload)),
            });
            return Ok(());
        }
        self.relate_boxed(source, relation, target, Some(Box::new(payload)))
    }

    /// Removes the triple if present; no-op otherwise.
    pub fn unrelate(&mut self, source: Entity, relation: ComponentID, target: Entity) {
        if self.defer_active() {
            self.commands.push(Command::Unrelate { source, relation, target });
            return;
        }
        self.relations.unrelate(source, relation, target);
    }

    /// Returns `true` if the triple exists.
    pub fn has_relation(&self, source: Entity, relation: ComponentID, target: Entity) -> bool {
        self.relations.has(source, relation, target)
    }

    /// Payload of the triple; absent when the triple is missing or carries
    /// none.
    pub fn get_relation(
        &self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
    ) -> Option<&dyn Any> {
        self.relations.payload(source, relation, target)
    }

    /// Typed payload of the triple.
    pub fn get_relation_as<T: 'static>(
        &self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
    ) -> Option<&T> {
        self.get_relation(source, relation, target)?.downcast_ref::<T>()
    }

    /// `(target, payload)` pairs for a source and relation, insertion order.
    pub fn targets(
        &self,
        source: Entity,
        relation: ComponentID,
    ) -> impl Iterator<Item = (Entity, Option<&dyn Any>)> + '_ {
        self.relations.targets(source, relation)
    }

    /// `(source, payload)` pairs for a relation and target, insertion order.
    pub fn sources(
        &self,
        relation: ComponentID,
        target: Entity,
    ) -> impl Iterator<Item = (Entity, Option<&dyn Any>)> + '_ {
        self.relations.sources(relation, target)
    }

    /// Enumerates every relation triple, for external serializers.
    pub fn relation_triples(
        &self,
    ) -> impl Iterator<Item = (Entity, ComponentID, Entity, Option<&dyn Any>)> + '_ {
        self.relations.triples()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Starts a query fetching the listed components.
    pub fn query(&self, fetch: &[ComponentID]) -> QueryBuilder<'_> {
        QueryBuilder::new(self, fetch)
    }

    pub(crate) fn cached_matches(&self, key: QueryKey) -> Vec<Entity> {
        if let Some(matches) = self.cache.borrow().lookup(&key, self.epoch) {
            return matches;
        }
        let matches = self.rebuild_matches(&key);
        self.cache.borrow_mut().store(key, matches.clone(), self.epoch);
        matches
    }

    fn rebuild_matches(&self, key: &QueryKey) -> Vec<Entity> {
        let required = key.required_signature();
        let forbidden = key.forbidden_signature();
        if required.intersects(&forbidden) {
            debug!("query requires and forbids the same component; no matches");
            return Vec::new();
        }
        for &component in key.required() {
            if self.registry.descriptor(component).is_none() {
                debug!("query requires unregistered component {component}; no matches");
                return Vec::new();
            }
        }

        let mut matches = Vec::new();
        if key.required().is_empty() {
            for entity in self.entities.iter_alive() {
                let signature = self.entities.signature(entity).unwrap_or(&Signature::EMPTY);
                if !signature.intersects(&forbidden) {
                    matches.push(entity);
                }
            }
            return matches;
        }

        // Rare-first: scan the smallest store among the required components.
        let rare = key
            .required()
            .iter()
            .copied()
            .min_by_key(|&c| self.stores[c as usize].len())
            .expect("required set is non-empty");
        for index in self.stores[rare as usize].indices() {
            let Some(entity) = self.entities.entity_at(index) else {
                continue;
            };
            let signature = self.entities.signature(entity).unwrap_or(&Signature::EMPTY);
            if signature.contains_all(&required) && !signature.intersects(&forbidden) {
                matches.push(entity);
            }
        }
        matches
    }

    // ── Change tracking ─────────────────────────────────────────────────

    /// Entities whose `component` was added this frame.
    pub fn added(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.tracker.added(component)
    }

    /// Entities whose `component` was removed this frame.
    pub fn removed(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.tracker.removed(component)
    }

    /// Entities whose `component` value changed this frame.
    pub fn changed(&self, component: ComponentID) -> impl Iterator<Item = Entity> + '_ {
        self.tracker.changed(component)
    }

    /// Resets all change sets. The scheduler calls this at end of step.
    pub fn clear_changes(&mut self) {
        self.tracker.clear();
    }

    /// Returns `true` if change tracking was enabled at construction.
    pub fn tracking_changes(&self) -> bool {
        self.tracker.enabled()
    }

    // ── Deferred commands ───────────────────────────────────────────────

    /// Enters deferred mode: direct mutators (set/add/remove/destroy,
    /// relate/unrelate) enqueue instead of applying, while reads observe the
    /// pre-flush state. [`flush`](Self::flush) leaves the mode.
    pub fn defer(&mut self) -> &mut Self {
        self.deferred_mode = true;
        self
    }

    /// Returns `true` if deferred mode is active.
    pub fn deferred(&self) -> bool {
        self.deferred_mode
    }

    // Mutators reroute only when deferred mode is on and no flush is
    // draining; command application during a flush always lands directly.
    fn defer_active(&self) -> bool {
        self.deferred_mode && !self.flushing
    }

    /// Reserves an entity id and enqueues its spawn.
    ///
    /// The returned handle is referenceable immediately (later deferred
    /// commands may target it) but resolves as not-alive until the flush
    /// consumes the spawn record.
    pub fn defer_spawn(&self) -> Entity {
        let entity = self.entities.reserve();
        self.commands.push(Command::Spawn { entity, callback: None });
        entity
    }

    /// Reserves an entity id and enqueues its spawn with a callback.
    ///
    /// The callback runs right after the spawn record is consumed, before
    /// the next command; deferred commands it enqueues flush in the same
    /// pass.
    pub fn defer_spawn_with(
        &self,
        callback: impl FnOnce(&mut World, Entity) -> WorldResult<()> + 'static,
    ) -> Entity {
        let entity = self.entities.reserve();
        self.commands.push(Command::Spawn {
            entity,
            callback: Some(Box::new(callback) as SpawnCallback),
        });
        entity
    }

    /// Enqueues a destroy.
    pub fn defer_destroy(&self, entity: Entity) -> &Self {
        self.commands.push(Command::Destroy { entity });
        self
    }

    /// Enqueues a tag add.
    pub fn defer_add(&self, entity: Entity, component: ComponentID) -> &Self {
        self.commands.push(Command::Add { entity, component });
        self
    }

    /// Enqueues a payload write.
    pub fn defer_set<T: 'static>(
        &self,
        entity: Entity,
        component: ComponentID,
        value: T,
    ) -> &Self {
        self.commands.push(Command::Set { entity, component, value: Box::new(value) });
        self
    }

    /// Enqueues a component removal.
    pub fn defer_remove(&self, entity: Entity, component: ComponentID) -> &Self {
        self.commands.push(Command::Remove { entity, component });
        self
    }

    /// Enqueues a relation insert.
    pub fn defer_relate(&self, source: Entity, relation: ComponentID, target: Entity) -> &Self {
        self.commands
            .push(Command::Relate { source, relation, target, payload: None });
        self
    }

    /// Enqueues a relation insert with a payload.
    pub fn defer_relate_with<T: 'static>(
        &self,
        source: Entity,
        relation: ComponentID,
        target: Entity,
        payload: T,
    ) -> &Self {
        self.commands.push(Command::Relate {
            source,
            relation,
            target,
            payload: Some(Box::new(payload)),
        });
        self
    }

    /// Enqueues a relation removal.
    pub fn defer_unrelate(&self, source: Entity, relation: ComponentID, target: Entity) -> &Self {
        self.commands.push(Command::Unrelate { source, relation, target });
        self
    }

    /// Returns `true` if deferred commands are pending.
    pub fn has_pending_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Drains the command buffer in insertion order, applying each command
    /// as the equivalent direct operation, and leaves deferred mode.
    ///
    /// Commands appended during the drain (by spawn callbacks or hooks) are
    /// consumed in the same pass. A command whose direct equivalent fails is
    /// skipped; with `debug` enabled the failure is logged. Re-entrant flush
    /// is a no-op.
    pub fn flush(&mut self) {
        if self.flushing {
            if self.options.debug {
                warn!("re-entrant flush ignored; outer drain continues");
            }
            return;
        }
        self.flushing = true;
        let mut applied = 0usize;
        while let Some(command) = self.commands.pop() {
            if let Err(error) = self.apply(command) {
                if self.options.debug {
                    warn!("deferred command failed: {error}");
                } else {
                    debug!("deferred command failed: {error}");
                }
            }
            applied += 1;
        }
        self.flushing = false;
        self.deferred_mode = false;
        if applied > 0 {
            debug!("flushed {applied} deferred commands");
        }
    }

    fn apply(&mut self, command: Command) -> WorldResult<()> {
        match command {
            Command::Spawn { entity, callback } => {
                if !self.entities.activate(entity) {
                    return Err(WorldError::UnknownEntity { entity });
                }
                self.epoch += 1;
                match callback {
                    Some(callback) => callback(self, entity),
                    None => Ok(()),
                }
            }
            Command::Destroy { entity } => self.destroy_now(entity),
            Command::Add { entity, component } => {
                let kind = self.registry.require(component)?.kind;
                if kind != StoreKind::Tag {
                    return Err(WorldError::WrongKind { component, kind });
                }
                self.add_now(entity, component)
            }
            Command::Set { entity, component, value } => {
                self.set_boxed(entity, component, value)
            }
            Command::Remove { entity, component } => {
                self.registry.require(component)?;
                if !self.entities.is_alive(entity) {
                    return Ok(());
                }
                self.remove_now(entity, component)
            }
            Command::Relate { source, relation, target, payload } => {
                self.relate_boxed(source, relation, target, payload)
            }
            Command::Unrelate { source, relation, target } => {
                self.relations.unrelate(source, relation, target);
                Ok(())
            }
        }
    }

    // ── Prefabs ─────────────────────────────────────────────────────────

    /// Starts a prefab template builder.
    pub fn prefab(&mut self) -> PrefabBuilder<'_> {
        PrefabBuilder::new(self)
    }

    pub(crate) fn register_prefab(&mut self, name: &str, prefab: Rc<Prefab>) {
        if self.prefabs.insert(name.to_owned(), prefab).is_some() {
            warn!("prefab '{name}' replaced");
        }
    }

    /// Retrieves a registered prefab by name.
    pub fn prefab_named(&self, name: &str) -> Option<Rc<Prefab>> {
        self.prefabs.get(name).cloned()
    }

    /// Spawns an entity from a prefab template, applying entries in
    /// template order through the same semantics as set/add.
    pub fn spawn_prefab(&mut self, prefab: &Prefab) -> WorldResult<Entity> {
        let entity = self.spawn();
        for entry in prefab.entries() {
            match entry {
                PrefabEntry::Value { component, produce } => {
                    let value = produce();
                    self.set_boxed(entity, *component, value)?;
                }
                PrefabEntry::Bare { component } => {
                    let component = *component;
                    let kind = self.registry.require(component)?.kind;
                    if kind != StoreKind::Tag {
                        return Err(WorldError::WrongKind { component, kind });
                    }
                    self.add_now(entity, component)?;
                }
            }
        }
        Ok(entity)
    }

    /// Spawns an entity from a named prefab.
    pub fn spawn_named(&mut self, name: &str) -> WorldResult<Entity> {
        let prefab = self
            .prefabs
            .get(name)
            .cloned()
            .ok_or_else(|| WorldError::UnknownPrefab { name: name.to_owned() })?;
        self.spawn_prefab(&prefab)
    }

    // ── Entity builder sugar ────────────────────────────────────────────

    /// Spawns an entity and returns a builder for attaching components.
    pub fn build(&mut self) -> EntityBuilder<'_> {
        let entity = self.spawn();
        EntityBuilder { world: self, entity }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldOptions::default())
    }
}

/// Fluent helper for spawning an entity with components.
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityBuilder<'w> {
    /// Sets a value component on the entity under construction.
    pub fn with_value<T: 'static>(self, component: ComponentID, value: T) -> WorldResult<Self> {
        self.world.set(self.entity, component, value)?;
        Ok(self)
    }

    /// Adds a tag component to the entity under construction.
    pub fn with(self, component: ComponentID) -> WorldResult<Self> {
        self.world.add(self.entity, component)?;
        Ok(self)
    }

    /// Finishes construction and returns the entity.
    pub fn finish(self) -> Entity {
        self.entity
    }
}
