use std::cell::RefCell;
use std::rc::Rc;

use weft::prelude::*;

#[derive(Clone, Copy, PartialEq, Debug)]
struct Health(i32);
#[derive(Clone, Copy, PartialEq, Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[test]
fn set_then_get_roundtrip() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let e = world.spawn();
    world.set(e, health, Health(100)).unwrap();

    assert_eq!(world.get::<Health>(e, health), Some(&Health(100)));
    assert!(world.has(e, &[health]));

    world.set(e, health, Health(60)).unwrap();
    assert_eq!(world.get::<Health>(e, health), Some(&Health(60)));
}

#[test]
fn tag_add_remove_and_idempotence() {
    let mut world = World::default();
    let frozen = world.tag().unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    world.on_add(frozen, move |_world: &mut World, _e: Entity| {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    let e = world.spawn();
    world.add(e, frozen).unwrap();
    world.add(e, frozen).unwrap();
    assert!(world.has(e, &[frozen]));
    assert_eq!(*fired.borrow(), 1, "second add of a present tag fires no hook");

    world.remove(e, frozen).unwrap();
    assert!(!world.has(e, &[frozen]));

    // Removing an absent component is a no-op.
    world.remove(e, frozen).unwrap();
    assert!(!world.has(e, &[frozen]));
}

#[test]
fn wrong_kind_is_rejected() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();
    let frozen = world.tag().unwrap();

    let e = world.spawn();
    assert!(matches!(
        world.set(e, frozen, Health(1)),
        Err(WorldError::WrongKind { .. })
    ));
    assert!(matches!(
        world.add(e, health),
        Err(WorldError::WrongKind { .. })
    ));
}

#[test]
fn payload_type_mismatch_is_rejected() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let e = world.spawn();
    let err = world
        .set(e, health, Position { x: 0.0, y: 0.0 })
        .unwrap_err();
    assert!(matches!(err, WorldError::TypeMismatch(_)));
    assert_eq!(world.get::<Health>(e, health), None);
}

#[test]
fn set_on_dead_entity_fails_while_destroy_is_a_noop() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let e = world.spawn();
    world.destroy(e).unwrap();

    assert!(matches!(
        world.set(e, health, Health(1)),
        Err(WorldError::UnknownEntity { .. })
    ));
    world.destroy(e).unwrap();
    world.remove(e, health).unwrap();
    assert_eq!(world.get::<Health>(e, health), None);
    assert!(!world.has(e, &[health]));
}

#[test]
fn destroy_recycles_the_slot_with_a_newer_generation() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let stale = world.spawn();
    world.set(stale, health, Health(5)).unwrap();
    world.destroy(stale).unwrap();
    assert!(!world.alive(stale));

    let fresh = world.spawn();
    assert_eq!(fresh.index(), stale.index());
    assert!(fresh.generation() > stale.generation());
    assert!(world.alive(fresh));
    assert!(!world.alive(stale));

    // The recycled slot starts clean.
    assert_eq!(world.get::<Health>(fresh, health), None);
    assert_eq!(world.get::<Health>(stale, health), None);
}

#[test]
fn signature_mirrors_store_membership() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();
    let position = world.component::<Position>().unwrap();
    let frozen = world.tag().unwrap();

    let e = world.spawn();
    world.set(e, health, Health(10)).unwrap();
    world.set(e, position, Position { x: 1.0, y: 2.0 }).unwrap();
    world.add(e, frozen).unwrap();

    let signature = world.signature_of(e).unwrap();
    let bits: Vec<ComponentID> = signature.iter().collect();
    assert_eq!(bits, vec![health, position, frozen]);

    world.remove(e, position).unwrap();
    let bits: Vec<ComponentID> = world.signature_of(e).unwrap().iter().collect();
    assert_eq!(bits, vec![health, frozen]);
}

#[test]
fn hook_order_and_payloads() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let events = Rc::new(RefCell::new(Vec::<String>::new()));

    let log = events.clone();
    world.on_add(health, move |_world: &mut World, _e: Entity| {
        log.borrow_mut().push("add".into());
        Ok(())
    });
    let log = events.clone();
    world.on_change(health, move |world: &mut World, e: Entity, old| {
        let old = old.downcast_ref::<Health>().unwrap().0;
        let new = world.get::<Health>(e, health).unwrap().0;
        log.borrow_mut().push(format!("change {old}->{new}"));
        Ok(())
    });
    let log = events.clone();
    world.on_remove(health, move |_world: &mut World, _e: Entity, old| {
        let old = old.downcast_ref::<Health>().unwrap().0;
        log.borrow_mut().push(format!("remove {old}"));
        Ok(())
    });

    let e = world.spawn();
    world.set(e, health, Health(10)).unwrap();
    world.set(e, health, Health(7)).unwrap();
    world.remove(e, health).unwrap();

    assert_eq!(
        *events.borrow(),
        vec!["add".to_string(), "change 10->7".into(), "remove 7".into()]
    );
}

#[test]
fn hooks_observe_post_event_state_and_may_mutate() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();
    let wounded = world.tag().unwrap();

    // Tag entities as wounded whenever their health drops below 50.
    world.on_change(health, move |world: &mut World, e: Entity, _old| {
        if world.get::<Health>(e, health).unwrap().0 < 50 {
            world.add(e, wounded)?;
        }
        Ok(())
    });

    let e = world.spawn();
    world.set(e, health, Health(100)).unwrap();
    assert!(!world.has(e, &[wounded]));

    world.set(e, health, Health(30)).unwrap();
    assert!(world.has(e, &[wounded]));
}

#[test]
fn unsubscribe_stops_delivery() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let fired = Rc::new(RefCell::new(0));
    let counter = fired.clone();
    let hook = world.on_add(health, move |_world: &mut World, _e: Entity| {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    let a = world.spawn();
    world.set(a, health, Health(1)).unwrap();
    assert!(world.unsubscribe(hook));
    assert!(!world.unsubscribe(hook));

    let b = world.spawn();
    world.set(b, health, Health(1)).unwrap();
    assert_eq!(*fired.borrow(), 1);
}

#[test]
fn destroy_fires_remove_hooks_with_values() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();
    let frozen = world.tag().unwrap();

    let removed = Rc::new(RefCell::new(Vec::<Option<i32>>::new()));

    let log = removed.clone();
    world.on_remove(health, move |_world: &mut World, _e: Entity, old| {
        log.borrow_mut().push(old.downcast_ref::<Health>().map(|h| h.0));
        Ok(())
    });
    let log = removed.clone();
    world.on_remove(frozen, move |_world: &mut World, _e: Entity, old| {
        assert!(old.is_absent());
        log.borrow_mut().push(None);
        Ok(())
    });

    let e = world.spawn();
    world.set(e, health, Health(42)).unwrap();
    world.add(e, frozen).unwrap();
    world.destroy(e).unwrap();

    assert_eq!(*removed.borrow(), vec![Some(42), None]);
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn entity_builder_chains() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();
    let frozen = world.tag().unwrap();

    let e = world
        .build()
        .with_value(health, Health(20))
        .unwrap()
        .with(frozen)
        .unwrap()
        .finish();

    assert!(world.has(e, &[health, frozen]));
    assert_eq!(world.get::<Health>(e, health), Some(&Health(20)));
}

#[test]
fn default_producer_is_descriptor_metadata() {
    let mut world = World::default();
    let health = world
        .component_with_default::<Health>(|| Health(100))
        .unwrap();

    let produced = world
        .descriptor(health)
        .and_then(|desc| desc.default.clone())
        .map(|producer| producer())
        .unwrap();
    assert_eq!(produced.downcast_ref::<Health>(), Some(&Health(100)));

    // The producer is metadata only; add stays tag-only.
    let e = world.spawn();
    assert!(matches!(
        world.add(e, health),
        Err(WorldError::WrongKind { .. })
    ));
}

#[test]
fn dense_kind_aliases_sparse_storage() {
    let mut world = World::default();
    let position = world.dense_component::<Position>().unwrap();

    assert_eq!(world.descriptor(position).unwrap().kind, StoreKind::Dense);

    let e = world.spawn();
    world.set(e, position, Position { x: 3.0, y: 4.0 }).unwrap();
    assert_eq!(
        world.get::<Position>(e, position),
        Some(&Position { x: 3.0, y: 4.0 })
    );
}

#[test]
fn enumerability_for_serializers() {
    let mut world = World::default();
    let health = world.component::<Health>().unwrap();

    let a = world.spawn();
    let b = world.spawn();
    world.set(a, health, Health(1)).unwrap();
    world.set(b, health, Health(2)).unwrap();

    let all: Vec<Entity> = world.entities().collect();
    assert_eq!(all, vec![a, b]);
    assert_eq!(world.entity_count(), 2);
    assert_eq!(world.component_count(), 1);
    assert_eq!(world.component_descriptors().count(), 1);
}
