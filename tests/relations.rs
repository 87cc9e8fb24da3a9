use weft::prelude::*;

#[derive(Clone, Copy, PartialEq, Debug)]
struct Strength(u32);

fn hierarchy_world() -> (World, ComponentID) {
    let mut world = World::default();
    let child_of = world.tag().unwrap();
    (world, child_of)
}

#[test]
fn relate_get_unrelate_roundtrip() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();

    world
        .relate_with(child, child_of, parent, Strength(3))
        .unwrap();
    assert!(world.has_relation(child, child_of, parent));
    assert_eq!(
        world.get_relation_as::<Strength>(child, child_of, parent),
        Some(&Strength(3))
    );

    world.unrelate(child, child_of, parent);
    assert!(!world.has_relation(child, child_of, parent));
    assert!(world.get_relation(child, child_of, parent).is_none());
}

#[test]
fn payload_is_optional_and_overwritable() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();

    world.relate(child, child_of, parent).unwrap();
    assert!(world.has_relation(child, child_of, parent));
    assert!(world.get_relation(child, child_of, parent).is_none());

    world
        .relate_with(child, child_of, parent, Strength(1))
        .unwrap();
    world
        .relate_with(child, child_of, parent, Strength(9))
        .unwrap();
    assert_eq!(
        world.get_relation_as::<Strength>(child, child_of, parent),
        Some(&Strength(9))
    );
}

#[test]
fn targets_and_sources_read_in_insertion_order() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let a = world.spawn();
    let b = world.spawn();
    let c = world.spawn();

    world.relate(a, child_of, parent).unwrap();
    world.relate(b, child_of, parent).unwrap();
    world.relate(c, child_of, parent).unwrap();

    let sources: Vec<Entity> = world.sources(child_of, parent).map(|(s, _)| s).collect();
    assert_eq!(sources, vec![a, b, c]);

    let favorite = world.tag().unwrap();
    world.relate(parent, favorite, c).unwrap();
    world.relate(parent, favorite, a).unwrap();

    // Overwriting keeps the original position.
    world.relate_with(parent, favorite, c, Strength(1)).unwrap();
    let targets: Vec<Entity> = world.targets(parent, favorite).map(|(t, _)| t).collect();
    assert_eq!(targets, vec![c, a]);
}

#[test]
fn destroy_cleans_both_directions() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();

    world.relate(child, child_of, parent).unwrap();
    world.destroy(parent).unwrap();

    assert_eq!(world.sources(child_of, parent).count(), 0);
    assert!(!world.has_relation(child, child_of, parent));
    assert_eq!(world.targets(child, child_of).count(), 0);
    assert_eq!(world.relation_triples().count(), 0);
}

#[test]
fn destroy_removes_outgoing_edges_too() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();
    let sibling = world.spawn();

    world.relate(child, child_of, parent).unwrap();
    world.relate(child, child_of, sibling).unwrap();
    world.destroy(child).unwrap();

    assert_eq!(world.sources(child_of, parent).count(), 0);
    assert_eq!(world.sources(child_of, sibling).count(), 0);
    assert_eq!(world.relation_triples().count(), 0);
    assert!(world.alive(parent) && world.alive(sibling));
}

#[test]
fn self_relation_is_cleaned_on_destroy() {
    let (mut world, child_of) = hierarchy_world();
    let snake = world.spawn();

    world.relate(snake, child_of, snake).unwrap();
    assert!(world.has_relation(snake, child_of, snake));

    world.destroy(snake).unwrap();
    assert_eq!(world.relation_triples().count(), 0);
}

#[test]
fn relations_require_live_endpoints_and_known_labels() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();
    world.destroy(parent).unwrap();

    assert!(matches!(
        world.relate(child, child_of, parent),
        Err(WorldError::UnknownEntity { .. })
    ));
    assert!(matches!(
        world.relate(child, 99, child),
        Err(WorldError::UnknownComponent { .. })
    ));
}

#[test]
fn stale_handles_in_payloads_resolve_dead() {
    let (mut world, child_of) = hierarchy_world();
    let parent = world.spawn();
    let child = world.spawn();
    let keepsake = world.spawn();

    // Entity ids are plain values; a payload may carry one that outlives
    // the entity it references.
    world.relate_with(child, child_of, parent, keepsake).unwrap();
    world.destroy(keepsake).unwrap();

    let remembered = *world
        .get_relation_as::<Entity>(child, child_of, parent)
        .unwrap();
    assert_eq!(remembered, keepsake);
    assert!(!world.alive(remembered));
}
