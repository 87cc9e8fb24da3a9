use std::cell::RefCell;
use std::rc::Rc;

use weft::prelude::*;

#[derive(Clone, Copy, PartialEq, Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[test]
fn names_are_unique_and_lookups_fail_loudly() {
    let mut scheduler = Scheduler::new();
    scheduler
        .add_system("tick", Phase::Update, SystemAccess::none(), |_world, _dt| Ok(()))
        .unwrap();

    assert!(matches!(
        scheduler.add_system("tick", Phase::Render, SystemAccess::none(), |_w, _dt| Ok(())),
        Err(WorldError::DuplicateSystem { .. })
    ));
    assert!(matches!(
        scheduler.remove_system("nope"),
        Err(WorldError::UnknownSystem { .. })
    ));
    assert!(matches!(
        scheduler.enable_system("nope"),
        Err(WorldError::UnknownSystem { .. })
    ));

    scheduler.remove_system("tick").unwrap();
    assert!(scheduler.is_empty());
}

#[test]
fn phases_run_in_fixed_order_and_systems_in_insertion_order() {
    let mut world = World::default();
    let mut scheduler = Scheduler::new();
    let trace = Rc::new(RefCell::new(Vec::<&'static str>::new()));

    let entries: [(&str, Phase, &'static str); 5] = [
        ("render", Phase::Render, "render"),
        ("pre-a", Phase::PreUpdate, "pre-a"),
        ("update", Phase::Update, "update"),
        ("pre-b", Phase::PreUpdate, "pre-b"),
        ("post", Phase::PostUpdate, "post"),
    ];
    for (name, phase, label) in entries {
        let log = trace.clone();
        scheduler
            .add_system(name, phase, SystemAccess::none(), move |_world, _dt| {
                log.borrow_mut().push(label);
                Ok(())
            })
            .unwrap();
    }

    scheduler.step(&mut world, 0.016).unwrap();
    assert_eq!(
        *trace.borrow(),
        vec!["pre-a", "pre-b", "update", "post", "render"]
    );
}

#[test]
fn disabled_systems_are_skipped_until_reenabled() {
    let mut world = World::default();
    let mut scheduler = Scheduler::new();
    let runs = Rc::new(RefCell::new(0));

    let counter = runs.clone();
    scheduler
        .add_system("tick", Phase::Update, SystemAccess::none(), move |_w, _dt| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();

    scheduler.step(&mut world, 0.016).unwrap();
    scheduler.disable_system("tick").unwrap();
    assert_eq!(scheduler.is_enabled("tick"), Some(false));
    scheduler.step(&mut world, 0.016).unwrap();
    scheduler.enable_system("tick").unwrap();
    scheduler.step(&mut world, 0.016).unwrap();

    assert_eq!(*runs.borrow(), 2);
}

#[test]
fn commands_from_one_phase_are_visible_to_the_next() {
    let mut world = World::default();
    let position = world.component::<Position>().unwrap();
    let e = world.spawn();

    let mut scheduler = Scheduler::new();
    scheduler
        .add_system(
            "writer",
            Phase::PreUpdate,
            SystemAccess::new(&[], &[position]),
            move |world: &mut World, _dt| {
                world.defer_set(e, position, Position { x: 4.0, y: 2.0 });
                Ok(())
            },
        )
        .unwrap();

    let observed = Rc::new(RefCell::new(None));
    let out = observed.clone();
    scheduler
        .add_system(
            "reader",
            Phase::Update,
            SystemAccess::new(&[position], &[]),
            move |world: &mut World, _dt| {
                *out.borrow_mut() = world.get::<Position>(e, position).copied();
                Ok(())
            },
        )
        .unwrap();

    scheduler.step(&mut world, 0.016).unwrap();
    assert_eq!(*observed.borrow(), Some(Position { x: 4.0, y: 2.0 }));
}

#[test]
fn step_flushes_pending_commands_and_clears_change_sets() {
    let mut world = World::new(WorldOptions::default().with_track_changes(true));
    let position = world.component::<Position>().unwrap();
    let mut scheduler = Scheduler::new();

    let e = world.defer_spawn();
    world.defer_set(e, position, Position { x: 1.0, y: 1.0 });

    scheduler.step(&mut world, 0.016).unwrap();
    assert!(world.alive(e));
    assert!(!world.has_pending_commands());
    assert_eq!(world.added(position).count(), 0, "step clears change sets");
}

#[test]
fn access_metadata_is_preserved_for_diagnostics() {
    let mut scheduler = Scheduler::new();
    scheduler
        .add_system(
            "mover",
            Phase::Update,
            SystemAccess::new(&[1, 2], &[0]),
            |_w, _dt| Ok(()),
        )
        .unwrap();

    let access = scheduler.access_of("mover").unwrap();
    assert_eq!(access.reads, vec![1, 2]);
    assert_eq!(access.writes, vec![0]);
    assert_eq!(scheduler.systems_in(Phase::Update).collect::<Vec<_>>(), vec!["mover"]);
}

#[test]
fn run_phase_only_touches_that_phase() {
    let mut world = World::default();
    let mut scheduler = Scheduler::new();
    let trace = Rc::new(RefCell::new(Vec::<&'static str>::new()));

    let log = trace.clone();
    scheduler
        .add_system("pre", Phase::PreUpdate, SystemAccess::none(), move |_w, _dt| {
            log.borrow_mut().push("pre");
            Ok(())
        })
        .unwrap();
    let log = trace.clone();
    scheduler
        .add_system("render", Phase::Render, SystemAccess::none(), move |_w, _dt| {
            log.borrow_mut().push("render");
            Ok(())
        })
        .unwrap();

    scheduler.run_phase(&mut world, Phase::Render, 0.016).unwrap();
    assert_eq!(*trace.borrow(), vec!["render"]);
}
