//! Shared fixtures for the benches.

use weft::prelude::*;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
#[derive(Clone, Copy)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

pub struct Fixture {
    pub world: World,
    pub position: ComponentID,
    pub velocity: ComponentID,
    pub decoration: ComponentID,
}

/// World with `n` movable entities; every fourth one carries the
/// decoration tag so queries have something to filter.
pub fn populated(n: usize) -> Fixture {
    let mut world = World::default();
    let position = world.component::<Position>().unwrap();
    let velocity = world.component::<Velocity>().unwrap();
    let decoration = world.tag().unwrap();

    for i in 0..n {
        let e = world.spawn();
        world
            .set(e, position, Position { x: i as f32, y: 0.0 })
            .unwrap();
        world
            .set(e, velocity, Velocity { x: 1.0, y: 0.5 })
            .unwrap();
        if i % 4 == 0 {
            world.add(e, decoration).unwrap();
        }
    }

    Fixture { world, position, velocity, decoration }
}
