//! Velocity integration.

use loam_entity::{Entity, Position};

use crate::{Phase, System, World};

/// Applies each entity's velocity for one tick.
///
/// Runs in the update phase so every position change reaches the index
/// before decision systems query it.
#[derive(Debug, Default)]
pub struct MovementSystem {
    moves: Vec<(Entity, Position)>,
}

impl MovementSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn phase(&self) -> Phase {
        Phase::Update
    }

    fn run(&mut self, world: &mut World) {
        let dt = world.dt();
        self.moves.clear();
        self.moves.extend(
            world
                .entities()
                .iter()
                .filter(|(_, record)| !record.velocity.is_zero())
                .map(|(entity, record)| (entity, record.position + record.velocity * dt)),
        );

        for &(entity, position) in &self.moves {
            world.set_position(entity, position);
        }
    }
}
