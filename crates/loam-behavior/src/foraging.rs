//! Seek and eat the nearest resource.

use loam_entity::{Entity, Tags, Velocity};
use loam_spatial::Nearest;
use loam_tick::{Phase, System, Throttle, World};
use tracing::{debug, trace};

use crate::{Proximity, SpatialConsumer};

/// Steers each agent toward its nearest `RESOURCE` and consumes it on
/// arrival. An agent that is itself a resource never targets itself.
///
/// Agents act in table order, and a consumed resource leaves the index
/// immediately, so a later agent in the same tick never targets it.
#[derive(Debug)]
pub struct ForagingSystem {
    proximity: Proximity,
    throttle: Throttle,
    search_radius: f64,
    reach: f64,
    speed: f64,
    consumed: u64,
}

impl ForagingSystem {
    #[must_use]
    pub fn new(search_radius: f64, reach: f64, speed: f64, throttle: Throttle) -> Self {
        Self {
            proximity: Proximity::unwired(),
            throttle,
            search_radius,
            reach,
            speed,
            consumed: 0,
        }
    }

    /// Resources eaten so far.
    #[must_use]
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    fn forage(&mut self, world: &mut World, agent: Entity) {
        let Some(position) = world.get(agent).map(|r| r.position) else {
            return;
        };

        let mut nearest = Nearest::new();
        let result = self.proximity.for_each_within(
            world,
            position,
            self.search_radius,
            Tags::RESOURCE,
            &mut |candidate, at| {
                if candidate != agent {
                    nearest.offer(candidate, at.distance_squared(position));
                }
            },
        );
        if let Err(err) = result {
            debug!(%agent, %err, "foraging skipped");
            return;
        }
        let Some(target) = nearest.entity() else {
            return;
        };
        let Some(goal) = world.get(target).map(|r| r.position) else {
            return;
        };

        if position.distance_squared(goal) <= self.reach * self.reach {
            world.despawn(target);
            world.set_velocity(agent, Velocity::ZERO);
            self.consumed += 1;
            trace!(%agent, %target, "consumed resource");
        } else {
            world.set_velocity(agent, Velocity::towards(position, goal, self.speed));
        }
    }
}

impl SpatialConsumer for ForagingSystem {
    fn proximity(&self) -> &Proximity {
        &self.proximity
    }

    fn proximity_mut(&mut self) -> &mut Proximity {
        &mut self.proximity
    }
}

impl System for ForagingSystem {
    fn name(&self) -> &'static str {
        "foraging"
    }

    fn phase(&self) -> Phase {
        Phase::Decision
    }

    fn run(&mut self, world: &mut World) {
        if !self.throttle.ready(world.tick()) {
            return;
        }
        for agent in world.entities().ids_with_tags(Tags::AGENT) {
            self.forage(world, agent);
        }
    }
}
