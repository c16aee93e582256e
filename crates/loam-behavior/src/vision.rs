//! Perception: what each agent can see.

use hashbrown::HashMap;
use loam_entity::{Entity, Tags};
use loam_tick::{Phase, System, Throttle, World};
use tracing::debug;

use crate::{Proximity, SpatialConsumer};

/// What one agent saw on its last look.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sighting {
    /// Other agents, not counting the observer.
    pub agents: usize,
    pub resources: usize,
    pub plants: usize,
}

#[derive(Debug)]
pub struct VisionSystem {
    proximity: Proximity,
    throttle: Throttle,
    radius: f64,
    sightings: HashMap<Entity, Sighting>,
}

impl VisionSystem {
    #[must_use]
    pub fn new(radius: f64, throttle: Throttle) -> Self {
        Self {
            proximity: Proximity::unwired(),
            throttle,
            radius,
            sightings: HashMap::new(),
        }
    }

    #[must_use]
    pub fn sighting(&self, agent: Entity) -> Option<Sighting> {
        self.sightings.get(&agent).copied()
    }

    #[must_use]
    pub const fn sightings(&self) -> &HashMap<Entity, Sighting> {
        &self.sightings
    }

    fn look(&self, world: &World, agent: Entity) -> Option<Sighting> {
        let center = world.get(agent)?.position;
        let mut sighting = Sighting::default();

        let result = self.proximity.for_each_within(
            world,
            center,
            self.radius,
            Tags::empty(),
            &mut |seen, _| {
                let Some(record) = world.get(seen) else {
                    return;
                };
                if seen != agent && record.tags.contains(Tags::AGENT) {
                    sighting.agents += 1;
                }
                if record.tags.contains(Tags::RESOURCE) {
                    sighting.resources += 1;
                }
                if record.tags.contains(Tags::PLANT) {
                    sighting.plants += 1;
                }
            },
        );

        match result {
            Ok(()) => Some(sighting),
            Err(err) => {
                debug!(%agent, %err, "vision skipped");
                None
            }
        }
    }
}

impl SpatialConsumer for VisionSystem {
    fn proximity(&self) -> &Proximity {
        &self.proximity
    }

    fn proximity_mut(&mut self) -> &mut Proximity {
        &mut self.proximity
    }
}

impl System for VisionSystem {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn phase(&self) -> Phase {
        Phase::Decision
    }

    fn run(&mut self, world: &mut World) {
        if !self.throttle.ready(world.tick()) {
            return;
        }

        self.sightings.retain(|agent, _| world.get(*agent).is_some());
        for agent in world.entities().ids_with_tags(Tags::AGENT) {
            if let Some(sighting) = self.look(world, agent) {
                self.sightings.insert(agent, sighting);
            }
        }
    }
}
