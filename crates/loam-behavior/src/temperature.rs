//! Warmth from nearby heat sources.

use hashbrown::HashMap;
use loam_entity::{Entity, Tags};
use loam_tick::{Phase, System, Throttle, World};
use smallvec::SmallVec;
use tracing::debug;

use crate::{Proximity, SpatialConsumer};

/// Per-agent warmth: `ambient` plus, for each `HEAT_SOURCE` within
/// `radius`, a contribution falling linearly from `intensity` at the source
/// to zero at the radius.
#[derive(Debug)]
pub struct TemperatureSystem {
    proximity: Proximity,
    throttle: Throttle,
    radius: f64,
    ambient: f64,
    intensity: f64,
    warmth: HashMap<Entity, f64>,
}

impl TemperatureSystem {
    #[must_use]
    pub fn new(radius: f64, ambient: f64, intensity: f64, throttle: Throttle) -> Self {
        Self {
            proximity: Proximity::unwired(),
            throttle,
            radius,
            ambient,
            intensity,
            warmth: HashMap::new(),
        }
    }

    #[must_use]
    pub fn warmth(&self, agent: Entity) -> Option<f64> {
        self.warmth.get(&agent).copied()
    }

    #[must_use]
    pub const fn all_warmth(&self) -> &HashMap<Entity, f64> {
        &self.warmth
    }

    fn sample(&self, world: &World, agent: Entity) -> Option<f64> {
        let center = world.get(agent)?.position;
        let mut distances: SmallVec<[f64; 16]> = SmallVec::new();

        let result = self.proximity.for_each_within(
            world,
            center,
            self.radius,
            Tags::HEAT_SOURCE,
            &mut |source, position| {
                if source != agent {
                    distances.push(position.distance(center));
                }
            },
        );
        if let Err(err) = result {
            debug!(%agent, %err, "temperature skipped");
            return None;
        }

        // Summation order is fixed so both query paths give equal floats.
        distances.sort_unstable_by(f64::total_cmp);
        let heat: f64 = distances
            .iter()
            .map(|d| {
                if self.radius > 0.0 {
                    self.intensity * (1.0 - d / self.radius)
                } else {
                    self.intensity
                }
            })
            .sum();
        Some(self.ambient + heat)
    }
}

impl SpatialConsumer for TemperatureSystem {
    fn proximity(&self) -> &Proximity {
        &self.proximity
    }

    fn proximity_mut(&mut self) -> &mut Proximity {
        &mut self.proximity
    }
}

impl System for TemperatureSystem {
    fn name(&self) -> &'static str {
        "temperature"
    }

    fn phase(&self) -> Phase {
        Phase::Decision
    }

    fn priority(&self) -> i32 {
        20
    }

    fn run(&mut self, world: &mut World) {
        if !self.throttle.ready(world.tick()) {
            return;
        }

        self.warmth.retain(|agent, _| world.get(*agent).is_some());
        for agent in world.entities().ids_with_tags(Tags::AGENT) {
            if let Some(warmth) = self.sample(world, agent) {
                self.warmth.insert(agent, warmth);
            }
        }
    }
}
