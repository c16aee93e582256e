//! Seeded world population.

use loam_behavior::BuildRequest;
use loam_entity::{EntityRecord, Position, Tags, Velocity};
use loam_tick::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PopulationConfig;

fn scatter(rng: &mut StdRng, spread: f64) -> Position {
    if spread <= 0.0 {
        return Position::default();
    }
    Position::new(rng.random_range(-spread..spread), rng.random_range(-spread..spread))
}

fn wander(rng: &mut StdRng, max_speed: f64) -> Velocity {
    if max_speed <= 0.0 {
        return Velocity::default();
    }
    Velocity::new(
        rng.random_range(-max_speed..max_speed),
        rng.random_range(-max_speed..max_speed),
    )
}

/// Spawns the configured population. Returns the number of entities.
pub fn populate(world: &mut World, config: &PopulationConfig, seed: u64) -> usize {
    let mut rng = StdRng::seed_from_u64(seed);
    let groups = [
        (config.agents, Tags::AGENT),
        (config.animals, Tags::AGENT | Tags::ANIMAL),
        (config.resources, Tags::RESOURCE),
        (config.plants, Tags::PLANT | Tags::RESOURCE),
        (config.heat_sources, Tags::HEAT_SOURCE),
    ];

    let mut spawned = 0;
    for (count, tags) in groups {
        for _ in 0..count {
            let mut record = EntityRecord::new(scatter(&mut rng, config.spread), tags);
            if tags.contains(Tags::AGENT) {
                record.velocity = wander(&mut rng, config.max_speed);
            }
            world.spawn_record(record);
        }
        spawned += count;
    }
    spawned
}

/// Construction requests scattered over the same area.
pub fn build_requests(config: &PopulationConfig, seed: u64) -> Vec<BuildRequest> {
    let mut rng = StdRng::seed_from_u64(seed.rotate_left(17) ^ 0xb111d);
    (0..config.build_requests)
        .map(|_| BuildRequest {
            position: scatter(&mut rng, config.spread),
            requester: None,
        })
        .collect()
}
