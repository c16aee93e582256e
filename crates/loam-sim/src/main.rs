//! Headless loam simulation runner.
//!
//! This binary:
//! 1. Loads configuration (`LOAM_CONFIG` JSON, then `LOAM_*` overrides)
//! 2. Pregenerates terrain around the origin and spawns a seeded population
//! 3. Wires every spatial consumer to the chunk index, unless
//!    `LOAM_DISABLE_INDEX` rolls them back to the linear scan
//! 4. Runs the tick loop, logging telemetry every `report_every` ticks
//!
//! Set `RUST_LOG` to change verbosity, e.g. `RUST_LOG=loam_spatial=debug`.

mod config;
mod spawn;

use std::time::{Duration, Instant};

use loam_behavior::{
    BuildingSystem, ForagingSystem, SpatialConsumer, SwimmingSystem, TemperatureSystem,
    VisionSystem,
};
use loam_spatial::{ChunkKey, SharedIndex, SpatialIndex};
use loam_terrain::{MemoryChunkStore, NoiseTerrain};
use loam_tick::{MovementSystem, Scheduler, TerrainStreamingSystem, Throttle, World};
use tracing::{info, warn};

use crate::config::{BehaviorConfig, SimConfig};

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loam_sim=info".parse()?)
                .add_directive("loam_tick=info".parse()?),
        )
        .init();

    let config = SimConfig::load()?;
    info!(
        ticks = config.ticks,
        seed = config.terrain.seed,
        chunk_size = config.spatial.chunk_size,
        use_index = config.use_index,
        "Starting loam"
    );

    let mut world = build_world(&config)?;
    let mut scheduler = build_scheduler(&config, &mut world);
    info!("Systems: {:?}", scheduler.names());

    run(&config, &mut world, &mut scheduler)?;
    summarize(&world);
    Ok(())
}

fn build_world(config: &SimConfig) -> eyre::Result<World> {
    let index = SpatialIndex::from_config(&config.spatial)?;
    let terrain = MemoryChunkStore::new(
        index.chunk_size(),
        NoiseTerrain::from_config(&config.terrain),
    );
    let mut world = World::new(index, terrain, config.tick.dt)?;

    let start = Instant::now();
    let origin = ChunkKey::new(0, 0);
    let keys = (0..=config.terrain.pregenerate_radius).flat_map(|d| origin.ring(d));
    let generated = world.terrain_mut().pregenerate(keys);
    info!(chunks = generated, elapsed = ?start.elapsed(), "Pregenerated terrain");

    let spawned = spawn::populate(&mut world, &config.population, config.terrain.seed);
    let buckets = world.spatial_handle().read().bucket_count();
    info!(entities = spawned, buckets, "Spawned population");
    Ok(world)
}

/// Wires `consumer` to the index when one is given.
fn wired<C: SpatialConsumer>(mut consumer: C, index: Option<&SharedIndex>) -> C {
    if let Some(index) = index {
        consumer.wire(index.clone());
    }
    consumer
}

fn build_scheduler(config: &SimConfig, world: &mut World) -> Scheduler {
    let BehaviorConfig {
        vision_radius,
        vision_interval,
        forage_radius,
        forage_reach,
        forage_speed,
        forage_interval,
        warmth_radius,
        ambient_warmth,
        heat_intensity,
        warmth_interval,
        swim_interval,
        build_clearance,
        build_interval,
    } = config.behavior;

    let handle = config.use_index.then(|| world.spatial_handle());
    let index = handle.as_ref();
    if index.is_none() {
        warn!("Spatial index disabled; consumers use the linear scan");
    }

    let mut building = wired(
        BuildingSystem::new(build_clearance, Throttle::new(build_interval, 0)),
        index,
    );
    for request in spawn::build_requests(&config.population, config.terrain.seed) {
        building.request(request);
    }

    let mut scheduler = Scheduler::new().with_budget(config.tick.budget());
    scheduler
        .add(MovementSystem::new())
        .add(TerrainStreamingSystem::new(
            config.terrain.stream_radius_chunks,
            config.terrain.generation_budget,
        ))
        .add(wired(
            ForagingSystem::new(
                forage_radius,
                forage_reach,
                forage_speed,
                Throttle::new(forage_interval, 0),
            ),
            index,
        ))
        .add(SwimmingSystem::new(Throttle::new(swim_interval, 0)))
        .add(wired(
            TemperatureSystem::new(
                warmth_radius,
                ambient_warmth,
                heat_intensity,
                Throttle::new(warmth_interval, 1),
            ),
            index,
        ))
        .add(wired(
            VisionSystem::new(vision_radius, Throttle::new(vision_interval, 0)),
            index,
        ))
        .add(building);
    scheduler
}

fn run(config: &SimConfig, world: &mut World, scheduler: &mut Scheduler) -> eyre::Result<()> {
    let mut window = Duration::ZERO;
    let mut slowest = Duration::ZERO;

    for _ in 0..config.ticks {
        let report = scheduler.run_tick(world);
        window += report.total;
        slowest = slowest.max(report.total);

        if config.verify_each_tick {
            world.verify_index()?;
        }

        let ran = report.tick + 1;
        if ran % config.report_every == 0 || ran == config.ticks {
            let index = world.spatial_handle();
            let index = index.read();
            let ticks_in_window = (ran - 1) % config.report_every + 1;
            info!(
                tick = ran,
                entities = world.entities().len(),
                indexed = index.len(),
                buckets = index.bucket_count(),
                chunks = world.terrain().generated_count(),
                avg = ?(window / ticks_in_window as u32),
                ?slowest,
                "Tick report"
            );
            window = Duration::ZERO;
            slowest = Duration::ZERO;
        }
    }
    Ok(())
}

fn summarize(world: &World) {
    let index = world.spatial_handle();
    let index = index.read();
    let stats = index.stats();
    info!(
        inserts = stats.inserts,
        removes = stats.removes,
        chunk_crossings = stats.chunk_crossings,
        intra_chunk_moves = stats.intra_chunk_moves,
        rejected = stats.rejected,
        "Index maintenance"
    );
    info!(
        generated = world.terrain().generated_count(),
        generation_runs = world.terrain().generation_runs(),
        "Terrain"
    );

    match world.verify_index() {
        Ok(()) => info!("Index coherent at shutdown"),
        Err(e) => warn!("Index check failed at shutdown: {}", e),
    }
}
