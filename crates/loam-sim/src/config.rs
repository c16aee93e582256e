//! Runner configuration: optional JSON file, then environment overrides.

use std::path::Path;

use eyre::{WrapErr, bail};
use loam_spatial::SpatialConfig;
use loam_terrain::TerrainConfig;
use loam_tick::TickConfig;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub agents: usize,
    /// Agents that are also animals.
    pub animals: usize,
    pub resources: usize,
    /// Plants double as resources.
    pub plants: usize,
    pub heat_sources: usize,
    /// Half-width of the square around the origin entities spawn in.
    pub spread: f64,
    /// Per-axis bound on initial agent velocity, tiles per second.
    pub max_speed: f64,
    pub build_requests: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            agents: 800,
            animals: 200,
            resources: 2_000,
            plants: 600,
            heat_sources: 60,
            spread: 256.0,
            max_speed: 4.0,
            build_requests: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub vision_radius: f64,
    pub vision_interval: u64,
    pub forage_radius: f64,
    pub forage_reach: f64,
    pub forage_speed: f64,
    pub forage_interval: u64,
    pub warmth_radius: f64,
    pub ambient_warmth: f64,
    pub heat_intensity: f64,
    pub warmth_interval: u64,
    pub swim_interval: u64,
    pub build_clearance: f64,
    pub build_interval: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            vision_radius: 16.0,
            vision_interval: 2,
            forage_radius: 24.0,
            forage_reach: 1.0,
            forage_speed: 3.0,
            forage_interval: 1,
            warmth_radius: 20.0,
            ambient_warmth: 10.0,
            heat_intensity: 5.0,
            warmth_interval: 4,
            swim_interval: 1,
            build_clearance: 8.0,
            build_interval: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ticks: u64,
    /// Wire consumers to the chunk index. Off rolls every consumer back to
    /// the linear scan.
    pub use_index: bool,
    /// Check index against entity table after every tick.
    pub verify_each_tick: bool,
    /// Ticks between telemetry lines.
    pub report_every: u64,
    pub spatial: SpatialConfig,
    pub terrain: TerrainConfig,
    pub tick: TickConfig,
    pub population: PopulationConfig,
    pub behavior: BehaviorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            use_index: true,
            verify_each_tick: false,
            report_every: 100,
            spatial: SpatialConfig::default(),
            terrain: TerrainConfig::default(),
            tick: TickConfig::default(),
            population: PopulationConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reads the process environment.
    pub fn load() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `LOAM_CONFIG` names an optional JSON file; `LOAM_TICKS`, `LOAM_SEED`,
    /// `LOAM_CHUNK_SIZE`, `LOAM_DISABLE_INDEX` and `LOAM_VERIFY` override it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = match lookup("LOAM_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(ticks) = parse_var(&lookup, "LOAM_TICKS")? {
            config.ticks = ticks;
        }
        if let Some(seed) = parse_var(&lookup, "LOAM_SEED")? {
            config.terrain.seed = seed;
        }
        if let Some(size) = parse_var(&lookup, "LOAM_CHUNK_SIZE")? {
            config.spatial.chunk_size = size;
        }
        if let Some(disable) = flag_var(&lookup, "LOAM_DISABLE_INDEX")? {
            config.use_index = !disable;
        }
        if let Some(verify) = flag_var(&lookup, "LOAM_VERIFY")? {
            config.verify_each_tick = verify;
        }

        if config.report_every == 0 {
            config.report_every = 1;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).wrap_err_with(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> eyre::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> eyre::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .wrap_err_with(|| format!("{key}={raw:?} is not valid"))
        })
        .transpose()
}

fn flag_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> eyre::Result<Option<bool>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "" | "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => bail!("{key}={raw:?} is not a flag"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |key| vars.get(key).map(ToString::to_string)
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = SimConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SimConfig::default());
        assert!(config.use_index);
    }

    #[test]
    fn env_overrides_apply() {
        let config = SimConfig::from_lookup(lookup(&[
            ("LOAM_TICKS", "25"),
            ("LOAM_SEED", " 99 "),
            ("LOAM_CHUNK_SIZE", "16"),
            ("LOAM_DISABLE_INDEX", "yes"),
            ("LOAM_VERIFY", "1"),
        ]))
        .unwrap();

        assert_eq!(config.ticks, 25);
        assert_eq!(config.terrain.seed, 99);
        assert_eq!(config.spatial.chunk_size, 16);
        assert!(!config.use_index);
        assert!(config.verify_each_tick);
    }

    #[test]
    fn malformed_override_is_an_error() {
        assert!(SimConfig::from_lookup(lookup(&[("LOAM_TICKS", "lots")])).is_err());
        assert!(SimConfig::from_lookup(lookup(&[("LOAM_VERIFY", "maybe")])).is_err());
        assert!(SimConfig::from_lookup(lookup(&[("LOAM_CONFIG", "/nonexistent/loam.json")])).is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(
            r#"{
                "ticks": 10,
                "spatial": { "chunk_size": 8 },
                "population": { "agents": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.ticks, 10);
        assert_eq!(config.spatial.chunk_size, 8);
        assert!(config.spatial.prune_empty_buckets);
        assert_eq!(config.population.agents, 3);
        assert_eq!(config.population.resources, PopulationConfig::default().resources);
        assert_eq!(config.behavior, BehaviorConfig::default());
    }

    #[test]
    fn env_overrides_file() {
        let path = std::env::temp_dir().join(format!("loam-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "ticks": 10, "use_index": true }"#).unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let config = SimConfig::from_lookup(lookup(&[
            ("LOAM_CONFIG", &path_str),
            ("LOAM_TICKS", "3"),
            ("LOAM_DISABLE_INDEX", "true"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.ticks, 3);
        assert!(!config.use_index);
    }
}
