use std::path::Path;

use lanerunner_common::{CountRange, SpanRange};
use lanerunner_stream::{PrefabCatalog, StreamConfig};
use lanerunner_traffic::{FastStart, HornConfig, RiverConfig, RoadConfig, TrainConfig};
use serde::{Deserialize, Serialize};

use crate::progress::ProgressConfig;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid range for {field}: min {min} is greater than max {max}")]
    InvalidRange { field: String, min: f64, max: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: String, value: f64 },
}

/// Where crossing paths run on a traffic segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Path endpoints sit this far left and right of the segment pivot.
    pub half_span: f32,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self { half_span: 35.0 }
    }
}

/// Everything a scene needs, loadable from one YAML document. Missing keys
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: u64,
    pub stream: StreamConfig,
    pub road: RoadConfig,
    pub river: RiverConfig,
    pub train: TrainConfig,
    pub horn: HornConfig,
    pub crossing: CrossingConfig,
    pub progress: ProgressConfig,
    pub catalog: PrefabCatalog,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            stream: StreamConfig::default(),
            road: RoadConfig::default(),
            river: RiverConfig::default(),
            train: TrainConfig::default(),
            horn: HornConfig::default(),
            crossing: CrossingConfig::default(),
            progress: ProgressConfig::default(),
            catalog: PrefabCatalog::demo(),
        }
    }
}

impl SceneConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), seed = config.seed, "scene config loaded");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.stream;
        non_negative("stream.side_offset", s.side_offset)?;
        non_negative("stream.generate_distance", s.generate_distance)?;
        non_negative("stream.destroy_distance", s.destroy_distance)?;
        non_negative("stream.weights.grass", s.weights.grass)?;
        non_negative("stream.weights.road", s.weights.road)?;
        non_negative("stream.weights.rail", s.weights.rail)?;
        non_negative("stream.weights.river", s.weights.river)?;
        count_range("stream.groups.grass", s.groups.grass)?;
        count_range("stream.groups.road", s.groups.road)?;
        count_range("stream.groups.rail", s.groups.rail)?;
        count_range("stream.groups.river", s.groups.river)?;

        let r = &self.road;
        span_range("road.spawn_interval", r.spawn_interval)?;
        span_range("road.speed", r.speed)?;
        positive("road.lane_count", r.lane_count as f32)?;
        non_negative("road.road_width", r.road_width)?;
        non_negative("road.lane_jitter", r.lane_jitter)?;
        non_negative("road.min_distance_between", r.min_distance_between)?;
        fast_start("road.fast_start", &r.fast_start)?;

        let v = &self.river;
        span_range("river.spawn_interval", v.spawn_interval)?;
        span_range("river.speed", v.speed)?;
        positive("river.lane_count", v.lane_count as f32)?;
        non_negative("river.river_width", v.river_width)?;
        non_negative("river.min_distance_between", v.min_distance_between)?;
        non_negative("river.despawn_buffer", v.despawn_buffer)?;
        fast_start("river.fast_start", &v.fast_start)?;

        let t = &self.train;
        span_range("train.interval", t.interval)?;
        non_negative("train.speed", t.speed)?;
        non_negative("train.despawn_buffer", t.despawn_buffer)?;
        non_negative("train.warning_delay", t.warning_delay)?;
        positive("train.blink_interval", t.blink_interval)?;

        non_negative("horn.chance", self.horn.chance)?;
        non_negative("horn.min_delay", self.horn.min_delay)?;
        positive("crossing.half_span", self.crossing.half_span)?;
        positive("progress.units_per_meter", self.progress.units_per_meter)?;
        Ok(())
    }
}

fn span_range(field: &str, range: SpanRange) -> Result<(), ConfigError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            field: field.to_string(),
            min: f64::from(range.min),
            max: f64::from(range.max),
        })
    }
}

fn count_range(field: &str, range: CountRange) -> Result<(), ConfigError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            field: field.to_string(),
            min: f64::from(range.min),
            max: f64::from(range.max),
        })
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field: field.to_string(),
            value: f64::from(value),
        })
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_string(),
            value: f64::from(value),
        })
    }
}

fn fast_start(field: &str, ramp: &FastStart) -> Result<(), ConfigError> {
    if !ramp.enabled {
        return Ok(());
    }
    non_negative(&format!("{field}.duration"), ramp.duration)?;
    non_negative(&format!("{field}.start_spawn_multiplier"), ramp.start_spawn_multiplier)?;
    non_negative(&format!("{field}.start_speed_multiplier"), ramp.start_speed_multiplier)
}
