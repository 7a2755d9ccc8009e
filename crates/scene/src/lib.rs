//! Scene: one config, one world, and the streamer and traffic driving it.
//!
//! # Invariants
//! - Every live traffic segment has exactly one started spawner.
//! - An evicted segment takes its spawner and that spawner's movers with it.
//! - All random draws come from the world's seeded RNG, so a seed and a
//!   sequence of `(dt, observer_z)` inputs reproduce a run exactly.

pub mod config;
pub mod progress;
pub mod scene;

pub use config::{ConfigError, CrossingConfig, SceneConfig};
pub use progress::{ProgressConfig, ProgressTracker};
pub use scene::{Scene, SegmentTraffic, TickReport};

pub fn crate_info() -> &'static str {
    "lanerunner-scene v0.1.0"
}
