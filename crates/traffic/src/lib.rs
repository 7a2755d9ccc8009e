//! Traffic: lane-based vehicle and float spawning, train crossings.
//!
//! # Invariants
//! - A lane's direction and speed never change while it holds a live mover.
//! - A spawn is rejected while the lane's last live mover is closer than the
//!   configured spacing to the spawn point.
//! - A crossing signal leaves `Warning` only after its train terminated.
//! - Stopping a spawner releases its looped sound; spawned movers continue.

mod horn;
mod lanes;
mod ramp;
mod signal;
mod spawner;
mod train;

pub use horn::{HornConfig, HornThrottle};
pub use lanes::{DirectionPolicy, LaneDirection, LaneSet, LaneState};
pub use ramp::FastStart;
pub use signal::{SignalColor, SignalController, SignalState};
pub use spawner::{MAX_INITIAL_DELAY, PeriodicSpawner, RiverConfig, RoadConfig, SpawnOutcome};
pub use train::{TrainConfig, TrainSpawner};

pub fn crate_info() -> &'static str {
    "lanerunner-traffic v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("traffic"));
    }
}
