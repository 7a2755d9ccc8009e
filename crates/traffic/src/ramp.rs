use lanerunner_common::lerp_clamped;
use serde::{Deserialize, Serialize};

/// Ramp that makes a spawner busier and faster right after it starts, easing
/// back to normal over `duration` seconds of completed waits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastStart {
    pub enabled: bool,
    pub start_speed_multiplier: f32,
    pub start_spawn_multiplier: f32,
    pub duration: f32,
}

impl Default for FastStart {
    fn default() -> Self {
        Self {
            enabled: true,
            start_speed_multiplier: 2.0,
            start_spawn_multiplier: 0.5,
            duration: 5.0,
        }
    }
}

impl FastStart {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn progress(&self, elapsed: f32) -> Option<f32> {
        if !self.enabled || self.duration <= 0.0 || elapsed >= self.duration {
            return None;
        }
        Some(elapsed / self.duration)
    }

    /// Factor applied to each drawn spawn interval.
    pub fn spawn_multiplier(&self, elapsed: f32) -> f32 {
        self.progress(elapsed)
            .map_or(1.0, |t| lerp_clamped(self.start_spawn_multiplier, 1.0, t))
    }

    /// Factor applied to the lane speed of each spawned mover.
    pub fn speed_multiplier(&self, elapsed: f32) -> f32 {
        self.progress(elapsed)
            .map_or(1.0, |t| lerp_clamped(self.start_speed_multiplier, 1.0, t))
    }
}
