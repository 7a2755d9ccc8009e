use std::sync::{Arc, Mutex};

use glam::Vec3;
use lanerunner_common::{Audio, Clip};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HornConfig {
    /// Probability of a horn after each spawn attempt.
    pub chance: f32,
    /// Minimum seconds between two horns anywhere in the scene.
    pub min_delay: f32,
}

impl Default for HornConfig {
    fn default() -> Self {
        Self {
            chance: 0.05,
            min_delay: 2.0,
        }
    }
}

/// Random car horns, rate limited across every spawner holding a clone.
#[derive(Debug, Clone)]
pub struct HornThrottle {
    config: HornConfig,
    last_played: Arc<Mutex<Option<f64>>>,
}

impl HornThrottle {
    pub fn new(config: HornConfig) -> Self {
        Self {
            config,
            last_played: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &HornConfig {
        &self.config
    }

    /// Maybe honk at `position`. `now` is the simulation time in seconds.
    /// Returns whether a horn was played.
    pub fn maybe_play<R: Rng + ?Sized>(
        &self,
        now: f64,
        position: Vec3,
        audio: &Audio,
        rng: &mut R,
    ) -> bool {
        let mut last = self.last_played.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = *last {
            if now - t < f64::from(self.config.min_delay) {
                return false;
            }
        }
        if rng.gen_range(0.0..1.0) >= self.config.chance {
            return false;
        }
        *last = Some(now);
        audio.play_at(Clip::CarHorn, position);
        true
    }
}

impl Default for HornThrottle {
    fn default() -> Self {
        Self::new(HornConfig::default())
    }
}
