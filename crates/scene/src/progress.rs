use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub units_per_meter: f32,
    /// Keep the best distance instead of following the observer back.
    pub count_only_forward: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            units_per_meter: 1.0,
            count_only_forward: true,
        }
    }
}

/// Distance the observer has covered along the forward (-Z) axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTracker {
    config: ProgressConfig,
    start_z: f32,
    distance: f32,
}

impl ProgressTracker {
    pub fn new(config: ProgressConfig, start_z: f32) -> Self {
        Self {
            config,
            start_z,
            distance: 0.0,
        }
    }

    pub fn update(&mut self, observer_z: f32) {
        let scale = if self.config.units_per_meter > 0.0 {
            self.config.units_per_meter
        } else {
            1.0
        };
        let delta = (self.start_z - observer_z) / scale;
        self.distance = if self.config.count_only_forward {
            self.distance.max(delta)
        } else {
            delta
        };
    }

    /// Restart counting from `observer_z`.
    pub fn reset(&mut self, observer_z: f32) {
        self.start_z = observer_z;
        self.distance = 0.0;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Whole meters covered, never negative.
    pub fn steps(&self) -> u32 {
        self.distance.floor().max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_progress_is_kept() {
        let mut p = ProgressTracker::new(ProgressConfig::default(), 0.0);
        p.update(-10.5);
        assert_eq!(p.steps(), 10);
        p.update(-4.0);
        assert_eq!(p.distance(), 10.5);
    }

    #[test]
    fn follows_observer_when_not_forward_only() {
        let mut p = ProgressTracker::new(
            ProgressConfig {
                units_per_meter: 2.0,
                count_only_forward: false,
            },
            0.0,
        );
        p.update(-10.0);
        assert_eq!(p.distance(), 5.0);
        p.update(4.0);
        assert_eq!(p.distance(), -2.0);
        assert_eq!(p.steps(), 0);
    }

    #[test]
    fn reset_restarts_from_observer() {
        let mut p = ProgressTracker::new(ProgressConfig::default(), 0.0);
        p.update(-20.0);
        p.reset(-20.0);
        assert_eq!(p.steps(), 0);
        p.update(-23.0);
        assert_eq!(p.steps(), 3);
    }
}
