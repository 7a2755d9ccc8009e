use rand::Rng;
use serde::{Deserialize, Serialize};

/// Closed interval of scalars used for interval and speed settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpanRange {
    pub min: f32,
    pub max: f32,
}

impl SpanRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A range that always yields `value`.
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Uniform draw in `[min, max]`. An inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Inclusive integer range used for group sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Uniform draw in `[min, max]`. An inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Linear interpolation between `a` and `b` with `t` clamped to `[0, 1]`.
pub fn lerp_clamped(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}
