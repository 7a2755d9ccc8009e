//! Weighted choice of the next center group's kind and size.

use lanerunner_common::{CountRange, SegmentKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Draws allowed before giving up on avoiding the previous kind.
pub const MAX_TYPE_ATTEMPTS: usize = 10;

/// Relative weight of each center kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub grass: f32,
    pub road: f32,
    pub rail: f32,
    pub river: f32,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self {
            grass: 0.4,
            road: 0.3,
            rail: 0.15,
            river: 0.15,
        }
    }
}

impl TypeWeights {
    pub fn get(&self, kind: SegmentKind) -> f32 {
        match kind {
            SegmentKind::Grass => self.grass,
            SegmentKind::Road => self.road,
            SegmentKind::Rail => self.rail,
            SegmentKind::River => self.river,
            _ => 0.0,
        }
    }

    /// Weights actually used for drawing: negatives count as zero, and a
    /// disabled river is removed from the probability mass entirely.
    pub fn effective(&self, river_available: bool) -> Self {
        Self {
            grass: self.grass.max(0.0),
            road: self.road.max(0.0),
            rail: self.rail.max(0.0),
            river: if river_available { self.river.max(0.0) } else { 0.0 },
        }
    }

    pub fn total(&self) -> f32 {
        self.grass + self.road + self.rail + self.river
    }

    /// One weighted draw. Weights must already be effective.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SegmentKind {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return SegmentKind::Grass;
        }
        let roll = rng.gen_range(0.0..total);
        let mut upper = 0.0;
        let mut last_positive = SegmentKind::Grass;
        for kind in SegmentKind::CENTER {
            let w = self.get(kind);
            if w <= 0.0 {
                continue;
            }
            upper += w;
            last_positive = kind;
            if roll < upper {
                return kind;
            }
        }
        // rounding can leave the roll on the top boundary
        last_positive
    }
}

/// Inclusive group size per center kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSizes {
    pub grass: CountRange,
    pub road: CountRange,
    pub rail: CountRange,
    pub river: CountRange,
}

impl Default for GroupSizes {
    fn default() -> Self {
        Self {
            grass: CountRange::new(1, 2),
            road: CountRange::new(1, 2),
            rail: CountRange::new(1, 3),
            river: CountRange::new(1, 2),
        }
    }
}

impl GroupSizes {
    pub fn get(&self, kind: SegmentKind) -> CountRange {
        match kind {
            SegmentKind::Grass => self.grass,
            SegmentKind::Road => self.road,
            SegmentKind::Rail => self.rail,
            SegmentKind::River => self.river,
            _ => CountRange::new(1, 1),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, kind: SegmentKind, rng: &mut R) -> u32 {
        self.get(kind).sample(rng)
    }
}

/// Pick the next group kind, avoiding `previous`.
///
/// Redraws up to [`MAX_TYPE_ATTEMPTS`] times while the draw equals
/// `previous`; if every draw collides the result is Grass.
pub fn choose_kind<R: Rng + ?Sized>(
    weights: &TypeWeights,
    river_available: bool,
    previous: SegmentKind,
    rng: &mut R,
) -> SegmentKind {
    let weights = weights.effective(river_available);
    for _ in 0..MAX_TYPE_ATTEMPTS {
        let kind = weights.draw(rng);
        if kind != previous {
            return kind;
        }
    }
    tracing::trace!(?previous, "type draws exhausted, falling back to grass");
    SegmentKind::Grass
}
