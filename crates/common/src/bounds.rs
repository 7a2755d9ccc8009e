use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in the local space of a prefab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Volume used when an object exposes no measurable geometry: 1 x 1 x 10
    /// centered on the pivot.
    pub const DEFAULT_SEGMENT: Aabb = Aabb {
        min: Vec3::new(-0.5, -0.5, -5.0),
        max: Vec3::new(0.5, 0.5, 5.0),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Degenerate box containing only `point`.
    pub fn point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Grow this box so it also contains `other`.
    pub fn encapsulate(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along the primary (Z) axis as `(min, max)`.
    pub fn z_extent(&self) -> (f32, f32) {
        (self.min.z, self.max.z)
    }
}
