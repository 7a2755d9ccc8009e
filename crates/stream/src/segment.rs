use glam::Vec3;
use lanerunner_common::{SegmentKind, Transform};
use serde::{Deserialize, Serialize};

use crate::cursor::Axis;

/// Stable identifier of a segment for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seg#{}", self.0)
    }
}

/// A freshly instantiated segment whose extents are known but which has not
/// been positioned yet. Extents can only be set here, once.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredSegment {
    kind: SegmentKind,
    prefab: String,
    overlap_offset: f32,
    local_min: f32,
    local_max: f32,
}

impl MeasuredSegment {
    pub fn new(
        kind: SegmentKind,
        prefab: &str,
        overlap_offset: f32,
        local_min: f32,
        local_max: f32,
    ) -> Self {
        Self {
            kind,
            prefab: prefab.to_string(),
            overlap_offset,
            local_min: local_min.min(local_max),
            local_max: local_min.max(local_max),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn local_min(&self) -> f32 {
        self.local_min
    }

    pub fn local_max(&self) -> f32 {
        self.local_max
    }

    pub fn overlap_offset(&self) -> f32 {
        self.overlap_offset
    }

    pub(crate) fn place(self, id: SegmentId, axis: Axis, lateral: f32, z: f32) -> Segment {
        Segment {
            id,
            kind: self.kind,
            prefab: self.prefab,
            axis,
            position: Vec3::new(lateral, 0.0, z),
            overlap_offset: self.overlap_offset,
            local_min: self.local_min,
            local_max: self.local_max,
        }
    }
}

/// One placed terrain tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    id: SegmentId,
    kind: SegmentKind,
    prefab: String,
    axis: Axis,
    position: Vec3,
    overlap_offset: f32,
    local_min: f32,
    local_max: f32,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn prefab(&self) -> &str {
        &self.prefab
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position(self.position)
    }

    pub fn overlap_offset(&self) -> f32 {
        self.overlap_offset
    }

    pub fn local_min(&self) -> f32 {
        self.local_min
    }

    pub fn local_max(&self) -> f32 {
        self.local_max
    }

    pub fn world_min(&self) -> f32 {
        self.position.z + self.local_min
    }

    pub fn world_max(&self) -> f32 {
        self.position.z + self.local_max
    }

    pub fn length(&self) -> f32 {
        self.local_max - self.local_min
    }
}
