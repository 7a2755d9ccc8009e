use glam::Vec3;
use lanerunner_common::{Aabb, GeometryDesc, SegmentKind};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Template a segment is instantiated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPrefab {
    pub kind: SegmentKind,
    /// Added to the attachment cursor after placement; positive values open a
    /// gap in the backward direction and an overlap in the forward one.
    #[serde(default)]
    pub overlap_offset: f32,
    #[serde(flatten)]
    pub geometry: GeometryDesc,
}

impl SegmentPrefab {
    /// Prefab whose only geometry is one collider box of `length` along Z,
    /// starting `z_from` units from the pivot.
    pub fn boxed(name: &str, kind: SegmentKind, width: f32, z_from: f32, length: f32) -> Self {
        Self {
            kind,
            overlap_offset: 0.0,
            geometry: GeometryDesc {
                name: name.to_string(),
                colliders: vec![Aabb::new(
                    Vec3::new(-width * 0.5, -0.5, z_from),
                    Vec3::new(width * 0.5, 0.0, z_from + length),
                )],
                visuals: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.geometry.name
    }
}

/// Prefab pools per segment kind.
///
/// Grass and road pools may hold several interchangeable prefabs; rail and
/// river have at most one each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabCatalog {
    pub start: Option<SegmentPrefab>,
    pub side_island: Option<SegmentPrefab>,
    pub grass: Vec<SegmentPrefab>,
    pub road: Vec<SegmentPrefab>,
    pub rail: Option<SegmentPrefab>,
    pub river: Option<SegmentPrefab>,
}

impl PrefabCatalog {
    /// A small catalog with plausible lane-runner proportions.
    pub fn demo() -> Self {
        Self {
            start: Some(SegmentPrefab::boxed(
                "start",
                SegmentKind::Start,
                140.0,
                -6.0,
                12.0,
            )),
            side_island: Some(SegmentPrefab::boxed(
                "side_island",
                SegmentKind::SideIsland,
                140.0,
                -3.0,
                6.0,
            )),
            grass: vec![
                SegmentPrefab::boxed("grass_narrow", SegmentKind::Grass, 140.0, -1.5, 3.0),
                SegmentPrefab::boxed("grass_wide", SegmentKind::Grass, 140.0, -3.0, 6.0),
            ],
            road: vec![
                SegmentPrefab::boxed("road_two_lane", SegmentKind::Road, 140.0, -1.0, 8.0),
            ],
            rail: Some(SegmentPrefab::boxed("rail", SegmentKind::Rail, 140.0, -2.0, 4.0)),
            river: Some(SegmentPrefab::boxed("river", SegmentKind::River, 140.0, -3.0, 6.0)),
        }
    }

    pub fn has_river(&self) -> bool {
        self.river.is_some()
    }

    /// Draw a prefab for a center kind. `None` when the pool is empty.
    pub fn pick<R: Rng + ?Sized>(&self, kind: SegmentKind, rng: &mut R) -> Option<&SegmentPrefab> {
        match kind {
            SegmentKind::Grass => self.grass.choose(rng),
            SegmentKind::Road => self.road.choose(rng),
            SegmentKind::Rail => self.rail.as_ref(),
            SegmentKind::River => self.river.as_ref(),
            _ => self.grass.first(),
        }
    }
}
