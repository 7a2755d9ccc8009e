use std::sync::Arc;
use std::time::{Duration, Instant};

use lanerunner_common::{Aabb, GeometryService, SegmentKind};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cursor::{AttachmentCursor, Axis, CursorSet, Direction};
use crate::prefab::{PrefabCatalog, SegmentPrefab};
use crate::segment::{MeasuredSegment, Segment, SegmentId};
use crate::select::{GroupSizes, TypeWeights, choose_kind};

/// Streaming configuration: side strip layout, pre-generation counts and the
/// generate/destroy windows around the observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Lateral distance of the side strips from the center axis.
    pub side_offset: f32,
    /// Side islands per side placed ahead of the start during initialization.
    pub initial_side_islands: i32,
    /// Side islands per side placed behind the start during initialization.
    pub side_islands_behind: i32,
    /// Center groups placed ahead of the start during initialization.
    pub initial_islands: i32,
    /// Center groups placed behind the start during initialization.
    pub islands_behind: i32,
    /// How far ahead of the observer forward cursors are kept.
    pub generate_distance: f32,
    /// How far behind the observer a segment's min may fall before eviction.
    pub destroy_distance: f32,
    pub weights: TypeWeights,
    pub groups: GroupSizes,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            side_offset: 71.5,
            initial_side_islands: 10,
            side_islands_behind: 3,
            initial_islands: 10,
            islands_behind: 3,
            generate_distance: 50.0,
            destroy_distance: 50.0,
            weights: TypeWeights::default(),
            groups: GroupSizes::default(),
        }
    }
}

/// Segments created and evicted by one streamer call.
#[derive(Debug, Clone, Default)]
pub struct StreamDelta {
    pub spawned: Vec<SegmentId>,
    pub despawned: Vec<Segment>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.despawned.is_empty()
    }
}

/// Per-update streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub spawned_this_update: usize,
    pub despawned_this_update: usize,
    pub active_segments: usize,
    pub total_spawned: u64,
    pub total_despawned: u64,
    pub frame_time: Duration,
}

/// Chains terrain segments along the center axis and both side axes, keeping
/// terrain generated ahead of the observer and evicting it behind.
///
/// Forward is -Z. Forward cursors only ever decrease and backward cursors
/// only ever increase; backward cursors move during initialization only.
pub struct SegmentStreamer {
    config: StreamConfig,
    catalog: PrefabCatalog,
    geometry: Option<Arc<dyn GeometryService>>,
    active: Vec<Segment>,
    cursors: CursorSet,
    last_kind: SegmentKind,
    next_id: u64,
    initialized: bool,
    stats: StreamStats,
}

impl std::fmt::Debug for SegmentStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStreamer")
            .field("active", &self.active.len())
            .field("cursors", &self.cursors)
            .field("last_kind", &self.last_kind)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl SegmentStreamer {
    pub fn new(
        config: StreamConfig,
        catalog: PrefabCatalog,
        geometry: Option<Arc<dyn GeometryService>>,
    ) -> Self {
        if geometry.is_none() {
            tracing::warn!("no geometry service bound, every segment uses the default volume");
        }
        if !catalog.has_river() {
            tracing::warn!("no river prefab configured, river segments will be skipped");
        }
        Self {
            config,
            catalog,
            geometry,
            active: Vec::new(),
            cursors: CursorSet::default(),
            last_kind: SegmentKind::None,
            next_id: 0,
            initialized: false,
            stats: StreamStats::default(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PrefabCatalog {
        &self.catalog
    }

    /// Live segments in creation order.
    pub fn active(&self) -> &[Segment] {
        &self.active
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.active.iter().find(|s| s.id() == id)
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    /// Kind of the most recent center group.
    pub fn last_kind(&self) -> SegmentKind {
        self.last_kind
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Place the start segment, its side islands, and the pre-generated
    /// terrain on both sides of it. Calling it twice is a no-op.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StreamDelta {
        let mut delta = StreamDelta::default();
        if self.initialized {
            return delta;
        }
        let _span = tracing::info_span!("stream_initialize").entered();
        self.initialized = true;

        self.place_start(&mut delta);

        for _ in 0..self.config.islands_behind.max(0) {
            self.generate_group(Direction::Backward, rng, &mut delta);
        }
        for _ in 0..self.config.initial_islands.max(0) {
            self.generate_group(Direction::Forward, rng, &mut delta);
        }
        for _ in 0..(self.config.side_islands_behind - self.config.islands_behind).max(0) {
            for axis in Axis::SIDES {
                self.place_side(axis, Direction::Backward, &mut delta);
            }
        }
        for _ in 0..(self.config.initial_side_islands - self.config.initial_islands).max(0) {
            for axis in Axis::SIDES {
                self.place_side(axis, Direction::Forward, &mut delta);
            }
        }

        self.stats.total_spawned += delta.spawned.len() as u64;
        self.stats.active_segments = self.active.len();
        tracing::debug!(
            segments = self.active.len(),
            forward = self.cursors.center.forward,
            backward = self.cursors.center.backward,
            "stream initialized"
        );
        delta
    }

    /// Advance streaming for the observer at `observer_z`.
    ///
    /// Each forward cursor that is still closer than `generate_distance`
    /// ahead of the observer gets one more unit (a whole group on the center
    /// axis). Segments whose world min lies more than `destroy_distance`
    /// behind the observer are then evicted and handed back.
    pub fn update<R: Rng + ?Sized>(&mut self, observer_z: f32, rng: &mut R) -> StreamDelta {
        let mut delta = self.initialize(rng);
        let _span = tracing::info_span!("stream_update", observer_z).entered();
        let frame_start = Instant::now();

        let horizon = observer_z - self.config.generate_distance;
        let spawned_before = delta.spawned.len();
        if horizon < self.cursors.center.forward {
            self.generate_group(Direction::Forward, rng, &mut delta);
        }
        for axis in Axis::SIDES {
            if horizon < self.cursors.get(axis).forward {
                self.place_side(axis, Direction::Forward, &mut delta);
            }
        }
        let spawned = delta.spawned.len() - spawned_before;

        let evicted = self.evict_behind(observer_z);
        let despawned = evicted.len();
        delta.despawned.extend(evicted);

        self.stats.spawned_this_update = spawned;
        self.stats.despawned_this_update = despawned;
        self.stats.active_segments = self.active.len();
        self.stats.total_spawned += spawned as u64;
        self.stats.total_despawned += despawned as u64;
        self.stats.frame_time = frame_start.elapsed();

        tracing::trace!(
            spawned,
            despawned,
            active = self.active.len(),
            "stream update complete"
        );
        delta
    }

    fn evict_behind(&mut self, observer_z: f32) -> Vec<Segment> {
        let threshold = observer_z + self.config.destroy_distance;
        let (kept, evicted): (Vec<Segment>, Vec<Segment>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|s| s.world_min() <= threshold);
        self.active = kept;
        for segment in &evicted {
            tracing::debug!(id = %segment.id(), kind = %segment.kind(), "segment evicted");
        }
        evicted
    }

    fn place_start(&mut self, delta: &mut StreamDelta) {
        let measured = match self.catalog.start.clone() {
            Some(prefab) => self.measure(&prefab),
            None => {
                tracing::warn!("no start prefab configured, using a default start segment");
                default_segment(SegmentKind::Start, "start")
            }
        };
        let z = -measured.local_min();
        let overlap = measured.overlap_offset();
        let (min, max) = self.commit(measured, Axis::Center, z, delta);
        self.cursors.center = AttachmentCursor::flush_with(min, max, overlap);
        self.last_kind = SegmentKind::Start;

        for axis in Axis::SIDES {
            let measured = self.side_island();
            let z = min - measured.local_min();
            let overlap = measured.overlap_offset();
            let (side_min, side_max) = self.commit(measured, axis, z, delta);
            *self.cursors.get_mut(axis) = AttachmentCursor::flush_with(side_min, side_max, overlap);
        }
    }

    fn generate_group<R: Rng + ?Sized>(
        &mut self,
        direction: Direction,
        rng: &mut R,
        delta: &mut StreamDelta,
    ) {
        let kind = choose_kind(
            &self.config.weights,
            self.catalog.has_river(),
            self.last_kind,
            rng,
        );
        let size = self.config.groups.sample(kind, rng);
        tracing::debug!(?kind, size, ?direction, "generating group");

        for _ in 0..size {
            let Some(prefab) = self.catalog.pick(kind, rng).cloned() else {
                tracing::warn!(?kind, "prefab pool is empty, skipping segment");
                continue;
            };
            let measured = self.measure(&prefab);
            self.place(Axis::Center, direction, measured, delta);
            for axis in Axis::SIDES {
                self.place_side(axis, direction, delta);
            }
        }
        self.last_kind = kind;
    }

    fn place_side(&mut self, axis: Axis, direction: Direction, delta: &mut StreamDelta) {
        let measured = self.side_island();
        self.place(axis, direction, measured, delta);
    }

    fn side_island(&self) -> MeasuredSegment {
        match &self.catalog.side_island {
            Some(prefab) => self.measure(prefab),
            None => {
                tracing::warn!("no side island prefab configured, using a default side segment");
                default_segment(SegmentKind::SideIsland, "side_island")
            }
        }
    }

    fn place(
        &mut self,
        axis: Axis,
        direction: Direction,
        measured: MeasuredSegment,
        delta: &mut StreamDelta,
    ) {
        let z = self.cursors.get_mut(axis).place(
            direction,
            measured.local_min(),
            measured.local_max(),
            measured.overlap_offset(),
        );
        self.commit(measured, axis, z, delta);
    }

    /// Position a measured segment and add it to the active list. Returns its
    /// world extent along Z.
    fn commit(
        &mut self,
        measured: MeasuredSegment,
        axis: Axis,
        z: f32,
        delta: &mut StreamDelta,
    ) -> (f32, f32) {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        let segment = measured.place(id, axis, axis.lateral(self.config.side_offset), z);
        let extent = (segment.world_min(), segment.world_max());
        tracing::debug!(
            %id,
            kind = %segment.kind(),
            prefab = segment.prefab(),
            ?axis,
            z,
            "segment placed"
        );
        delta.spawned.push(id);
        self.active.push(segment);
        extent
    }

    fn measure(&self, prefab: &SegmentPrefab) -> MeasuredSegment {
        let bounds = self
            .geometry
            .as_ref()
            .and_then(|g| g.measure_bounds(&prefab.geometry))
            .unwrap_or(Aabb::DEFAULT_SEGMENT);
        let (min, max) = bounds.z_extent();
        MeasuredSegment::new(prefab.kind, prefab.name(), prefab.overlap_offset, min, max)
    }
}

fn default_segment(kind: SegmentKind, name: &str) -> MeasuredSegment {
    let (min, max) = Aabb::DEFAULT_SEGMENT.z_extent();
    MeasuredSegment::new(kind, name, 0.0, min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanerunner_common::DeclaredGeometry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn streamer(config: StreamConfig, catalog: PrefabCatalog) -> SegmentStreamer {
        SegmentStreamer::new(config, catalog, Some(Arc::new(DeclaredGeometry)))
    }

    fn small_config() -> StreamConfig {
        StreamConfig {
            initial_side_islands: 4,
            side_islands_behind: 2,
            initial_islands: 3,
            islands_behind: 1,
            ..StreamConfig::default()
        }
    }

    fn count(s: &SegmentStreamer, axis: Axis) -> usize {
        s.active().iter().filter(|seg| seg.axis() == axis).count()
    }

    #[test]
    fn start_segment_min_sits_on_origin() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = streamer(
            StreamConfig {
                initial_side_islands: 0,
                side_islands_behind: 0,
                initial_islands: 0,
                islands_behind: 0,
                ..StreamConfig::default()
            },
            PrefabCatalog::demo(),
        );
        let delta = s.initialize(&mut rng);
        assert_eq!(delta.spawned.len(), 3);
        let start = &s.active()[0];
        assert_eq!(start.kind(), SegmentKind::Start);
        assert_eq!(start.world_min(), 0.0);
        assert_eq!(start.world_max(), 12.0);
        assert_eq!(s.cursors().center.forward, 0.0);
        assert_eq!(s.cursors().center.backward, 12.0);

        // side islands flush with the start's min
        for side in &s.active()[1..] {
            assert_eq!(side.kind(), SegmentKind::SideIsland);
            assert_eq!(side.world_min(), 0.0);
            assert_eq!(side.position().x.abs(), 71.5);
        }
        assert_eq!(s.cursors().left.forward, 0.0);
        assert_eq!(s.cursors().left.backward, 6.0);
        assert_eq!(s.last_kind(), SegmentKind::Start);
    }

    #[test]
    fn initialization_layout_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut catalog = PrefabCatalog::demo();
        // fixed group size so counts are predictable
        let config = StreamConfig {
            groups: GroupSizes {
                grass: lanerunner_common::CountRange::new(1, 1),
                road: lanerunner_common::CountRange::new(1, 1),
                rail: lanerunner_common::CountRange::new(1, 1),
                river: lanerunner_common::CountRange::new(1, 1),
            },
            ..small_config()
        };
        catalog.river = None;
        let mut s = streamer(config, catalog);
        s.initialize(&mut rng);
        // start + 1 behind + 3 ahead
        assert_eq!(count(&s, Axis::Center), 5);
        // start side + 4 (one per center unit) + 1 extra behind + 1 extra ahead
        assert_eq!(count(&s, Axis::Left), 7);
        assert_eq!(count(&s, Axis::Right), 7);
        assert!(s.active().iter().all(|seg| seg.kind() != SegmentKind::River));
    }

    #[test]
    fn negative_extra_side_counts_place_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = StreamConfig {
            initial_side_islands: 0,
            side_islands_behind: 0,
            initial_islands: 2,
            islands_behind: 2,
            groups: GroupSizes {
                grass: lanerunner_common::CountRange::new(1, 1),
                road: lanerunner_common::CountRange::new(1, 1),
                rail: lanerunner_common::CountRange::new(1, 1),
                river: lanerunner_common::CountRange::new(1, 1),
            },
            ..StreamConfig::default()
        };
        let mut s = streamer(config, PrefabCatalog::demo());
        s.initialize(&mut rng);
        assert_eq!(count(&s, Axis::Center), 5);
        assert_eq!(count(&s, Axis::Left), 5);
    }

    #[test]
    fn forward_cursor_is_monotonic_and_segments_are_flush() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        s.initialize(&mut rng);

        let mut observer = 0.0;
        let mut previous = s.cursors().center.forward;
        let mut previous_left = s.cursors().left.forward;
        for _ in 0..400 {
            observer -= 1.5;
            s.update(observer, &mut rng);
            let c = s.cursors();
            assert!(c.center.forward <= previous);
            assert!(c.left.forward <= previous_left);
            previous = c.center.forward;
            previous_left = c.left.forward;
        }

        // consecutive center segments (by creation order, forward part) touch
        let mut forward: Vec<&Segment> = s
            .active()
            .iter()
            .filter(|seg| seg.axis() == Axis::Center && seg.world_max() <= 0.0)
            .collect();
        forward.sort_by(|a, b| b.world_max().total_cmp(&a.world_max()));
        for pair in forward.windows(2) {
            assert!((pair[0].world_min() - pair[1].world_max()).abs() < 1e-3);
        }
    }

    #[test]
    fn backward_cursor_frozen_after_initialization() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        s.initialize(&mut rng);
        let backward = s.cursors().center.backward;
        for i in 0..100 {
            s.update(-(i as f32), &mut rng);
        }
        assert_eq!(s.cursors().center.backward, backward);
    }

    #[test]
    fn consecutive_groups_differ_unless_forced_grass() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        s.initialize(&mut rng);
        let mut previous = s.last_kind();
        let mut groups = 0;
        for i in 0..600 {
            let cursor = s.cursors().center.forward;
            s.update(-(i as f32) * 2.0, &mut rng);
            if s.cursors().center.forward == cursor {
                continue;
            }
            groups += 1;
            let kind = s.last_kind();
            assert!(kind != previous || kind == SegmentKind::Grass);
            previous = kind;
        }
        assert!(groups > 10);
    }

    #[test]
    fn eviction_within_one_update_and_no_reappearance() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        s.initialize(&mut rng);

        let mut gone = Vec::new();
        let mut observer = 0.0;
        for _ in 0..300 {
            observer -= 2.0;
            let delta = s.update(observer, &mut rng);
            let threshold = observer + s.config().destroy_distance;
            for seg in &delta.despawned {
                assert!(seg.world_min() > threshold);
                gone.push(seg.id());
            }
            for seg in s.active() {
                assert!(seg.world_min() <= threshold);
                assert!(!gone.contains(&seg.id()));
            }
        }
        assert!(!gone.is_empty());
        assert_eq!(s.stats().total_despawned as usize, gone.len());
    }

    #[test]
    fn generation_stays_ahead_of_observer() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        s.initialize(&mut rng);
        let mut observer = 0.0;
        for _ in 0..1000 {
            observer -= 0.1;
            s.update(observer, &mut rng);
        }
        let horizon = observer - s.config().generate_distance;
        assert!(s.cursors().center.forward <= horizon + 20.0);
        assert!(s.cursors().left.forward <= horizon + 20.0);
    }

    #[test]
    fn empty_pool_skips_unit_without_side_islands() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let catalog = PrefabCatalog {
            grass: Vec::new(),
            road: Vec::new(),
            rail: None,
            river: None,
            ..PrefabCatalog::demo()
        };
        let mut s = streamer(small_config(), catalog);
        s.initialize(&mut rng);
        // start, its two sides, and only the extra side islands
        assert_eq!(count(&s, Axis::Center), 1);
        assert_eq!(count(&s, Axis::Left), 1 + 1 + 1);
        assert_eq!(s.cursors().center.forward, 0.0);
    }

    #[test]
    fn missing_geometry_service_uses_default_volume() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut s = SegmentStreamer::new(
            StreamConfig {
                initial_islands: 0,
                islands_behind: 0,
                initial_side_islands: 0,
                side_islands_behind: 0,
                ..StreamConfig::default()
            },
            PrefabCatalog::demo(),
            None,
        );
        s.initialize(&mut rng);
        let start = &s.active()[0];
        assert_eq!(start.local_min(), -5.0);
        assert_eq!(start.world_min(), 0.0);
        assert_eq!(start.position().z, 5.0);
    }

    #[test]
    fn missing_start_prefab_falls_back() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let catalog = PrefabCatalog {
            start: None,
            side_island: None,
            ..PrefabCatalog::demo()
        };
        let mut s = streamer(small_config(), catalog);
        s.initialize(&mut rng);
        let start = &s.active()[0];
        assert_eq!(start.kind(), SegmentKind::Start);
        assert_eq!(start.length(), 10.0);
        assert_eq!(start.overlap_offset(), 0.0);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut s = streamer(small_config(), PrefabCatalog::demo());
        let first = s.initialize(&mut rng).spawned.len();
        assert!(first > 0);
        assert!(s.initialize(&mut rng).is_empty());
        assert_eq!(s.active().len(), first);
    }

    #[test]
    fn same_seed_same_terrain() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut s = streamer(small_config(), PrefabCatalog::demo());
            for i in 0..200 {
                s.update(-(i as f32), &mut rng);
            }
            s.active()
                .iter()
                .map(|seg| (seg.kind(), seg.prefab().to_string()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(4), run(4));
    }
}
