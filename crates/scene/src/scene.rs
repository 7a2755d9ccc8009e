use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use lanerunner_common::{Audio, GeometryService, SegmentKind};
use lanerunner_kernel::{Handle, World, WorldEvent};
use lanerunner_stream::{Segment, SegmentId, SegmentStreamer, StreamStats};
use lanerunner_traffic::{HornThrottle, PeriodicSpawner, TrainSpawner};
use rand::Rng;

use crate::config::SceneConfig;
use crate::progress::ProgressTracker;

/// Spawner attached to one traffic-carrying segment.
#[derive(Debug)]
pub enum SegmentTraffic {
    Road(PeriodicSpawner),
    River(PeriodicSpawner),
    Rail(TrainSpawner),
}

impl SegmentTraffic {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Road(_) => SegmentKind::Road,
            Self::River(_) => SegmentKind::River,
            Self::Rail(_) => SegmentKind::Rail,
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            Self::Road(s) | Self::River(s) => s.is_running(),
            Self::Rail(t) => t.is_running(),
        }
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self {
            Self::Road(s) | Self::River(s) => s.start(rng),
            Self::Rail(t) => t.start(rng),
        }
    }

    fn stop(&mut self) {
        match self {
            Self::Road(s) | Self::River(s) => s.stop(),
            Self::Rail(t) => t.stop(),
        }
    }

    fn tick(&mut self, dt: f32, world: &mut World) -> usize {
        match self {
            Self::Road(s) | Self::River(s) => s.tick(dt, world).len(),
            Self::Rail(t) => usize::from(t.tick(dt, world).is_some()),
        }
    }

    /// Movers this spawner produced that may still be in the world.
    fn owned_movers(&self) -> Vec<Handle> {
        match self {
            Self::Road(s) | Self::River(s) => s
                .lanes()
                .lanes()
                .iter()
                .flat_map(|lane| lane.active().iter().copied())
                .collect(),
            Self::Rail(t) => t.trains().to_vec(),
        }
    }
}

/// What happened during one [`Scene::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub segments_spawned: usize,
    pub segments_despawned: usize,
    pub movers_spawned: usize,
    pub movers_terminated: usize,
    /// Movers dropped together with their evicted segment.
    pub movers_removed: usize,
    pub distance: f32,
    /// World events recorded since the previous tick, drained from the log.
    pub events: Vec<WorldEvent>,
}

/// Streamer, traffic and movers advanced together in a fixed order.
///
/// Each tick: the streamer updates for the observer, new traffic segments get
/// a started spawner and evicted ones lose theirs along with its movers, the
/// spawners tick, and finally the world steps every mover.
pub struct Scene {
    config: SceneConfig,
    world: World,
    streamer: SegmentStreamer,
    audio: Audio,
    horn: HornThrottle,
    traffic: BTreeMap<SegmentId, SegmentTraffic>,
    observer_z: f32,
    progress: ProgressTracker,
    last_report: TickReport,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("tick", &self.world.tick())
            .field("observer_z", &self.observer_z)
            .field("segments", &self.streamer.active().len())
            .field("traffic", &self.traffic.len())
            .field("movers", &self.world.mover_count())
            .finish()
    }
}

impl Scene {
    pub fn new(
        config: SceneConfig,
        geometry: Option<Arc<dyn GeometryService>>,
        audio: Audio,
    ) -> Self {
        if !audio.is_bound() {
            tracing::warn!("no audio service bound, scene runs silent");
        }
        let streamer =
            SegmentStreamer::new(config.stream.clone(), config.catalog.clone(), geometry);
        Self {
            world: World::with_seed(config.seed),
            horn: HornThrottle::new(config.horn),
            progress: ProgressTracker::new(config.progress, 0.0),
            streamer,
            audio,
            traffic: BTreeMap::new(),
            observer_z: 0.0,
            last_report: TickReport::default(),
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for hosts that drain events or add their own movers.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn streamer(&self) -> &SegmentStreamer {
        &self.streamer
    }

    pub fn segments(&self) -> &[Segment] {
        self.streamer.active()
    }

    pub fn stream_stats(&self) -> &StreamStats {
        self.streamer.stats()
    }

    pub fn traffic(&self) -> &BTreeMap<SegmentId, SegmentTraffic> {
        &self.traffic
    }

    pub fn traffic_for(&self, id: SegmentId) -> Option<&SegmentTraffic> {
        self.traffic.get(&id)
    }

    pub fn observer_z(&self) -> f32 {
        self.observer_z
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Lay out the starting terrain and attach its traffic. Runs implicitly
    /// on the first tick; calling it again does nothing.
    pub fn initialize(&mut self) -> usize {
        if self.streamer.is_initialized() {
            return 0;
        }
        let _span = tracing::info_span!("scene_initialize", seed = self.config.seed).entered();
        let delta = self.streamer.initialize(self.world.rng());
        for id in &delta.spawned {
            self.attach(*id);
        }
        tracing::info!(
            segments = self.streamer.active().len(),
            traffic = self.traffic.len(),
            "scene initialized"
        );
        delta.spawned.len()
    }

    /// Advance the scene by `dt` seconds with the observer at `observer_z`.
    ///
    /// The world's event log is drained into the returned report, so it
    /// never holds more than one tick of history.
    pub fn tick(&mut self, dt: f32, observer_z: f32) -> TickReport {
        let initial = self.initialize();
        self.observer_z = observer_z;

        let delta = self.streamer.update(observer_z, self.world.rng());
        for id in &delta.spawned {
            self.attach(*id);
        }
        let mut movers_removed = 0;
        for segment in &delta.despawned {
            movers_removed += self.detach(segment);
        }

        let mut movers_spawned = 0;
        for traffic in self.traffic.values_mut() {
            movers_spawned += traffic.tick(dt, &mut self.world);
        }

        let terminated = self.world.step(dt);
        self.progress.update(observer_z);

        let report = TickReport {
            tick: self.world.tick(),
            segments_spawned: initial + delta.spawned.len(),
            segments_despawned: delta.despawned.len(),
            movers_spawned,
            movers_terminated: terminated.len(),
            movers_removed,
            distance: self.progress.distance(),
            events: self.world.drain_events(),
        };
        tracing::trace!(
            tick = report.tick,
            movers = self.world.mover_count(),
            spawned = movers_spawned,
            terminated = report.movers_terminated,
            "scene tick"
        );
        self.last_report = report.clone();
        report
    }

    /// Stop every spawner. Movers already in the world keep moving.
    pub fn stop_traffic(&mut self) {
        for traffic in self.traffic.values_mut() {
            traffic.stop();
        }
    }

    fn attach(&mut self, id: SegmentId) {
        let Some(segment) = self.streamer.segment(id) else {
            return;
        };
        if !segment.kind().carries_traffic() {
            return;
        }
        let kind = segment.kind();
        let anchor = crossing_anchor(segment);
        let half = Vec3::X * self.config.crossing.half_span;
        let (left, right) = (anchor - half, anchor + half);

        let rng = self.world.rng();
        let mut traffic = match kind {
            SegmentKind::Road => {
                let (start, end) = if rng.gen_bool(0.5) {
                    (left, right)
                } else {
                    (right, left)
                };
                SegmentTraffic::Road(PeriodicSpawner::road(
                    &self.config.road,
                    start,
                    end,
                    self.audio.clone(),
                    Some(self.horn.clone()),
                    rng,
                ))
            }
            SegmentKind::River => SegmentTraffic::River(PeriodicSpawner::river(
                &self.config.river,
                left,
                right,
                self.audio.clone(),
                rng,
            )),
            _ => SegmentTraffic::Rail(TrainSpawner::new(
                self.config.train,
                Some((left, right)),
                anchor,
                self.audio.clone(),
            )),
        };
        traffic.start(self.world.rng());
        tracing::debug!(%id, %kind, z = anchor.z, "traffic attached");
        self.traffic.insert(id, traffic);
    }

    fn detach(&mut self, segment: &Segment) -> usize {
        let Some(mut traffic) = self.traffic.remove(&segment.id()) else {
            return 0;
        };
        let owned = traffic.owned_movers();
        traffic.stop();
        let removed = owned
            .into_iter()
            .filter(|h| self.world.remove_mover(*h).is_some())
            .count();
        tracing::debug!(id = %segment.id(), kind = %segment.kind(), removed, "traffic detached");
        removed
    }
}

/// Middle of a segment's extent, where its crossing runs.
fn crossing_anchor(segment: &Segment) -> Vec3 {
    let p = segment.position();
    Vec3::new(p.x, p.y, p.z + (segment.local_min() + segment.local_max()) * 0.5)
}
