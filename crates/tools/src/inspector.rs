use std::collections::BTreeMap;

use lanerunner_common::{MoverKind, SegmentKind};
use lanerunner_kernel::{Handle, World};
use lanerunner_scene::{Scene, SegmentTraffic};
use lanerunner_stream::{Axis, SegmentId};
use lanerunner_traffic::{SignalColor, SignalState};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Read-only queries over a running scene for debugging and for the CLI's
/// text and JSON reports.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene state.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let world = scene.world();
        let stats = scene.stream_stats();

        let mut segments_by_kind = BTreeMap::new();
        for segment in scene.segments() {
            *segments_by_kind.entry(segment.kind()).or_insert(0) += 1;
        }
        let mut movers_by_kind = BTreeMap::new();
        for (_, mover) in world.movers().iter() {
            *movers_by_kind.entry(mover_label(mover.kind())).or_insert(0) += 1;
        }

        SceneSummary {
            tick: world.tick(),
            seed: world.seed(),
            time: world.time(),
            observer_z: scene.observer_z(),
            distance: scene.progress().distance(),
            steps: scene.progress().steps(),
            active_segments: scene.segments().len(),
            segments_by_kind,
            traffic_segments: scene.traffic().len(),
            movers: world.mover_count(),
            movers_by_kind,
            total_segments_spawned: stats.total_spawned,
            total_segments_despawned: stats.total_despawned,
            last_stream_update_us: stats.frame_time.as_micros() as u64,
        }
    }

    /// Per-segment details, front (lowest z) first.
    pub fn segments(scene: &Scene) -> Vec<SegmentInfo> {
        let mut out: Vec<SegmentInfo> = scene
            .segments()
            .iter()
            .map(|segment| {
                let movers = scene
                    .traffic_for(segment.id())
                    .map(|t| live_movers(t, scene.world()))
                    .unwrap_or(0);
                SegmentInfo {
                    id: segment.id(),
                    kind: segment.kind(),
                    axis: segment.axis(),
                    prefab: segment.prefab().to_string(),
                    z_min: segment.world_min(),
                    z_max: segment.world_max(),
                    traffic: scene.traffic_for(segment.id()).is_some(),
                    movers,
                }
            })
            .collect();
        out.sort_by(|a, b| a.z_min.total_cmp(&b.z_min));
        out
    }

    /// Every crossing signal currently in the scene.
    pub fn signals(scene: &Scene) -> Vec<SignalInfo> {
        scene
            .traffic()
            .iter()
            .filter_map(|(id, traffic)| match traffic {
                SegmentTraffic::Rail(train) => Some(SignalInfo {
                    segment: *id,
                    state: train.state(),
                    color: train.color(),
                    departures: train.departures(),
                    trains_in_transit: train
                        .trains()
                        .iter()
                        .filter(|h| scene.world().is_alive(**h))
                        .count(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn inspect_mover(world: &World, handle: Handle) -> Option<MoverInfo> {
        world.mover(handle).map(|mover| {
            let p = mover.position();
            MoverInfo {
                handle: handle.to_string(),
                kind: mover.kind(),
                position: [p.x, p.y, p.z],
                speed: mover.speed(),
                traveled: mover.traveled(),
                path_length: mover.path_length(),
                lifetime: mover.lifetime(),
            }
        })
    }

    pub fn to_json(summary: &SceneSummary) -> serde_json::Result<String> {
        serde_json::to_string_pretty(summary)
    }
}

fn live_movers(traffic: &SegmentTraffic, world: &World) -> usize {
    match traffic {
        SegmentTraffic::Road(s) | SegmentTraffic::River(s) => s.lanes().live_count(world.movers()),
        SegmentTraffic::Rail(t) => t.trains().iter().filter(|h| world.is_alive(**h)).count(),
    }
}

fn mover_label(kind: MoverKind) -> &'static str {
    match kind {
        MoverKind::Vehicle => "vehicle",
        MoverKind::Float => "float",
        MoverKind::Train => "train",
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub tick: u64,
    pub seed: u64,
    pub time: f64,
    pub observer_z: f32,
    pub distance: f32,
    pub steps: u32,
    pub active_segments: usize,
    pub segments_by_kind: BTreeMap<SegmentKind, usize>,
    pub traffic_segments: usize,
    pub movers: usize,
    pub movers_by_kind: BTreeMap<&'static str, usize>,
    pub total_segments_spawned: u64,
    pub total_segments_despawned: u64,
    pub last_stream_update_us: u64,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Scene: tick={} seed={} time={:.2}s observer_z={:.2} distance={:.2} steps={}",
            self.tick, self.seed, self.time, self.observer_z, self.distance, self.steps
        )?;
        write!(f, "Segments: active={}", self.active_segments)?;
        for (kind, count) in &self.segments_by_kind {
            write!(f, " {kind}={count}")?;
        }
        writeln!(
            f,
            " traffic={} spawned={} despawned={}",
            self.traffic_segments, self.total_segments_spawned, self.total_segments_despawned
        )?;
        write!(f, "Movers: live={}", self.movers)?;
        for (kind, count) in &self.movers_by_kind {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

/// One active segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentInfo {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub axis: Axis,
    pub prefab: String,
    pub z_min: f32,
    pub z_max: f32,
    pub traffic: bool,
    pub movers: usize,
}

impl std::fmt::Display for SegmentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Segment [{}] {:?} {} ({}) z=[{:.2}, {:.2}]",
            self.id, self.axis, self.kind, self.prefab, self.z_min, self.z_max
        )?;
        if self.traffic {
            write!(f, " movers={}", self.movers)?;
        }
        Ok(())
    }
}

/// State of one crossing signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalInfo {
    pub segment: SegmentId,
    pub state: SignalState,
    pub color: SignalColor,
    pub departures: u64,
    pub trains_in_transit: usize,
}

/// Detailed info about a single mover.
#[derive(Debug, Clone, Serialize)]
pub struct MoverInfo {
    pub handle: String,
    pub kind: MoverKind,
    pub position: [f32; 3],
    pub speed: f32,
    pub traveled: f32,
    pub path_length: f32,
    /// Seconds from spawn to termination; `None` for a stationary mover.
    pub lifetime: Option<f32>,
}

impl std::fmt::Display for MoverInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mover [{}] {} pos=({:.2}, {:.2}, {:.2}) speed={:.2} traveled={:.2}/{:.2}",
            self.handle,
            mover_label(self.kind),
            self.position[0],
            self.position[1],
            self.position[2],
            self.speed,
            self.traveled,
            self.path_length,
        )
    }
}
