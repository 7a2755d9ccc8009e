//! Host capabilities consumed by the core.
//!
//! The core never owns a renderer, a physics world or a mixer. It measures
//! prefab geometry, casts rays and plays sounds through these traits, which the
//! host implements and hands out as shared `Arc` capabilities.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;

/// Geometry a prefab declares: collider volumes and visual volumes, both in
/// the prefab's local space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryDesc {
    pub name: String,
    #[serde(default)]
    pub colliders: Vec<Aabb>,
    #[serde(default)]
    pub visuals: Vec<Aabb>,
}

/// Measures the local bounding volume of an object's geometry.
pub trait GeometryService: Send + Sync {
    /// `None` when the object exposes nothing measurable.
    fn measure_bounds(&self, object: &GeometryDesc) -> Option<Aabb>;
}

/// Measures declared volumes: colliders win over visuals, and the result
/// always contains the pivot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredGeometry;

impl GeometryService for DeclaredGeometry {
    fn measure_bounds(&self, object: &GeometryDesc) -> Option<Aabb> {
        let source = if !object.colliders.is_empty() {
            &object.colliders
        } else if !object.visuals.is_empty() {
            &object.visuals
        } else {
            return None;
        };
        let mut bounds = Aabb::point(Vec3::ZERO);
        for volume in source {
            bounds.encapsulate(volume);
        }
        Some(bounds)
    }
}

/// Casts a ray against the host's collision world.
pub trait RaycastService: Send + Sync {
    /// Distance to the first hit within `max_distance` on `layer_mask`.
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32, layer_mask: u32)
    -> Option<f32>;
}

/// Raycaster for hosts without a collision world.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHits;

impl RaycastService for NoHits {
    fn cast(&self, _: Vec3, _: Vec3, _: f32, _: u32) -> Option<f32> {
        None
    }
}

/// Sound effects known to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clip {
    CarEngineLoop,
    CarHorn,
    TrainPass,
    TrainWarning,
    RiverLoop,
}

/// Opaque handle to a looped sound started by [`AudioService::start_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopHandle(pub u64);

/// Fire-and-forget audio playback.
pub trait AudioService: Send + Sync {
    fn play_one_shot_at(&self, clip: Clip, position: Vec3);
    fn start_loop(&self, anchor: Vec3, clip: Clip, volume: f32) -> Option<LoopHandle>;
    fn stop_loop(&self, handle: LoopHandle);
}

/// Non-owning audio capability held by components.
///
/// A detached handle silently drops every call.
#[derive(Clone, Default)]
pub struct Audio(Option<Arc<dyn AudioService>>);

impl Audio {
    pub fn new(service: Arc<dyn AudioService>) -> Self {
        Self(Some(service))
    }

    /// Handle with no service bound.
    pub fn detached() -> Self {
        tracing::warn!("no audio service bound, sounds will be skipped");
        Self(None)
    }

    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    pub fn play_at(&self, clip: Clip, position: Vec3) {
        if let Some(service) = &self.0 {
            service.play_one_shot_at(clip, position);
        }
    }

    pub fn start_loop(&self, anchor: Vec3, clip: Clip, volume: f32) -> Option<LoopHandle> {
        self.0
            .as_ref()
            .and_then(|service| service.start_loop(anchor, clip, volume))
    }

    pub fn stop_loop(&self, handle: LoopHandle) {
        if let Some(service) = &self.0 {
            service.stop_loop(handle);
        }
    }
}

impl std::fmt::Debug for Audio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Audio").field(&self.is_bound()).finish()
    }
}

/// A call received by [`AudioLog`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCall {
    OneShot { clip: Clip, position: Vec3 },
    LoopStarted { handle: LoopHandle, clip: Clip },
    LoopStopped { handle: LoopHandle },
}

/// Audio service that records calls instead of playing them. Used by the
/// headless runner and by tests.
#[derive(Debug, Default)]
pub struct AudioLog {
    inner: Mutex<AudioLogInner>,
}

#[derive(Debug, Default)]
struct AudioLogInner {
    calls: Vec<AudioCall>,
    next_handle: u64,
    live_loops: usize,
}

impl AudioLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.lock().calls.clone()
    }

    /// Number of one-shots recorded for `clip`.
    pub fn count(&self, clip: Clip) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, AudioCall::OneShot { clip: played, .. } if *played == clip))
            .count()
    }

    pub fn live_loops(&self) -> usize {
        self.lock().live_loops
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AudioLogInner> {
        // A poisoned log only means a panicking test; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AudioService for AudioLog {
    fn play_one_shot_at(&self, clip: Clip, position: Vec3) {
        self.lock().calls.push(AudioCall::OneShot { clip, position });
    }

    fn start_loop(&self, _anchor: Vec3, clip: Clip, _volume: f32) -> Option<LoopHandle> {
        let mut inner = self.lock();
        inner.next_handle += 1;
        let handle = LoopHandle(inner.next_handle);
        inner.live_loops += 1;
        inner.calls.push(AudioCall::LoopStarted { handle, clip });
        Some(handle)
    }

    fn stop_loop(&self, handle: LoopHandle) {
        let mut inner = self.lock();
        inner.live_loops = inner.live_loops.saturating_sub(1);
        inner.calls.push(AudioCall::LoopStopped { handle });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(colliders: Vec<Aabb>, visuals: Vec<Aabb>) -> GeometryDesc {
        GeometryDesc {
            name: "test".into(),
            colliders,
            visuals,
        }
    }

    #[test]
    fn declared_geometry_prefers_colliders() {
        let collider = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 1.0, 2.0));
        let visual = Aabb::new(Vec3::new(-9.0, 0.0, -9.0), Vec3::new(9.0, 1.0, 9.0));
        let b = DeclaredGeometry
            .measure_bounds(&desc(vec![collider], vec![visual]))
            .unwrap();
        assert_eq!(b.z_extent(), (-2.0, 2.0));
    }

    #[test]
    fn declared_geometry_falls_back_to_visuals() {
        let visual = Aabb::new(Vec3::new(-1.0, 0.0, -3.0), Vec3::new(1.0, 1.0, 3.0));
        let b = DeclaredGeometry.measure_bounds(&desc(vec![], vec![visual])).unwrap();
        assert_eq!(b.z_extent(), (-3.0, 3.0));
    }

    #[test]
    fn declared_geometry_contains_pivot() {
        let offset = Aabb::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 6.0));
        let b = DeclaredGeometry.measure_bounds(&desc(vec![offset], vec![])).unwrap();
        assert_eq!(b.z_extent(), (0.0, 6.0));
    }

    #[test]
    fn declared_geometry_empty_is_none() {
        assert!(DeclaredGeometry.measure_bounds(&desc(vec![], vec![])).is_none());
    }

    #[test]
    fn detached_audio_is_silent() {
        let audio = Audio::detached();
        assert!(!audio.is_bound());
        audio.play_at(Clip::CarHorn, Vec3::ZERO);
        assert!(audio.start_loop(Vec3::ZERO, Clip::RiverLoop, 1.0).is_none());
    }

    #[test]
    fn audio_log_tracks_loops() {
        let log = Arc::new(AudioLog::new());
        let audio = Audio::new(log.clone());
        let handle = audio.start_loop(Vec3::ZERO, Clip::RiverLoop, 0.5).unwrap();
        assert_eq!(log.live_loops(), 1);
        audio.stop_loop(handle);
        assert_eq!(log.live_loops(), 0);
        audio.play_at(Clip::TrainPass, Vec3::ONE);
        assert_eq!(log.count(Clip::TrainPass), 1);
        assert_eq!(log.calls().len(), 3);
    }

    #[test]
    fn no_hits_never_hits() {
        assert!(NoHits.cast(Vec3::ZERO, Vec3::Z, 10.0, u32::MAX).is_none());
    }
}
