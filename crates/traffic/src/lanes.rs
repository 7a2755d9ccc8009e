use glam::Vec3;
use lanerunner_common::SpanRange;
use lanerunner_kernel::{Arena, Handle, Mover};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which end of the path a lane's movers start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneDirection {
    /// Start point toward end point.
    Along,
    /// End point toward start point.
    Against,
}

/// How a lane picks its direction when it becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionPolicy {
    /// Every lane always runs start to end.
    Fixed,
    /// A fair coin per emptied lane.
    Random,
}

/// One lane across a corridor.
///
/// Direction and speed can only change through [`LaneSet::prepare`] while
/// the lane holds no live movers.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneState {
    active: Vec<Handle>,
    direction: Option<LaneDirection>,
    speed: f32,
    offset: f32,
}

impl LaneState {
    /// Handles in spawn order. May contain movers that have since
    /// terminated until the next sweep.
    pub fn active(&self) -> &[Handle] {
        &self.active
    }

    pub fn direction(&self) -> Option<LaneDirection> {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Lateral offset from the corridor's center line.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Most recently spawned mover that is still alive.
    pub fn last_live(&self, movers: &Arena<Mover>) -> Option<Handle> {
        self.active.iter().rev().copied().find(|h| movers.contains(*h))
    }

    fn sweep(&mut self, movers: &Arena<Mover>) {
        self.active.retain(|h| movers.contains(*h));
        if self.active.is_empty() {
            self.direction = None;
        }
    }
}

/// Parallel lanes spread evenly across a corridor of fixed width.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSet {
    lanes: Vec<LaneState>,
    speed_range: SpanRange,
    policy: DirectionPolicy,
}

impl LaneSet {
    /// Lateral offset of lane `index` of `count` across `width`. A single
    /// lane sits on the center line.
    pub fn lane_offset(width: f32, count: usize, index: usize) -> f32 {
        if count <= 1 {
            return 0.0;
        }
        -width * 0.5 + (width / (count - 1) as f32) * index as f32
    }

    pub fn new<R: Rng + ?Sized>(
        count: usize,
        width: f32,
        speed_range: SpanRange,
        policy: DirectionPolicy,
        rng: &mut R,
    ) -> Self {
        let lanes = (0..count)
            .map(|i| LaneState {
                active: Vec::new(),
                direction: None,
                speed: speed_range.sample(rng),
                offset: Self::lane_offset(width, count, i),
            })
            .collect();
        Self {
            lanes,
            speed_range,
            policy,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lane(&self, index: usize) -> Option<&LaneState> {
        self.lanes.get(index)
    }

    pub fn lanes(&self) -> &[LaneState] {
        &self.lanes
    }

    /// Uniformly random lane index. `None` when there are no lanes.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        (!self.lanes.is_empty()).then(|| rng.gen_range(0..self.lanes.len()))
    }

    /// Drop dead handles from a lane and, if it is left empty, re-roll its
    /// speed and direction. Returns the lane ready for a spawn attempt.
    pub fn prepare<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        movers: &Arena<Mover>,
        rng: &mut R,
    ) -> Option<&LaneState> {
        let speed_range = self.speed_range;
        let policy = self.policy;
        let lane = self.lanes.get_mut(index)?;
        lane.sweep(movers);
        if lane.active.is_empty() {
            lane.direction = Some(match policy {
                DirectionPolicy::Fixed => LaneDirection::Along,
                DirectionPolicy::Random => {
                    if rng.gen_bool(0.5) {
                        LaneDirection::Along
                    } else {
                        LaneDirection::Against
                    }
                }
            });
            lane.speed = speed_range.sample(rng);
            tracing::trace!(
                lane = index,
                speed = lane.speed,
                direction = ?lane.direction,
                "lane re-rolled"
            );
        }
        Some(lane)
    }

    /// Whether a mover may appear at `spawn_point` in lane `index`: the
    /// lane's most recent live mover must be at least `min_distance` away.
    pub fn admits(
        &self,
        index: usize,
        movers: &Arena<Mover>,
        spawn_point: Vec3,
        min_distance: f32,
    ) -> bool {
        let Some(lane) = self.lanes.get(index) else {
            return false;
        };
        match lane.last_live(movers).and_then(|h| movers.get(h)) {
            Some(last) => last.position().distance(spawn_point) >= min_distance,
            None => true,
        }
    }

    pub fn push(&mut self, index: usize, handle: Handle) {
        if let Some(lane) = self.lanes.get_mut(index) {
            lane.active.push(handle);
        }
    }

    /// Live movers across all lanes.
    pub fn live_count(&self, movers: &Arena<Mover>) -> usize {
        self.lanes
            .iter()
            .flat_map(|l| l.active.iter())
            .filter(|h| movers.contains(**h))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanerunner_common::MoverKind;
    use lanerunner_kernel::World;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn lanes(count: usize, policy: DirectionPolicy) -> LaneSet {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        LaneSet::new(count, 4.0, SpanRange::new(4.0, 8.0), policy, &mut rng)
    }

    fn spawn_at(world: &mut World, start: Vec3) -> Handle {
        world.spawn_mover(Mover::new(
            MoverKind::Vehicle,
            start,
            start + Vec3::X * 20.0,
            5.0,
        ))
    }

    #[test]
    fn offsets_span_the_width() {
        assert_eq!(LaneSet::lane_offset(4.0, 2, 0), -2.0);
        assert_eq!(LaneSet::lane_offset(4.0, 2, 1), 2.0);
        assert_eq!(LaneSet::lane_offset(6.0, 3, 1), 0.0);
        assert_eq!(LaneSet::lane_offset(6.0, 1, 0), 0.0);
    }

    #[test]
    fn direction_undefined_until_prepared() {
        let mut set = lanes(2, DirectionPolicy::Fixed);
        assert!(set.lanes().iter().all(|l| l.direction().is_none()));
        let world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let lane = set.prepare(0, world.movers(), &mut rng).unwrap();
        assert_eq!(lane.direction(), Some(LaneDirection::Along));
        assert!(SpanRange::new(4.0, 8.0).contains(lane.speed()));
    }

    #[test]
    fn occupied_lane_keeps_speed_and_direction() {
        let mut set = lanes(1, DirectionPolicy::Random);
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (speed, direction) = {
            let lane = set.prepare(0, world.movers(), &mut rng).unwrap();
            (lane.speed(), lane.direction())
        };
        let h = spawn_at(&mut world, Vec3::ZERO);
        set.push(0, h);
        for _ in 0..50 {
            let lane = set.prepare(0, world.movers(), &mut rng).unwrap();
            assert_eq!(lane.speed(), speed);
            assert_eq!(lane.direction(), direction);
        }
    }

    #[test]
    fn emptied_lane_rerolls() {
        let mut set = lanes(1, DirectionPolicy::Random);
        let mut world = World::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        set.prepare(0, world.movers(), &mut rng);
        let h = spawn_at(&mut world, Vec3::ZERO);
        set.push(0, h);
        world.remove_mover(h);

        let mut speeds = Vec::new();
        for _ in 0..20 {
            speeds.push(set.prepare(0, world.movers(), &mut rng).unwrap().speed());
        }
        speeds.dedup();
        assert!(speeds.len() > 1);
        assert!(set.lane(0).unwrap().active().is_empty());
    }

    #[test]
    fn spacing_measured_from_last_live_mover() {
        let mut set = lanes(1, DirectionPolicy::Fixed);
        let mut world = World::new();
        let near = spawn_at(&mut world, Vec3::new(3.0, 0.0, 0.0));
        set.push(0, near);
        assert!(!set.admits(0, world.movers(), Vec3::ZERO, 6.0));
        assert!(set.admits(0, world.movers(), Vec3::ZERO, 3.0));

        world.remove_mover(near);
        assert!(set.admits(0, world.movers(), Vec3::ZERO, 6.0));
        assert!(!set.admits(5, world.movers(), Vec3::ZERO, 0.0));
    }

    #[test]
    fn pick_stays_in_range() {
        let set = lanes(3, DirectionPolicy::Fixed);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..100 {
            assert!(set.pick(&mut rng).unwrap() < 3);
        }
        assert!(lanes(0, DirectionPolicy::Fixed).pick(&mut rng).is_none());
    }
}
