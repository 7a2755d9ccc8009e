use glam::Vec3;
use lanerunner_common::{Audio, Clip, LoopHandle, MoverKind, SpanRange};
use lanerunner_kernel::{Countdown, Handle, Mover, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::horn::HornThrottle;
use crate::lanes::{DirectionPolicy, LaneDirection, LaneSet};
use crate::ramp::FastStart;

/// Upper bound on the random delay before a spawn loop's first attempt.
pub const MAX_INITIAL_DELAY: f32 = 0.5;

/// Spawn attempts a single tick may run; guards zero-length intervals.
const MAX_ATTEMPTS_PER_TICK: usize = 64;

/// Road traffic settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub spawn_interval: SpanRange,
    pub speed: SpanRange,
    pub road_width: f32,
    pub lane_count: u32,
    /// Half-width of the uniform lateral jitter per vehicle; 0 disables it.
    pub lane_jitter: f32,
    pub fast_start: FastStart,
    pub min_distance_between: f32,
    pub engine_volume: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            spawn_interval: SpanRange::new(1.2, 2.5),
            speed: SpanRange::new(4.0, 8.0),
            road_width: 4.0,
            lane_count: 2,
            lane_jitter: 0.3,
            fast_start: FastStart::default(),
            min_distance_between: 6.0,
            engine_volume: 1.0,
        }
    }
}

/// River float settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    pub speed: SpanRange,
    pub spawn_interval: SpanRange,
    pub river_width: f32,
    pub lane_count: u32,
    pub min_distance_between: f32,
    pub vertical_offset: f32,
    pub despawn_buffer: f32,
    pub fast_start: FastStart,
    pub loop_volume: f32,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            speed: SpanRange::new(2.0, 4.0),
            spawn_interval: SpanRange::new(1.0, 2.5),
            river_width: 6.0,
            lane_count: 3,
            min_distance_between: 4.0,
            vertical_offset: 0.0,
            despawn_buffer: 6.0,
            fast_start: FastStart::default(),
            loop_volume: 0.5,
        }
    }
}

/// What a spawner emits and the per-kind extras that go with it.
#[derive(Debug, Clone)]
enum Profile {
    Road {
        jitter: f32,
        horn: Option<HornThrottle>,
    },
    River {
        vertical_offset: f32,
        despawn_buffer: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Stopped,
    /// Counting down to the next attempt. `ramp_credit` is the wait that
    /// counts toward the fast-start ramp once it completes; the initial
    /// delay counts for nothing.
    Waiting {
        countdown: Countdown,
        ramp_credit: f32,
    },
}

/// Result of one spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    Spawned { lane: usize, handle: Handle },
    /// The lane's last mover is still too close to the spawn point.
    Blocked { lane: usize },
    NoLanes,
}

/// Wait-then-spawn loop feeding movers into a set of parallel lanes between
/// two path endpoints.
///
/// `start` and `stop` are idempotent. Stopping cancels the pending wait and
/// releases the looped ambience; movers already spawned keep going.
#[derive(Debug)]
pub struct PeriodicSpawner {
    kind: MoverKind,
    profile: Profile,
    start_point: Vec3,
    end_point: Vec3,
    right: Vec3,
    anchor: Vec3,
    lanes: LaneSet,
    spawn_interval: SpanRange,
    fast_start: FastStart,
    min_distance: f32,
    ambience: (Clip, f32),
    audio: Audio,
    loop_handle: Option<LoopHandle>,
    phase: Phase,
    elapsed: f32,
    spawned: u64,
    blocked: u64,
}

impl PeriodicSpawner {
    /// Vehicles crossing from `start_point` to `end_point`.
    pub fn road<R: Rng + ?Sized>(
        config: &RoadConfig,
        start_point: Vec3,
        end_point: Vec3,
        audio: Audio,
        horn: Option<HornThrottle>,
        rng: &mut R,
    ) -> Self {
        let lanes = LaneSet::new(
            config.lane_count as usize,
            config.road_width,
            config.speed,
            DirectionPolicy::Fixed,
            rng,
        );
        Self::build(
            MoverKind::Vehicle,
            Profile::Road {
                jitter: config.lane_jitter.max(0.0),
                horn,
            },
            start_point,
            end_point,
            lanes,
            config.spawn_interval,
            config.fast_start,
            config.min_distance_between,
            (Clip::CarEngineLoop, config.engine_volume),
            audio,
        )
    }

    /// Floats drifting between the two banks, each lane picking its own
    /// direction whenever it empties.
    pub fn river<R: Rng + ?Sized>(
        config: &RiverConfig,
        left_point: Vec3,
        right_point: Vec3,
        audio: Audio,
        rng: &mut R,
    ) -> Self {
        let lanes = LaneSet::new(
            config.lane_count as usize,
            config.river_width,
            config.speed,
            DirectionPolicy::Random,
            rng,
        );
        Self::build(
            MoverKind::Float,
            Profile::River {
                vertical_offset: config.vertical_offset,
                despawn_buffer: config.despawn_buffer.max(0.0),
            },
            left_point,
            right_point,
            lanes,
            config.spawn_interval,
            config.fast_start,
            config.min_distance_between,
            (Clip::RiverLoop, config.loop_volume),
            audio,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        kind: MoverKind,
        profile: Profile,
        start_point: Vec3,
        end_point: Vec3,
        lanes: LaneSet,
        spawn_interval: SpanRange,
        fast_start: FastStart,
        min_distance: f32,
        ambience: (Clip, f32),
        audio: Audio,
    ) -> Self {
        let forward = (end_point - start_point).normalize_or_zero();
        let right = Vec3::Y.cross(forward).normalize_or_zero();
        Self {
            kind,
            profile,
            start_point,
            end_point,
            right,
            anchor: (start_point + end_point) * 0.5,
            lanes,
            spawn_interval,
            fast_start,
            min_distance,
            ambience,
            audio,
            loop_handle: None,
            phase: Phase::Stopped,
            elapsed: 0.0,
            spawned: 0,
            blocked: 0,
        }
    }

    pub fn kind(&self) -> MoverKind {
        self.kind
    }

    pub fn lanes(&self) -> &LaneSet {
        &self.lanes
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Stopped)
    }

    /// Seconds of completed waits since the loop started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds until the next attempt, if running.
    pub fn next_attempt_in(&self) -> Option<f32> {
        match self.phase {
            Phase::Stopped => None,
            Phase::Waiting { countdown, .. } => Some(countdown.remaining()),
        }
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn blocked(&self) -> u64 {
        self.blocked
    }

    /// Begin the loop after a random delay in `[0, 0.5)` seconds.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_running() {
            return;
        }
        let delay = rng.gen_range(0.0..MAX_INITIAL_DELAY);
        self.phase = Phase::Waiting {
            countdown: Countdown::new(delay),
            ramp_credit: 0.0,
        };
        self.elapsed = 0.0;
        let (clip, volume) = self.ambience;
        self.loop_handle = self.audio.start_loop(self.anchor, clip, volume);
        tracing::debug!(kind = ?self.kind, delay, lanes = self.lanes.len(), "spawner started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            self.audio.stop_loop(handle);
        }
        if self.is_running() {
            self.phase = Phase::Stopped;
            tracing::debug!(kind = ?self.kind, spawned = self.spawned, "spawner stopped");
        }
    }

    /// Advance the loop by `dt`, running every attempt whose wait elapsed.
    /// Returns the movers spawned during this tick.
    pub fn tick(&mut self, dt: f32, world: &mut World) -> Vec<Handle> {
        let mut spawned = Vec::new();
        let mut budget = dt.max(0.0);
        let mut capped = true;
        for _ in 0..MAX_ATTEMPTS_PER_TICK {
            let Phase::Waiting {
                mut countdown,
                ramp_credit,
            } = self.phase
            else {
                capped = false;
                break;
            };
            let Some(overshoot) = countdown.tick(budget) else {
                self.phase = Phase::Waiting {
                    countdown,
                    ramp_credit,
                };
                capped = false;
                break;
            };
            self.elapsed += ramp_credit;

            if let SpawnOutcome::Spawned { handle, .. } = self.attempt(world) {
                spawned.push(handle);
            }
            self.after_attempt(world);

            let multiplier = self.fast_start.spawn_multiplier(self.elapsed);
            let wait = self.spawn_interval.sample(world.rng()) * multiplier;
            self.phase = Phase::Waiting {
                countdown: Countdown::new(wait),
                ramp_credit: wait,
            };
            budget = overshoot;
        }
        if capped {
            tracing::trace!(
                kind = ?self.kind,
                dropped = budget,
                "spawn attempt cap reached, remaining wait dropped"
            );
        }
        spawned
    }

    /// One spawn attempt in a random lane.
    pub fn attempt(&mut self, world: &mut World) -> SpawnOutcome {
        let Some(lane_index) = self.lanes.pick(world.rng()) else {
            return SpawnOutcome::NoLanes;
        };
        let jitter = match &self.profile {
            Profile::Road { jitter, .. } if *jitter > 0.0 => {
                world.rng().gen_range(-*jitter..*jitter)
            }
            _ => 0.0,
        };

        let (lane_speed, direction, offset) = {
            let (movers, rng) = world.movers_and_rng();
            match self.lanes.prepare(lane_index, movers, rng) {
                Some(lane) => (lane.speed(), lane.direction(), lane.offset()),
                None => return SpawnOutcome::NoLanes,
            }
        };

        let (from, to) = match direction {
            Some(LaneDirection::Against) => (self.end_point, self.start_point),
            _ => (self.start_point, self.end_point),
        };
        let lift = match self.profile {
            Profile::River {
                vertical_offset, ..
            } => Vec3::Y * vertical_offset,
            Profile::Road { .. } => Vec3::ZERO,
        };
        let lateral = self.right * (offset + jitter) + lift;
        let spawn_point = from + lateral;

        if !self
            .lanes
            .admits(lane_index, world.movers(), spawn_point, self.min_distance)
        {
            self.blocked += 1;
            tracing::trace!(kind = ?self.kind, lane = lane_index, "spawn blocked by spacing");
            return SpawnOutcome::Blocked { lane: lane_index };
        }

        let speed = lane_speed * self.fast_start.speed_multiplier(self.elapsed);
        let mut mover = Mover::new(self.kind, spawn_point, to + lateral, speed);
        if let Profile::River { despawn_buffer, .. } = self.profile {
            mover = mover.with_despawn_buffer(despawn_buffer);
        }
        let handle = world.spawn_mover(mover);
        self.lanes.push(lane_index, handle);
        self.spawned += 1;
        SpawnOutcome::Spawned {
            lane: lane_index,
            handle,
        }
    }

    fn after_attempt(&self, world: &mut World) {
        if let Profile::Road {
            horn: Some(horn), ..
        } = &self.profile
        {
            let now = world.time();
            horn.maybe_play(now, self.anchor, &self.audio, world.rng());
        }
    }
}

impl Drop for PeriodicSpawner {
    fn drop(&mut self) {
        if let Some(handle) = self.loop_handle.take() {
            self.audio.stop_loop(handle);
        }
    }
}
