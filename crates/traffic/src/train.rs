use glam::Vec3;
use lanerunner_common::{Audio, Clip, MoverKind, SpanRange};
use lanerunner_kernel::{Countdown, Handle, Mover, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::signal::{SignalColor, SignalController, SignalState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub speed: f32,
    pub despawn_buffer: f32,
    /// Quiet time before each warning.
    pub interval: SpanRange,
    /// Time between the warning and the train's departure.
    pub warning_delay: f32,
    pub blink_interval: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            speed: 25.0,
            despawn_buffer: 10.0,
            interval: SpanRange::new(10.0, 18.0),
            warning_delay: 2.5,
            blink_interval: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Stopped,
    /// Waiting out the quiet interval.
    Quiet(Countdown),
    /// Signal blinking, train about to depart.
    Warning(Countdown),
}

/// Periodic trains on one rail segment, announced by a blinking signal.
///
/// Cycle: quiet interval, then `Warning` with the warning sound, then after
/// `warning_delay` the train departs with the pass sound. The next quiet
/// interval starts as soon as the train departs, so several trains can be
/// in transit at once. The signal only returns to `Go` during a quiet
/// interval, once every train it sent has terminated; that is polled every
/// tick.
#[derive(Debug)]
pub struct TrainSpawner {
    config: TrainConfig,
    path: Option<(Vec3, Vec3)>,
    anchor: Vec3,
    signal: SignalController,
    phase: Phase,
    /// Trains sent by this spawner, oldest first. Dead handles are swept
    /// at the start of every tick.
    trains: Vec<Handle>,
    audio: Audio,
    departures: u64,
}

impl TrainSpawner {
    /// `path` is the train's start and end; `None` runs the signal cycle
    /// without ever sending a train.
    pub fn new(
        config: TrainConfig,
        path: Option<(Vec3, Vec3)>,
        anchor: Vec3,
        audio: Audio,
    ) -> Self {
        if path.is_none() {
            tracing::warn!(?anchor, "train spawner has no path, trains will be skipped");
        }
        Self {
            signal: SignalController::new(config.blink_interval),
            config,
            path,
            anchor,
            phase: Phase::Stopped,
            trains: Vec::new(),
            audio,
            departures: 0,
        }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn signal(&self) -> &SignalController {
        &self.signal
    }

    pub fn state(&self) -> SignalState {
        self.signal.state()
    }

    pub fn color(&self) -> SignalColor {
        self.signal.color()
    }

    /// Trains this spawner sent that were alive at the last sweep.
    pub fn trains(&self) -> &[Handle] {
        &self.trains
    }

    /// The most recently departed train still being watched.
    pub fn train(&self) -> Option<Handle> {
        self.trains.last().copied()
    }

    pub fn departures(&self) -> u64 {
        self.departures
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Stopped)
    }

    /// Start the cycle with the signal forced to `Go`.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.is_running() {
            return;
        }
        self.signal.clear();
        self.phase = Phase::Quiet(Countdown::new(self.config.interval.sample(rng)));
        tracing::debug!(anchor = ?self.anchor, "train cycle started");
    }

    /// Cancel the cycle and the blinking; the lamp keeps its last color.
    /// Trains already on the tracks keep going and stay listed.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.phase = Phase::Stopped;
        self.signal.freeze();
        tracing::debug!(anchor = ?self.anchor, trains = self.trains.len(), "train cycle stopped");
    }

    /// Advance the cycle by `dt`. Returns the train spawned this tick.
    pub fn tick(&mut self, dt: f32, world: &mut World) -> Option<Handle> {
        if !self.is_running() {
            return None;
        }
        self.signal.tick(dt);
        self.sweep(world);

        let mut spawned = None;
        let mut budget = dt.max(0.0);
        loop {
            match self.phase {
                Phase::Stopped => break,
                Phase::Quiet(mut countdown) => match countdown.tick(budget) {
                    Some(overshoot) => {
                        self.signal.warn();
                        self.audio.play_at(Clip::TrainWarning, self.anchor);
                        tracing::debug!(anchor = ?self.anchor, "train warning");
                        self.phase = Phase::Warning(Countdown::new(self.config.warning_delay));
                        budget = overshoot;
                    }
                    None => {
                        self.phase = Phase::Quiet(countdown);
                        break;
                    }
                },
                Phase::Warning(mut countdown) => match countdown.tick(budget) {
                    Some(overshoot) => {
                        spawned = self.depart(world);
                        let mut quiet = Countdown::new(self.config.interval.sample(world.rng()));
                        // at most one departure per tick
                        quiet.tick(overshoot);
                        self.phase = Phase::Quiet(quiet);
                        break;
                    }
                    None => {
                        self.phase = Phase::Warning(countdown);
                        break;
                    }
                },
            }
        }
        spawned
    }

    /// Forget terminated trains. With none left in transit and no warning
    /// pending, the signal returns to `Go`.
    fn sweep(&mut self, world: &World) {
        self.trains.retain(|h| world.is_alive(*h));
        let quiet = matches!(self.phase, Phase::Quiet(_));
        if quiet && self.trains.is_empty() && self.signal.state() == SignalState::Warning {
            self.signal.clear();
            tracing::debug!(anchor = ?self.anchor, "tracks clear, signal go");
        }
    }

    fn depart(&mut self, world: &mut World) -> Option<Handle> {
        let (start, end) = self.path?;
        let mover = Mover::new(MoverKind::Train, start, end, self.config.speed)
            .with_despawn_buffer(self.config.despawn_buffer.max(0.0));
        let handle = world.spawn_mover(mover);
        self.audio.play_at(Clip::TrainPass, self.anchor);
        self.trains.push(handle);
        self.departures += 1;
        tracing::debug!(%handle, in_transit = self.trains.len(), "train departed");
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanerunner_common::AudioLog;
    use std::sync::Arc;

    fn fixed_config() -> TrainConfig {
        TrainConfig {
            interval: SpanRange::fixed(10.0),
            warning_delay: 2.5,
            ..TrainConfig::default()
        }
    }

    fn spawner(audio: Audio) -> TrainSpawner {
        TrainSpawner::new(
            fixed_config(),
            Some((Vec3::new(-50.0, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0))),
            Vec3::ZERO,
            audio,
        )
    }

    fn spawner_with(config: TrainConfig) -> TrainSpawner {
        TrainSpawner::new(
            config,
            Some((Vec3::new(-50.0, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0))),
            Vec3::ZERO,
            Audio::default(),
        )
    }

    #[test]
    fn signal_lifecycle() {
        let log = Arc::new(AudioLog::new());
        let mut world = World::with_seed(1);
        let mut s = spawner(Audio::new(log.clone()));
        s.start(world.rng());

        let dt = 0.25;
        let mut t = 0.0;
        let mut departed_at = None;
        let mut train = None;
        while t < 30.0 {
            if let Some(h) = s.tick(dt, &mut world) {
                departed_at.get_or_insert(t + dt);
                train = Some(h);
            }
            world.step(dt);
            t += dt;

            if t < 10.0 {
                assert_eq!(s.state(), SignalState::Go, "t={t}");
            } else if t < 12.5 {
                assert_eq!(s.state(), SignalState::Warning, "t={t}");
            }
            if let Some(h) = train {
                if world.is_alive(h) {
                    assert_eq!(s.state(), SignalState::Warning, "t={t}");
                }
            }
        }

        assert_eq!(departed_at, Some(12.5));
        // 100 units + 10 buffer at 25 u/s is 4.4 s of travel
        assert!(!world.is_alive(train.unwrap()));
        assert_eq!(log.count(Clip::TrainWarning), 2);
        assert_eq!(log.count(Clip::TrainPass), 2);
    }

    #[test]
    fn signal_clears_after_train_terminates() {
        let mut world = World::with_seed(1);
        let mut s = spawner(Audio::default());
        s.start(world.rng());

        let handle = loop {
            if let Some(h) = s.tick(0.5, &mut world) {
                break h;
            }
            world.step(0.5);
        };
        assert_eq!(s.train(), Some(handle));
        while world.is_alive(handle) {
            world.step(0.5);
            s.tick(0.5, &mut world);
        }
        // the tick after termination observed it
        assert_eq!(s.state(), SignalState::Go);
        assert_eq!(s.color(), SignalColor::Green);
        assert!(!s.signal().is_blinking());
    }

    #[test]
    fn stop_cancels_cycle_and_keeps_color() {
        let mut world = World::with_seed(1);
        let mut s = spawner(Audio::default());
        s.start(world.rng());
        s.tick(10.0, &mut world);
        assert_eq!(s.state(), SignalState::Warning);
        s.tick(0.3, &mut world);
        let color = s.color();

        s.stop();
        s.stop();
        assert!(!s.is_running());
        assert!(s.tick(100.0, &mut world).is_none());
        assert_eq!(s.color(), color);
        assert_eq!(world.mover_count(), 0);

        s.start(world.rng());
        assert_eq!(s.state(), SignalState::Go);
        assert_eq!(s.color(), SignalColor::Green);
    }

    #[test]
    fn missing_path_keeps_cycling_without_trains() {
        let log = Arc::new(AudioLog::new());
        let mut world = World::with_seed(1);
        let mut s = TrainSpawner::new(fixed_config(), None, Vec3::ZERO, Audio::new(log.clone()));
        s.start(world.rng());
        for _ in 0..120 {
            assert!(s.tick(0.25, &mut world).is_none());
        }
        assert_eq!(world.mover_count(), 0);
        assert_eq!(s.departures(), 0);
        assert_eq!(log.count(Clip::TrainWarning), 2);
        // no train ever left, so the quiet interval after each warning is clear
        assert_eq!(s.state(), SignalState::Go);
    }

    #[test]
    fn train_uses_configured_speed_and_buffer() {
        let mut world = World::with_seed(1);
        let mut s = spawner(Audio::default());
        s.start(world.rng());
        let h = s.tick(12.5, &mut world).unwrap();
        let train = world.mover(h).unwrap();
        assert_eq!(train.kind(), MoverKind::Train);
        assert_eq!(train.speed(), 25.0);
        assert_eq!(train.despawn_buffer(), 10.0);
    }

    #[test]
    fn signal_holds_while_any_train_is_in_transit() {
        let mut world = World::with_seed(1);
        let config = TrainConfig {
            interval: SpanRange::fixed(1.0),
            warning_delay: 2.5,
            speed: 25.0,
            ..TrainConfig::default()
        };
        // 40 units + 10 buffer is 2 s of travel; the next warning starts 1 s
        // after a departure, so the previous train dies during it
        let mut s = TrainSpawner::new(
            config,
            Some((Vec3::new(-20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0))),
            Vec3::ZERO,
            Audio::default(),
        );
        s.start(world.rng());

        let mut sent = Vec::new();
        let mut t = 0.0;
        while t < 20.0 {
            if let Some(h) = s.tick(0.25, &mut world) {
                sent.push(h);
            }
            world.step(0.25);
            t += 0.25;
            if sent.iter().any(|h| world.is_alive(*h)) {
                assert_eq!(s.state(), SignalState::Warning, "t={t}");
            }
        }
        assert!(sent.len() >= 3);
    }

    #[test]
    fn overlapping_trains_are_all_tracked() {
        let mut world = World::with_seed(1);
        let config = TrainConfig {
            interval: SpanRange::fixed(1.0),
            warning_delay: 0.5,
            speed: 10.0,
            ..TrainConfig::default()
        };
        // 100 units + 10 buffer at 10 u/s outlives several 1.5 s cycles
        let mut s = spawner_with(config);
        s.start(world.rng());

        let mut sent = Vec::new();
        for _ in 0..40 {
            if let Some(h) = s.tick(0.25, &mut world) {
                sent.push(h);
            }
            world.step(0.25);
        }
        assert!(sent.len() >= 5);
        assert!(s.trains().len() > 1);
        assert!(s.trains().iter().all(|h| world.is_alive(*h)));
        assert_eq!(s.train(), sent.last().copied());

        // stopping keeps the trains listed so an owner can still reach them
        s.stop();
        assert_eq!(s.trains().len(), sent.iter().filter(|h| world.is_alive(**h)).count());
        assert_eq!(s.state(), SignalState::Warning);
    }
}
