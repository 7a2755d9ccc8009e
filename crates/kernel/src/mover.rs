use glam::Vec3;
use lanerunner_common::{MoverKind, Transform};

/// Result of advancing a mover by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverStatus {
    Moving,
    Terminated,
}

/// Direction and length of a mover's path, frozen on first use.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Path {
    direction: Vec3,
    length: f32,
}

impl Path {
    fn between(start: Vec3, end: Vec3) -> Self {
        Self {
            direction: (end - start).normalize_or_zero(),
            length: start.distance(end),
        }
    }
}

/// An entity travelling in a straight line from `start` toward `end`.
///
/// Speed, direction and despawn buffer are fixed for the mover's lifetime.
/// Once `traveled >= path_length + despawn_buffer` the mover terminates and
/// no longer moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Mover {
    kind: MoverKind,
    start: Vec3,
    end: Vec3,
    speed: f32,
    despawn_buffer: f32,
    position: Vec3,
    traveled: f32,
    path: Option<Path>,
    terminated: bool,
}

impl Mover {
    /// Mover with the kind's default despawn buffer.
    pub fn new(kind: MoverKind, start: Vec3, end: Vec3, speed: f32) -> Self {
        Self {
            kind,
            start,
            end,
            speed: speed.max(0.0),
            despawn_buffer: kind.default_despawn_buffer(),
            position: start,
            traveled: 0.0,
            path: None,
            terminated: false,
        }
    }

    pub fn with_despawn_buffer(mut self, buffer: f32) -> Self {
        self.despawn_buffer = buffer.max(0.0);
        self
    }

    pub fn kind(&self) -> MoverKind {
        self.kind
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    pub fn end(&self) -> Vec3 {
        self.end
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn despawn_buffer(&self) -> f32 {
        self.despawn_buffer
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn path_length(&self) -> f32 {
        self.frozen_path().length
    }

    pub fn direction(&self) -> Vec3 {
        self.frozen_path().direction
    }

    /// Current velocity; riders on a float inherit it.
    pub fn velocity(&self) -> Vec3 {
        if self.terminated {
            return Vec3::ZERO;
        }
        self.direction() * self.speed
    }

    /// Seconds from spawn until termination at the mover's speed.
    pub fn lifetime(&self) -> Option<f32> {
        (self.speed > 0.0).then(|| (self.path_length() + self.despawn_buffer) / self.speed)
    }

    pub fn transform(&self) -> Transform {
        Transform::looking_along(self.position, self.direction())
    }

    pub fn advance(&mut self, dt: f32) -> MoverStatus {
        if self.terminated {
            return MoverStatus::Terminated;
        }
        let path = *self.path.get_or_insert_with(|| Path::between(self.start, self.end));
        let step = self.speed * dt.max(0.0);
        self.position += path.direction * step;
        self.traveled += step;

        if self.traveled >= path.length + self.despawn_buffer {
            self.terminated = true;
            MoverStatus::Terminated
        } else {
            MoverStatus::Moving
        }
    }

    fn frozen_path(&self) -> Path {
        self.path
            .unwrap_or_else(|| Path::between(self.start, self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(speed: f32) -> Mover {
        Mover::new(MoverKind::Vehicle, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), speed)
    }

    #[test]
    fn advances_along_direction() {
        let mut m = vehicle(2.0);
        assert_eq!(m.advance(1.0), MoverStatus::Moving);
        assert_eq!(m.position(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(m.traveled(), 2.0);
    }

    #[test]
    fn terminates_at_path_plus_buffer_not_before() {
        // path 10 + buffer 6 = 16 at speed 4 -> exactly four seconds
        let mut m = vehicle(4.0);
        for _ in 0..3 {
            assert_eq!(m.advance(1.0), MoverStatus::Moving);
        }
        assert_eq!(m.traveled(), 12.0);
        assert_eq!(m.advance(0.5), MoverStatus::Moving);
        assert_eq!(m.advance(0.5), MoverStatus::Terminated);
        assert!(m.is_terminated());
    }

    #[test]
    fn no_motion_after_termination() {
        let mut m = vehicle(100.0);
        assert_eq!(m.advance(1.0), MoverStatus::Terminated);
        let parked = m.position();
        assert_eq!(m.advance(1.0), MoverStatus::Terminated);
        assert_eq!(m.position(), parked);
        assert_eq!(m.velocity(), Vec3::ZERO);
    }

    #[test]
    fn float_exposes_velocity() {
        let m = Mover::new(MoverKind::Float, Vec3::ZERO, Vec3::new(0.0, 0.0, -6.0), 3.0);
        assert_eq!(m.velocity(), Vec3::new(0.0, 0.0, -3.0));
    }

    #[test]
    fn lifetime_matches_path_and_buffer() {
        let m = Mover::new(MoverKind::Train, Vec3::ZERO, Vec3::new(40.0, 0.0, 0.0), 25.0)
            .with_despawn_buffer(10.0);
        assert_eq!(m.lifetime(), Some(2.0));
        assert_eq!(vehicle(0.0).lifetime(), None);
    }

    #[test]
    fn degenerate_path_terminates_after_buffer() {
        let mut m = Mover::new(MoverKind::Vehicle, Vec3::ONE, Vec3::ONE, 3.0);
        assert_eq!(m.direction(), Vec3::ZERO);
        assert_eq!(m.advance(1.0), MoverStatus::Moving);
        assert_eq!(m.advance(1.0), MoverStatus::Terminated);
        assert_eq!(m.position(), Vec3::ONE);
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let mut m = vehicle(-3.0).with_despawn_buffer(-1.0);
        assert_eq!(m.speed(), 0.0);
        assert_eq!(m.despawn_buffer(), 0.0);
        m.advance(-1.0);
        assert_eq!(m.traveled(), 0.0);
    }
}
