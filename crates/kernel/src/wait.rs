/// "Wait N seconds" as a value: counts down by the tick delta and reports
/// completion on the first tick whose accumulated time reaches the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Advance by `dt`. Returns the overshoot past the deadline once done, so
    /// a chain of waits does not drift with the tick size.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        self.remaining -= dt.max(0.0);
        if self.remaining <= 0.0 {
            let overshoot = -self.remaining;
            self.remaining = 0.0;
            Some(overshoot)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_on_reaching_target() {
        let mut c = Countdown::new(1.0);
        assert_eq!(c.tick(0.5), None);
        assert_eq!(c.tick(0.5), Some(0.0));
        assert!(c.is_done());
    }

    #[test]
    fn reports_overshoot() {
        let mut c = Countdown::new(1.0);
        assert_eq!(c.tick(1.25), Some(0.25));
    }

    #[test]
    fn zero_wait_completes_immediately() {
        let mut c = Countdown::new(0.0);
        assert!(c.is_done());
        assert_eq!(c.tick(0.0), Some(0.0));
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        assert_eq!(Countdown::new(-3.0).remaining(), 0.0);
    }
}
