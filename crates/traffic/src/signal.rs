use lanerunner_kernel::Countdown;
use serde::{Deserialize, Serialize};

/// Whether a train is due or passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalState {
    Go,
    Warning,
}

/// What the signal lamp currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalColor {
    Green,
    Red,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Blink {
    lit: bool,
    countdown: Countdown,
}

/// Crossing signal: steady green while clear, red/off blinking while a
/// train is due or on the tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalController {
    state: SignalState,
    color: SignalColor,
    blink_interval: f32,
    blink: Option<Blink>,
}

impl SignalController {
    pub fn new(blink_interval: f32) -> Self {
        Self {
            state: SignalState::Go,
            color: SignalColor::Green,
            blink_interval: blink_interval.max(0.0),
            blink: None,
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn color(&self) -> SignalColor {
        self.color
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_some()
    }

    /// Enter `Warning` and (re)start blinking with the lamp lit.
    pub fn warn(&mut self) {
        self.state = SignalState::Warning;
        self.color = SignalColor::Red;
        self.blink = Some(Blink {
            lit: true,
            countdown: Countdown::new(self.blink_interval),
        });
    }

    /// Back to `Go`: blinking stops and the lamp turns green.
    pub fn clear(&mut self) {
        self.state = SignalState::Go;
        self.color = SignalColor::Green;
        self.blink = None;
    }

    /// Stop blinking and leave the lamp showing whatever it shows now.
    pub fn freeze(&mut self) {
        self.blink = None;
    }

    pub fn tick(&mut self, dt: f32) {
        let interval = self.blink_interval;
        let Some(blink) = self.blink.as_mut() else {
            return;
        };
        let mut budget = dt.max(0.0);
        // a zero interval toggles once per tick
        while let Some(overshoot) = blink.countdown.tick(budget) {
            blink.lit = !blink.lit;
            blink.countdown = Countdown::new(interval);
            if interval <= 0.0 {
                break;
            }
            budget = overshoot;
        }
        self.color = if blink.lit {
            SignalColor::Red
        } else {
            SignalColor::Off
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_green() {
        let s = SignalController::new(0.3);
        assert_eq!(s.state(), SignalState::Go);
        assert_eq!(s.color(), SignalColor::Green);
        assert!(!s.is_blinking());
    }

    #[test]
    fn warning_shows_red_immediately_then_toggles() {
        let mut s = SignalController::new(0.25);
        s.warn();
        assert_eq!(s.state(), SignalState::Warning);
        assert_eq!(s.color(), SignalColor::Red);
        s.tick(0.125);
        assert_eq!(s.color(), SignalColor::Red);
        s.tick(0.125);
        assert_eq!(s.color(), SignalColor::Off);
        s.tick(0.25);
        assert_eq!(s.color(), SignalColor::Red);
        // a long tick crosses two toggles
        s.tick(0.5);
        assert_eq!(s.color(), SignalColor::Red);
    }

    #[test]
    fn clear_returns_to_green() {
        let mut s = SignalController::new(0.3);
        s.warn();
        s.tick(0.3);
        s.clear();
        assert_eq!(s.state(), SignalState::Go);
        assert_eq!(s.color(), SignalColor::Green);
        s.tick(1.0);
        assert_eq!(s.color(), SignalColor::Green);
    }

    #[test]
    fn freeze_keeps_color() {
        let mut s = SignalController::new(0.25);
        s.warn();
        s.tick(0.25);
        assert_eq!(s.color(), SignalColor::Off);
        s.freeze();
        s.tick(10.0);
        assert_eq!(s.color(), SignalColor::Off);
        assert_eq!(s.state(), SignalState::Warning);
    }
}
