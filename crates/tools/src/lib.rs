//! Developer tooling: read-only scene inspection.
//!
//! # Invariants
//! - Inspection never mutates the scene or draws from its RNG.

pub mod inspector;

pub use inspector::{MoverInfo, SceneInspector, SceneSummary, SegmentInfo, SignalInfo};

pub fn crate_info() -> &'static str {
    "lanerunner-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
