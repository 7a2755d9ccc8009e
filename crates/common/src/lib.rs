//! Shared types for the lanerunner core: transforms, bounds, kinds, ranges and
//! the host service traits.
//!
//! # Invariants
//! - The primary axis is Z; the observer runs toward -Z.
//! - Services are optional capabilities; a missing one degrades to a no-op.

pub mod bounds;
pub mod range;
pub mod services;
pub mod types;

pub use bounds::Aabb;
pub use range::{CountRange, SpanRange, lerp_clamped};
pub use services::{
    Audio, AudioCall, AudioLog, AudioService, Clip, DeclaredGeometry, GeometryDesc,
    GeometryService, LoopHandle, NoHits, RaycastService,
};
pub use types::{MoverKind, SegmentKind, Transform};
