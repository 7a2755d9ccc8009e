//! Streaming: endless terrain chained along a center axis and two side axes.
//!
//! # Invariants
//! - Forward cursors only decrease, backward cursors only increase.
//! - A segment's local extents are fixed before it is positioned.
//! - Consecutive center groups never share a kind, except for the forced
//!   grass fallback.
//! - Within one update, generation runs before eviction; an evicted segment
//!   never comes back.

mod cursor;
mod prefab;
mod segment;
mod select;
mod streamer;

pub use cursor::{AttachmentCursor, Axis, CursorSet, Direction};
pub use prefab::{PrefabCatalog, SegmentPrefab};
pub use segment::{MeasuredSegment, Segment, SegmentId};
pub use select::{GroupSizes, MAX_TYPE_ATTEMPTS, TypeWeights, choose_kind};
pub use streamer::{SegmentStreamer, StreamConfig, StreamDelta, StreamStats};

pub fn crate_info() -> &'static str {
    "lanerunner-stream v0.1.0"
}
