//! World Kernel: the mover population, simulation clock and seeded RNG.
//!
//! # Invariants
//! - All mover mutations flow through explicit operations and are logged.
//! - A mover's direction and speed never change after it is spawned.
//! - Handles to released movers never resolve again, even after compaction.

pub mod arena;
pub mod carrier;
pub mod mover;
pub mod wait;
pub mod world;

pub use arena::{Arena, Handle};
pub use carrier::CarrierLink;
pub use mover::{Mover, MoverStatus};
pub use wait::Countdown;
pub use world::{World, WorldEvent};
