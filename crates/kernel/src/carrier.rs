use glam::Vec3;

use crate::arena::{Arena, Handle};
use crate::mover::Mover;

/// Optional link from a rider to the mover it stands on.
///
/// The rider's effective position is the carrier's position plus a local
/// offset, recomputed every tick. The link holds no ownership; it clears
/// itself when the carrier is gone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarrierLink {
    carrier: Option<Handle>,
    local_offset: Vec3,
}

impl CarrierLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn carrier(&self) -> Option<Handle> {
        self.carrier
    }

    pub fn local_offset(&self) -> Vec3 {
        self.local_offset
    }

    /// Start riding `carrier`, keeping the rider's current world position.
    /// Returns false if the carrier no longer exists.
    pub fn attach(&mut self, movers: &Arena<Mover>, carrier: Handle, rider_position: Vec3) -> bool {
        let Some(mover) = movers.get(carrier) else {
            return false;
        };
        self.carrier = Some(carrier);
        self.local_offset = rider_position - mover.position();
        true
    }

    pub fn detach(&mut self) {
        self.carrier = None;
        self.local_offset = Vec3::ZERO;
    }

    /// Rider position for this tick. Falls back to `free_position` and drops
    /// the link when the carrier has terminated.
    pub fn resolve(&mut self, movers: &Arena<Mover>, free_position: Vec3) -> Vec3 {
        match self.carrier.and_then(|h| movers.get(h)) {
            Some(mover) => mover.position() + self.local_offset,
            None => {
                self.detach();
                free_position
            }
        }
    }

    /// Velocity a rider inherits when leaving the carrier mid-hop.
    pub fn inherited_velocity(&self, movers: &Arena<Mover>) -> Vec3 {
        self.carrier
            .and_then(|h| movers.get(h))
            .map(Mover::velocity)
            .unwrap_or(Vec3::ZERO)
    }
}
