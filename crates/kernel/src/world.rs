use glam::Vec3;
use lanerunner_common::{MoverKind, Transform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::arena::{Arena, Handle};
use crate::mover::{Mover, MoverStatus};

/// Ticks between arena compaction passes.
const COMPACT_INTERVAL: u64 = 256;

/// An event record produced by every mutation to the mover population.
///
/// Hosts drain the log each frame to create and destroy their visuals.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A mover was spawned at the given transform.
    MoverSpawned {
        handle: Handle,
        kind: MoverKind,
        transform: Transform,
    },
    /// A mover reached the end of its path plus buffer.
    MoverTerminated {
        handle: Handle,
        kind: MoverKind,
        position: Vec3,
    },
    /// A mover was removed before finishing (e.g. its segment was evicted).
    MoverRemoved { handle: Handle, kind: MoverKind },
    /// Simulation advanced one tick.
    Stepped { tick: u64, dt: f32 },
}

/// The authoritative mover population plus the simulation clock and RNG.
///
/// Movers live in a generational arena; a terminated mover's handle reads as
/// dead immediately, so lane lists that still hold it can prune lazily.
#[derive(Debug)]
pub struct World {
    movers: Arena<Mover>,
    tick: u64,
    time: f64,
    seed: u64,
    rng: ChaCha8Rng,
    /// Append-only event log of all mutations.
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl World {
    /// Create an empty world at tick 0 with seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world whose random draws are reproducible for `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            movers: Arena::new(),
            tick: 0,
            time: 0.0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            event_log: Vec::new(),
        }
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since creation.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// The mover population and the RNG borrowed together, for callers that
    /// read movers while drawing random numbers.
    pub fn movers_and_rng(&mut self) -> (&Arena<Mover>, &mut ChaCha8Rng) {
        (&self.movers, &mut self.rng)
    }

    pub fn mover_count(&self) -> usize {
        self.movers.len()
    }

    pub fn movers(&self) -> &Arena<Mover> {
        &self.movers
    }

    pub fn mover(&self, handle: Handle) -> Option<&Mover> {
        self.movers.get(handle)
    }

    pub fn is_alive(&self, handle: Handle) -> bool {
        self.movers.contains(handle)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn spawn_mover(&mut self, mover: Mover) -> Handle {
        let kind = mover.kind();
        let transform = mover.transform();
        let handle = self.movers.insert(mover);
        tracing::debug!(%handle, ?kind, position = ?transform.position, "mover spawned");
        self.event_log.push(WorldEvent::MoverSpawned {
            handle,
            kind,
            transform,
        });
        handle
    }

    /// Remove a mover before it finishes its path.
    pub fn remove_mover(&mut self, handle: Handle) -> Option<Mover> {
        let mover = self.movers.remove(handle)?;
        self.event_log.push(WorldEvent::MoverRemoved {
            handle,
            kind: mover.kind(),
        });
        Some(mover)
    }

    /// Advance every mover by `dt` and release the ones that terminated.
    /// Returns the handles released this tick.
    pub fn step(&mut self, dt: f32) -> Vec<Handle> {
        let dt = dt.max(0.0);
        self.tick += 1;
        self.time += f64::from(dt);

        let finished: Vec<Handle> = self
            .movers
            .iter_mut()
            .filter_map(|(handle, mover)| {
                (mover.advance(dt) == MoverStatus::Terminated).then_some(handle)
            })
            .collect();

        for &handle in &finished {
            if let Some(mover) = self.movers.remove(handle) {
                tracing::debug!(%handle, kind = ?mover.kind(), "mover terminated");
                self.event_log.push(WorldEvent::MoverTerminated {
                    handle,
                    kind: mover.kind(),
                    position: mover.position(),
                });
            }
        }

        if self.tick % COMPACT_INTERVAL == 0 {
            let reclaimed = self.movers.compact();
            if reclaimed > 0 {
                tracing::trace!(reclaimed, "mover arena compacted");
            }
        }

        self.event_log.push(WorldEvent::Stepped { tick: self.tick, dt });
        finished
    }

    /// Deterministic hash of the simulation state for comparing runs.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        mix(&mut h, &self.seed.to_le_bytes());
        for (handle, mover) in self.movers.iter() {
            mix(&mut h, &handle.index().to_le_bytes());
            mix(&mut h, &handle.generation().to_le_bytes());
            let p = mover.position();
            mix(&mut h, &p.x.to_le_bytes());
            mix(&mut h, &p.y.to_le_bytes());
            mix(&mut h, &p.z.to_le_bytes());
            mix(&mut h, &mover.speed().to_le_bytes());
        }
        h
    }
}
