use serde::{Deserialize, Serialize};

/// One of the three parallel strips segments are chained along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Center,
    Left,
    Right,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Center, Axis::Left, Axis::Right];
    pub const SIDES: [Axis; 2] = [Axis::Left, Axis::Right];

    /// Lateral (X) position of this strip.
    pub fn lateral(self, side_offset: f32) -> f32 {
        match self {
            Self::Center => 0.0,
            Self::Left => -side_offset,
            Self::Right => side_offset,
        }
    }
}

/// Which way along the primary axis a segment is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Ahead of the observer, toward -Z.
    Forward,
    /// Behind the observer, toward +Z.
    Backward,
}

/// Forward and backward attachment points of one axis.
///
/// `forward` is where the next forward segment's trailing edge (its local
/// max) goes; `backward` is where the next backward segment's local min goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentCursor {
    pub forward: f32,
    pub backward: f32,
}

impl AttachmentCursor {
    /// Cursors flush against a segment spanning `[world_min, world_max]`.
    pub fn flush_with(world_min: f32, world_max: f32, overlap_offset: f32) -> Self {
        Self {
            forward: world_min + overlap_offset,
            backward: world_max + overlap_offset,
        }
    }

    pub fn get(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
        }
    }

    /// Position (Z of the pivot) for a segment with the given local extents,
    /// advancing the cursor past it.
    pub fn place(
        &mut self,
        direction: Direction,
        local_min: f32,
        local_max: f32,
        overlap_offset: f32,
    ) -> f32 {
        match direction {
            Direction::Forward => {
                let z = self.forward - local_max;
                self.forward = z + local_min + overlap_offset;
                z
            }
            Direction::Backward => {
                let z = self.backward - local_min;
                self.backward = z + local_max + overlap_offset;
                z
            }
        }
    }
}

/// The six cursors: forward and backward on each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CursorSet {
    pub center: AttachmentCursor,
    pub left: AttachmentCursor,
    pub right: AttachmentCursor,
}

impl CursorSet {
    pub fn get(&self, axis: Axis) -> &AttachmentCursor {
        match axis {
            Axis::Center => &self.center,
            Axis::Left => &self.left,
            Axis::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, axis: Axis) -> &mut AttachmentCursor {
        match axis {
            Axis::Center => &mut self.center,
            Axis::Left => &mut self.left,
            Axis::Right => &mut self.right,
        }
    }
}
