use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Transform placed at `position` and facing along `direction`.
    ///
    /// A zero direction keeps the identity rotation.
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        let rotation = match direction.try_normalize() {
            Some(dir) => Quat::from_rotation_arc(Vec3::Z, dir),
            None => Quat::IDENTITY,
        };
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }
}

/// Kind of a terrain segment produced by the streamer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SegmentKind {
    #[default]
    None,
    Start,
    SideIsland,
    Grass,
    Road,
    Rail,
    River,
}

impl SegmentKind {
    /// The four kinds the center axis draws from.
    pub const CENTER: [SegmentKind; 4] = [
        SegmentKind::Grass,
        SegmentKind::Road,
        SegmentKind::Rail,
        SegmentKind::River,
    ];

    /// Whether the surrounding scene attaches a spawner to segments of this kind.
    pub fn carries_traffic(self) -> bool {
        matches!(self, Self::Road | Self::Rail | Self::River)
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Start => "start",
            Self::SideIsland => "side",
            Self::Grass => "grass",
            Self::Road => "road",
            Self::Rail => "rail",
            Self::River => "river",
        };
        f.write_str(name)
    }
}

/// Kind of a linearly moving entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoverKind {
    Vehicle,
    /// Floating log on a river; riders inherit its velocity.
    Float,
    Train,
}

impl MoverKind {
    pub fn default_despawn_buffer(self) -> f32 {
        match self {
            Self::Vehicle | Self::Float => 6.0,
            Self::Train => 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn looking_along_rotates_z_onto_direction() {
        let t = Transform::looking_along(Vec3::ZERO, Vec3::X);
        let facing = t.rotation * Vec3::Z;
        assert!((facing - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn looking_along_zero_direction_is_identity() {
        let t = Transform::looking_along(Vec3::ONE, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.position, Vec3::ONE);
    }

    #[test]
    fn only_road_rail_river_carry_traffic() {
        assert!(SegmentKind::Road.carries_traffic());
        assert!(SegmentKind::Rail.carries_traffic());
        assert!(SegmentKind::River.carries_traffic());
        assert!(!SegmentKind::Grass.carries_traffic());
        assert!(!SegmentKind::SideIsland.carries_traffic());
    }

    #[test]
    fn mover_defaults() {
        assert_eq!(MoverKind::Vehicle.default_despawn_buffer(), 6.0);
        assert_eq!(MoverKind::Train.default_despawn_buffer(), 10.0);
        assert_eq!(MoverKind::Float.default_despawn_buffer(), 6.0);
    }
}
