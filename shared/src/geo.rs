use serde::{Deserialize, Serialize};

/// Identifier reserved for the collector anchor on the map.
pub const COLLECTOR_ID: &str = "collector";

/// Fixed collector position (lat/lng-like degrees).
pub const COLLECTOR_POSITION: Coordinates = Coordinates { x: 22.0, y: 77.0 };

/// Radius band, in degrees, that node placements are drawn from.
pub const MIN_PLACEMENT_RADIUS: f64 = 0.8;
pub const MAX_PLACEMENT_RADIUS: f64 = 2.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `angle` radians and `radius` degrees from `self`.
    pub fn polar_offset(&self, angle: f64, radius: f64) -> Self {
        Self {
            x: self.x + angle.cos() * radius,
            y: self.y + angle.sin() * radius,
        }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Deterministic placement around `anchor` via CRC32 of the node id.
///
/// Low 16 bits of the hash pick the angle, high 16 bits pick where in the
/// radius band the node lands.
pub fn hashed_offset(id: &str, anchor: Coordinates, min_radius: f64, max_radius: f64) -> Coordinates {
    let hash = crc32fast::hash(id.as_bytes());
    let angle_frac = (hash & 0xffff) as f64 / 65_536.0;
    let radius_frac = (hash >> 16) as f64 / 65_535.0;
    let angle = angle_frac * std::f64::consts::TAU;
    let radius = min_radius + radius_frac * (max_radius - min_radius);
    anchor.polar_offset(angle, radius)
}
