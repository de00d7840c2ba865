//! World-space position and planar distance helpers.
//!
//! The host uses a y-up coordinate system.  Every parking decision is made
//! on the ground plane, so distances here ignore `y` entirely.

/// A world-space point in host units (metres).  `y` is height.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A point on the ground plane (`y = 0`).
    #[inline]
    pub fn ground(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Squared distance on the x/z plane.  Use for comparisons.
    #[inline]
    pub fn planar_distance_sq(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Distance on the x/z plane in metres.
    #[inline]
    pub fn planar_distance(self, other: Position) -> f32 {
        self.planar_distance_sq(other).sqrt()
    }

    /// `true` if `other` lies within `radius` on the ground plane.
    /// The boundary is inclusive.
    #[inline]
    pub fn within(self, other: Position, radius: f32) -> bool {
        self.planar_distance_sq(other) <= radius * radius
    }

    /// `false` if any coordinate is NaN or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}
