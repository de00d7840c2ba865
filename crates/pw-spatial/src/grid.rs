//! Uniform grid hashing on the ground plane.

use pw_core::Position;

/// Edge length of one grid cell in world units.
pub const CELL_SIZE: f32 = 8.0;

/// Integer grid coordinate of the cell containing a point.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub z: i32,
}

impl CellKey {
    /// Cell containing `pos` (height ignored).  Coordinates are floored, so
    /// negative positions map to negative cells.
    #[inline]
    pub fn of(pos: Position) -> Self {
        Self {
            x: (pos.x / CELL_SIZE).floor() as i32,
            z: (pos.z / CELL_SIZE).floor() as i32,
        }
    }

    /// The 3×3 block of cells centred on `self`, row by row.
    pub fn neighbourhood(self) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).map(move |dx| CellKey {
                x: self.x.saturating_add(dx),
                z: self.z.saturating_add(dz),
            })
        })
    }
}
