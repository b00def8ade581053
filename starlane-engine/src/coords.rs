//! Galaxy grid geometry: coordinates, bounds, and straight-path sampling.

use serde::{Deserialize, Serialize};

use crate::constants::{GRID_DEPTH, GRID_HEIGHT, GRID_WIDTH};
use crate::numbers::round_f64_to_i32;

/// Integer cell address in galaxy space. `z` defaults to the galactic plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GridCoordinate3D {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub z: i32,
}

impl GridCoordinate3D {
    /// Planar coordinate with `z = 0`.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, z: 0 }
    }

    #[must_use]
    pub const fn with_z(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other` in grid units.
    #[must_use]
    pub fn grid_distance(self, other: Self) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        let dz = f64::from(other.z - self.z);
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// Translate by a per-axis offset without bounds checking.
    #[must_use]
    pub const fn offset_by(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

impl std::fmt::Display for GridCoordinate3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Inclusive-exclusive extent of the playable grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl GridBounds {
    #[must_use]
    pub const fn new(width: i32, height: i32, depth: i32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Whether a coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, coord: GridCoordinate3D) -> bool {
        coord.x >= 0
            && coord.x < self.width
            && coord.y >= 0
            && coord.y < self.height
            && coord.z >= 0
            && coord.z < self.depth
    }

    /// Clamp a coordinate onto the nearest in-bounds cell.
    #[must_use]
    pub fn clamp(&self, coord: GridCoordinate3D) -> GridCoordinate3D {
        GridCoordinate3D {
            x: coord.x.clamp(0, self.width - 1),
            y: coord.y.clamp(0, self.height - 1),
            z: coord.z.clamp(0, self.depth - 1),
        }
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT, GRID_DEPTH)
    }
}

/// Linearly interpolated sample points along the straight segment from
/// `origin` to `destination`, including both endpoints.
///
/// Sample count is `max(|dx|, |dy|) + 1` so adjacent samples never skip a
/// column or row of the planar grid.
#[must_use]
pub fn sample_path(origin: GridCoordinate3D, destination: GridCoordinate3D) -> Vec<GridCoordinate3D> {
    let dx = (destination.x - origin.x).abs();
    let dy = (destination.y - origin.y).abs();
    let steps = dx.max(dy).max(0);
    let mut points = Vec::with_capacity((steps + 1).unsigned_abs() as usize);
    if steps == 0 {
        points.push(origin);
        if destination != origin {
            points.push(destination);
        }
        return points;
    }
    for i in 0..=steps {
        let t = f64::from(i) / f64::from(steps);
        points.push(GridCoordinate3D {
            x: round_f64_to_i32(f64::from(origin.x) + t * f64::from(destination.x - origin.x)),
            y: round_f64_to_i32(f64::from(origin.y) + t * f64::from(destination.y - origin.y)),
            z: round_f64_to_i32(f64::from(origin.z) + t * f64::from(destination.z - origin.z)),
        });
    }
    points
}
