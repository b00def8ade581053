//! Gravity wells: static mass concentrations that destabilize nearby jumps.

use serde::{Deserialize, Serialize};

use crate::constants::{GRAVITY_WELL_DEFAULT_RADIUS, GRAVITY_WELL_MISHAP_BONUS};
use crate::coords::{GridCoordinate3D, sample_path};

/// A massive body whose gravity shadow raises misjump risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityWell {
    pub center: GridCoordinate3D,
    pub radius: i32,
    pub mishap_bonus: f64,
}

impl GravityWell {
    /// Well with the default radius and mishap bonus.
    #[must_use]
    pub const fn at(center: GridCoordinate3D) -> Self {
        Self {
            center,
            radius: GRAVITY_WELL_DEFAULT_RADIUS,
            mishap_bonus: GRAVITY_WELL_MISHAP_BONUS,
        }
    }

    #[must_use]
    pub fn covers(&self, point: GridCoordinate3D) -> bool {
        self.center.grid_distance(point) <= f64::from(self.radius)
    }
}

/// Session-scoped set of gravity wells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GravityWellMap {
    wells: Vec<GravityWell>,
}

impl GravityWellMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, well: GravityWell) {
        self.wells.push(well);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Largest mishap bonus of any well the straight path grazes, or zero.
    #[must_use]
    pub fn bonus_along_path(
        &self,
        origin: GridCoordinate3D,
        destination: GridCoordinate3D,
    ) -> f64 {
        let mut bonus: f64 = 0.0;
        for point in sample_path(origin, destination) {
            for well in &self.wells {
                if well.covers(point) {
                    bonus = bonus.max(well.mishap_bonus);
                }
            }
        }
        bonus
    }
}
