//! Space weather cells and worst-condition path queries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coords::{GridCoordinate3D, sample_path};

/// Weather condition occupying a planar grid cell.
///
/// Variants are ordered from calm to violent; `severity` gives the total
/// order used by path queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpaceWeather {
    #[default]
    Clear,
    CosmicDust,
    RadiationBelt,
    SolarFlare,
    IonStorm,
    WarpTurbulence,
}

impl SpaceWeather {
    /// Rank under the fixed severity order; higher is worse.
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::CosmicDust => 1,
            Self::RadiationBelt => 2,
            Self::SolarFlare => 3,
            Self::IonStorm => 4,
            Self::WarpTurbulence => 5,
        }
    }

    /// Additive mishap term contributed when this is the worst weather on
    /// the path.
    #[must_use]
    pub const fn mishap_factor(self) -> f64 {
        match self {
            Self::Clear => 0.0,
            Self::CosmicDust => 0.01,
            Self::RadiationBelt => 0.03,
            Self::SolarFlare => 0.05,
            Self::IonStorm => 0.09,
            Self::WarpTurbulence => 0.15,
        }
    }

    /// Fuel multiplier applied while crossing this weather.
    #[must_use]
    pub const fn fuel_multiplier(self) -> f64 {
        match self {
            Self::Clear => 1.0,
            Self::CosmicDust => 1.05,
            Self::RadiationBelt => 1.1,
            Self::SolarFlare => 1.15,
            Self::IonStorm => 1.3,
            Self::WarpTurbulence => 1.5,
        }
    }

    #[must_use]
    pub const fn is_hazardous(self) -> bool {
        !matches!(self, Self::Clear)
    }
}

/// Session-scoped map of seeded weather cells; unseeded cells read `Clear`.
///
/// Read-only to the travel pipeline; only explicit seeding mutates it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherField {
    cells: HashMap<(i32, i32), SpaceWeather>,
}

impl WeatherField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the weather for one planar cell.
    pub fn set_cell(&mut self, x: i32, y: i32, weather: SpaceWeather) {
        if weather == SpaceWeather::Clear {
            self.cells.remove(&(x, y));
        } else {
            self.cells.insert((x, y), weather);
        }
    }

    /// Weather at a planar cell, defaulting to `Clear`.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> SpaceWeather {
        self.cells.get(&(x, y)).copied().unwrap_or_default()
    }

    /// Number of seeded (non-clear) cells.
    #[must_use]
    pub fn seeded_cells(&self) -> usize {
        self.cells.len()
    }

    /// Worst weather sampled along the straight path between two points.
    #[must_use]
    pub fn worst_along_path(
        &self,
        origin: GridCoordinate3D,
        destination: GridCoordinate3D,
    ) -> SpaceWeather {
        sample_path(origin, destination)
            .into_iter()
            .map(|point| self.cell(point.x, point.y))
            .max_by_key(|weather| weather.severity())
            .unwrap_or_default()
    }
}
