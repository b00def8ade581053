//! Pure warp math: distance, duration, misjump chance, deviation, fuel cost.
//!
//! Every function here is deterministic and side-effect-free; the engine
//! layers registries and randomness on top of these numbers.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_SPEED_LY_PER_TICK, DEVIATION_DISTANCE_FACTOR, DEVIATION_MAX_OFFSET, DEVIATION_MIN_OFFSET,
    DEVIATION_TERRAIN_MULTIPLIER, FUEL_BASE, FUEL_DISTANCE_FACTOR, FUEL_EMERGENCY_MULTIPLIER,
    FUEL_ENGINE_EFFICIENCY, FUEL_MIN_COST, FUEL_PREMIUM_MULTIPLIER, GRAVITY_WELL_SPEED_PENALTY,
    INTERDICTION_MISHAP_FACTOR, LIGHT_YEARS_PER_GRID, MISHAP_BASE, MISHAP_DISTANCE_FACTOR,
    MISHAP_ENGINE_REDUCTION, MISHAP_MAX, MISHAP_MIN, MISHAP_NAVIGATOR_REDUCTION,
    SPEED_BONUS_PER_ENGINE_LEVEL,
};
use crate::coords::GridCoordinate3D;
use crate::numbers::{ceil_f64_to_u32, round_f64_to_i32};

/// Fuel grade loaded for the jump; scales the final cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FuelClass {
    #[default]
    Standard,
    Premium,
    Emergency,
}

impl FuelClass {
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Premium => FUEL_PREMIUM_MULTIPLIER,
            Self::Emergency => FUEL_EMERGENCY_MULTIPLIER,
        }
    }
}

/// Named additive terms behind a mishap chance, kept for diagnostics and
/// misjump cause attribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MishapFactors {
    pub base: f64,
    pub distance: f64,
    pub terrain: f64,
    pub weather: f64,
    pub gravity: f64,
    pub interdiction: f64,
    pub engine_reduction: f64,
    pub navigator_reduction: f64,
}

impl MishapFactors {
    /// Unclamped sum of all terms.
    #[must_use]
    pub fn raw_total(&self) -> f64 {
        self.base + self.distance + self.terrain + self.weather + self.gravity + self.interdiction
            - self.engine_reduction
            - self.navigator_reduction
    }
}

/// Inputs gathered for one jump calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct JumpProfile {
    pub engine_level: u8,
    pub navigator_skill: u8,
    pub fuel_class: FuelClass,
    /// Additive mishap term from local terrain.
    pub terrain_factor: f64,
    /// Terrain instability scaling misjump deviation, `0.0..=1.0`.
    pub terrain_instability: f64,
    /// Fuel multiplier from local terrain.
    pub terrain_fuel_multiplier: f64,
    /// Additive mishap term sampled from weather along the path.
    pub weather_factor: f64,
    /// Fuel multiplier sampled from weather along the path.
    pub weather_fuel_multiplier: f64,
    /// Additive mishap term from gravity wells along the path.
    pub gravity_bonus: f64,
    /// Whether an interdiction field intersects the path.
    pub interdicted: bool,
}

/// Value object describing one calculated jump. Not a persistence record;
/// the travel row copies out the scalars it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpCalculationResult {
    pub distance_ly: f64,
    pub fuel_cost: f64,
    pub travel_ticks: u32,
    pub mishap_chance: f64,
    pub deviation_range: i32,
    pub factors: MishapFactors,
}

/// Straight-line jump distance in light-years.
#[must_use]
pub fn distance_ly(a: GridCoordinate3D, b: GridCoordinate3D) -> f64 {
    a.grid_distance(b) * LIGHT_YEARS_PER_GRID
}

/// Ticks spent in the warping phase, floored at one tick.
#[must_use]
pub fn warp_time(distance_ly: f64, engine_level: u8) -> u32 {
    let speed = BASE_SPEED_LY_PER_TICK * (1.0 + f64::from(engine_level) * SPEED_BONUS_PER_ENGINE_LEVEL);
    ceil_f64_to_u32(distance_ly / speed).max(1)
}

/// Additive mishap model, returning both the clamped chance and the
/// individual terms.
#[must_use]
pub fn mishap_chance(
    distance_ly: f64,
    engine_level: u8,
    terrain_factor: f64,
    weather_factor: f64,
    gravity_bonus: f64,
    navigator_skill: u8,
    interdicted: bool,
) -> (f64, MishapFactors) {
    let factors = MishapFactors {
        base: MISHAP_BASE,
        distance: distance_ly * MISHAP_DISTANCE_FACTOR,
        terrain: terrain_factor.max(0.0),
        weather: weather_factor.max(0.0),
        gravity: gravity_bonus.max(0.0),
        interdiction: if interdicted {
            INTERDICTION_MISHAP_FACTOR
        } else {
            0.0
        },
        engine_reduction: f64::from(engine_level) * MISHAP_ENGINE_REDUCTION,
        navigator_reduction: f64::from(navigator_skill) / 100.0 * MISHAP_NAVIGATOR_REDUCTION,
    };
    (factors.raw_total().clamp(MISHAP_MIN, MISHAP_MAX), factors)
}

/// Maximum per-axis misjump offset in grid cells.
#[must_use]
pub fn deviation_range(distance_ly: f64, terrain_instability: f64) -> i32 {
    let instability = terrain_instability.clamp(0.0, 1.0);
    let raw = distance_ly * DEVIATION_DISTANCE_FACTOR * (1.0 + instability * DEVIATION_TERRAIN_MULTIPLIER);
    round_f64_to_i32(raw).clamp(DEVIATION_MIN_OFFSET, DEVIATION_MAX_OFFSET)
}

/// Fuel units burned by the jump, floored at the minimum cost.
#[must_use]
pub fn fuel_cost(
    distance_ly: f64,
    engine_level: u8,
    terrain_multiplier: f64,
    weather_multiplier: f64,
    fuel_class: FuelClass,
) -> f64 {
    let efficiency = 1.0 + f64::from(engine_level) * FUEL_ENGINE_EFFICIENCY;
    let terrain = terrain_multiplier.max(1.0);
    let weather = weather_multiplier.max(1.0);
    let raw = (FUEL_BASE + distance_ly * FUEL_DISTANCE_FACTOR) / efficiency
        * terrain
        * weather
        * fuel_class.multiplier();
    raw.max(FUEL_MIN_COST)
}

/// Assemble the full calculation for one requested jump.
#[must_use]
pub fn calculate(
    origin: GridCoordinate3D,
    destination: GridCoordinate3D,
    profile: &JumpProfile,
) -> WarpCalculationResult {
    let distance = distance_ly(origin, destination);
    let mut travel_ticks = warp_time(distance, profile.engine_level);
    if profile.gravity_bonus > 0.0 {
        // Gravity wells along the path force a slower, safer transit.
        travel_ticks = ceil_f64_to_u32(f64::from(travel_ticks) * (1.0 + GRAVITY_WELL_SPEED_PENALTY)).max(1);
    }
    let (chance, factors) = mishap_chance(
        distance,
        profile.engine_level,
        profile.terrain_factor,
        profile.weather_factor,
        profile.gravity_bonus,
        profile.navigator_skill,
        profile.interdicted,
    );
    WarpCalculationResult {
        distance_ly: distance,
        fuel_cost: fuel_cost(
            distance,
            profile.engine_level,
            profile.terrain_fuel_multiplier,
            profile.weather_fuel_multiplier,
            profile.fuel_class,
        ),
        travel_ticks,
        mishap_chance: chance,
        deviation_range: deviation_range(distance, profile.terrain_instability),
        factors,
    }
}
