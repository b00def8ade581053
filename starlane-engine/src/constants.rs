//! Centralized balance and tuning constants for the warp travel engine.
//!
//! These values define the deterministic math for jump duration, misjump
//! probability, deviation, fuel cost, and spatial hazards. Keeping them
//! together ensures gameplay can only be adjusted via code changes reviewed
//! in version control, rather than through external config assets.

// Grid geometry ------------------------------------------------------------
pub(crate) const GRID_WIDTH: i32 = 100;
pub(crate) const GRID_HEIGHT: i32 = 100;
pub(crate) const GRID_DEPTH: i32 = 10;
pub(crate) const LIGHT_YEARS_PER_GRID: f64 = 10.0;

// Phase durations (ticks) --------------------------------------------------
pub(crate) const CHARGE_DURATION_TICKS: u32 = 3;
pub(crate) const COOLDOWN_DURATION_TICKS: u32 = 2;

// Warp speed ---------------------------------------------------------------
pub(crate) const BASE_SPEED_LY_PER_TICK: f64 = 10.0;
pub(crate) const SPEED_BONUS_PER_ENGINE_LEVEL: f64 = 0.15;

// Misjump chance -----------------------------------------------------------
pub(crate) const MISHAP_BASE: f64 = 0.02;
pub(crate) const MISHAP_DISTANCE_FACTOR: f64 = 0.0002;
pub(crate) const MISHAP_ENGINE_REDUCTION: f64 = 0.005;
pub(crate) const MISHAP_NAVIGATOR_REDUCTION: f64 = 0.04;
pub(crate) const MISHAP_MIN: f64 = 0.001;
pub(crate) const MISHAP_MAX: f64 = 0.75;

// Misjump deviation (grid cells) -------------------------------------------
pub(crate) const DEVIATION_MIN_OFFSET: i32 = 1;
pub(crate) const DEVIATION_MAX_OFFSET: i32 = 12;
pub(crate) const DEVIATION_DISTANCE_FACTOR: f64 = 0.01;
pub(crate) const DEVIATION_TERRAIN_MULTIPLIER: f64 = 2.0;

// Misjump penalties --------------------------------------------------------
pub(crate) const MISJUMP_DAMAGE_MIN: f64 = 5.0;
pub(crate) const MISJUMP_DAMAGE_MAX: f64 = 25.0;
pub(crate) const MISJUMP_DAMAGE_SEVERE_BASELINE: f64 = 15.0;
pub(crate) const MISJUMP_DELAY_MIN_TICKS: u32 = 1;
pub(crate) const MISJUMP_DELAY_MAX_TICKS: u32 = 4;
pub(crate) const CAUSE_TIEBREAK_WEIGHT_MAX: f64 = 0.01;

// Fuel cost ----------------------------------------------------------------
pub(crate) const FUEL_BASE: f64 = 5.0;
pub(crate) const FUEL_DISTANCE_FACTOR: f64 = 0.8;
pub(crate) const FUEL_ENGINE_EFFICIENCY: f64 = 0.05;
pub(crate) const FUEL_PREMIUM_MULTIPLIER: f64 = 0.85;
pub(crate) const FUEL_EMERGENCY_MULTIPLIER: f64 = 1.5;
pub(crate) const FUEL_MIN_COST: f64 = 1.0;

// Interdiction fields ------------------------------------------------------
pub(crate) const INTERDICTION_RADIUS_MIN: i32 = 1;
pub(crate) const INTERDICTION_RADIUS_MAX: i32 = 10;
pub(crate) const INTERDICTION_STRENGTH_MIN: u8 = 1;
pub(crate) const INTERDICTION_STRENGTH_MAX: u8 = 10;
pub(crate) const INTERDICTION_DROP_DISTANCE: f64 = 2.0;
pub(crate) const INTERDICTION_MISHAP_FACTOR: f64 = 0.15;

// Gravity wells ------------------------------------------------------------
pub(crate) const GRAVITY_WELL_DEFAULT_RADIUS: i32 = 5;
pub(crate) const GRAVITY_WELL_MISHAP_BONUS: f64 = 0.08;
pub(crate) const GRAVITY_WELL_SPEED_PENALTY: f64 = 0.2;
