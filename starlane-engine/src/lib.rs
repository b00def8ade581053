//! Starlane Warp Engine
//!
//! Deterministic warp travel mechanics for a tick-based galactic strategy
//! game. This crate covers the full jump pipeline: cost and risk
//! calculation, space weather, interdiction fields, gravity wells, misjump
//! resolution, the charge/warp/cooldown phase machine, and the navigation
//! engine that orchestrates them against injected persistence, grid
//! occupancy, and event collaborators.

pub mod calculator;
pub mod constants;
pub mod coords;
pub mod engine;
pub mod error;
pub mod events;
pub mod gravity;
pub mod interdiction;
pub mod misjump;
pub mod numbers;
pub mod rng;
pub mod store;
pub mod travel;
pub mod weather;

// Re-export commonly used types
pub use calculator::{
    FuelClass, JumpProfile, MishapFactors, WarpCalculationResult, calculate, deviation_range,
    distance_ly, fuel_cost, mishap_chance, warp_time,
};
pub use coords::{GridBounds, GridCoordinate3D, sample_path};
pub use engine::{
    ClockTick, SessionSpace, WarpAccepted, WarpNavigationEngine, WarpRequest, WarpRequestOutcome,
};
pub use error::{ErrorCode, WarpError};
pub use events::{EventSink, RecordingSink, TravelEvent, TravelEventKind};
pub use gravity::{GravityWell, GravityWellMap};
pub use interdiction::{
    FieldError, FieldId, FieldSource, InterdictionField, InterdictionRegistry, PathHit,
};
pub use misjump::{MisjumpCause, MisjumpDecisionTrace, MisjumpResult};
pub use rng::{CountingRng, RngBundle};
pub use store::{EntryDecision, GridOccupancy, MemoryTravelStore, OpenGrid, TravelStore};
pub use travel::{
    BoundarySet, FactionId, PhaseBoundary, PhaseDurations, SessionId, TravelId, TravelStatus,
    UnitId, WarpPhase, WarpTravel,
};
pub use weather::{SpaceWeather, WeatherField};
