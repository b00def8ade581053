//! Warp travel records and the phase state machine advanced by the clock.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::calculator::{MishapFactors, WarpCalculationResult};
use crate::coords::GridCoordinate3D;
use crate::error::WarpError;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of one game session (one galaxy instance).
    SessionId
);
id_newtype!(
    /// Identifier of a mobile unit (ship, fleet flagship).
    UnitId
);
id_newtype!(
    /// Identifier of the faction a unit belongs to.
    FactionId
);
id_newtype!(
    /// Identifier of one warp travel record.
    TravelId
);

/// Phase of a travel as driven by the external clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpPhase {
    Charging,
    Warping,
    Cooling,
    /// Terminal resting phase after completion, cancellation, or failure.
    Idle,
}

/// Overall lifecycle status of a travel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl TravelStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Ticks budgeted for each phase of one travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub charge: u32,
    pub warp: u32,
    pub cool: u32,
}

impl PhaseDurations {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.charge + self.warp + self.cool
    }

    const fn for_phase(&self, phase: WarpPhase) -> Option<u32> {
        match phase {
            WarpPhase::Charging => Some(self.charge),
            WarpPhase::Warping => Some(self.warp),
            WarpPhase::Cooling => Some(self.cool),
            WarpPhase::Idle => None,
        }
    }
}

/// Boundary crossed while advancing a travel. Emitted in order; a single
/// `advance` call may cross several boundaries when ticks were missed, but
/// never skips one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseBoundary {
    /// Charging finished; the jump is now committed.
    WarpEntered,
    /// Warp finished; misjump resolution happens exactly once here.
    CoolingEntered,
    /// Cooldown finished; the unit arrives.
    TravelCompleted,
}

pub type BoundarySet = SmallVec<[PhaseBoundary; 3]>;

/// Durable record of one point-to-point jump. Created at request acceptance,
/// mutated only by phase advancement, never physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpTravel {
    pub id: TravelId,
    pub session: SessionId,
    pub unit: UnitId,
    pub faction: FactionId,
    pub origin: GridCoordinate3D,
    pub destination: GridCoordinate3D,
    pub phase: WarpPhase,
    /// Tick at which the current phase began; successor phases chain from
    /// `phase_started_tick + duration` so catch-up stays exact.
    pub phase_started_tick: u64,
    pub durations: PhaseDurations,
    pub distance_ly: f64,
    pub engine_level: u8,
    pub fuel_cost: f64,
    pub mishap_chance: f64,
    pub deviation_range: i32,
    pub factors: MishapFactors,
    /// Early-exit point imposed by an interdiction field on the path, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interdiction_drop: Option<GridCoordinate3D>,
    pub has_misjump: bool,
    #[serde(default)]
    pub misjump_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misjump_offset: Option<GridCoordinate3D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_destination: Option<GridCoordinate3D>,
    pub status: TravelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_tick: u64,
}

impl WarpTravel {
    /// Create a travel in `Charging` at the accepting tick.
    #[must_use]
    pub fn begin_charging(
        id: TravelId,
        session: SessionId,
        unit: UnitId,
        faction: FactionId,
        origin: GridCoordinate3D,
        destination: GridCoordinate3D,
        engine_level: u8,
        charge: u32,
        cool: u32,
        calc: &WarpCalculationResult,
        interdiction_drop: Option<GridCoordinate3D>,
        now: u64,
    ) -> Self {
        Self {
            id,
            session,
            unit,
            faction,
            origin,
            destination,
            phase: WarpPhase::Charging,
            phase_started_tick: now,
            durations: PhaseDurations {
                charge,
                warp: calc.travel_ticks,
                cool,
            },
            distance_ly: calc.distance_ly,
            engine_level,
            fuel_cost: calc.fuel_cost,
            mishap_chance: calc.mishap_chance,
            deviation_range: calc.deviation_range,
            factors: calc.factors,
            interdiction_drop,
            has_misjump: false,
            misjump_resolved: false,
            misjump_offset: None,
            actual_destination: None,
            status: TravelStatus::InProgress,
            failure_reason: None,
            created_tick: now,
        }
    }

    /// Destination the unit actually arrives at.
    #[must_use]
    pub fn arrival_point(&self) -> GridCoordinate3D {
        self.actual_destination.unwrap_or(self.destination)
    }

    /// Ticks elapsed in the current phase as of `now`.
    #[must_use]
    pub const fn ticks_in_phase(&self, now: u64) -> u64 {
        now.saturating_sub(self.phase_started_tick)
    }

    /// Cross at most one phase boundary if the current phase has run its
    /// full duration by `now`. The successor phase starts at
    /// `phase_started_tick + duration`, so catch-up stays exact.
    ///
    /// Callers that mutate durations between boundaries (misjump delays
    /// extend the cooldown) must use this rather than [`Self::advance`].
    pub fn advance_once(&mut self, now: u64) -> Option<PhaseBoundary> {
        if self.status != TravelStatus::InProgress {
            return None;
        }
        let duration = self.durations.for_phase(self.phase)?;
        if self.ticks_in_phase(now) < u64::from(duration) {
            return None;
        }
        self.phase_started_tick += u64::from(duration);
        match self.phase {
            WarpPhase::Charging => {
                self.phase = WarpPhase::Warping;
                Some(PhaseBoundary::WarpEntered)
            }
            WarpPhase::Warping => {
                self.phase = WarpPhase::Cooling;
                Some(PhaseBoundary::CoolingEntered)
            }
            WarpPhase::Cooling => {
                self.phase = WarpPhase::Idle;
                Some(PhaseBoundary::TravelCompleted)
            }
            WarpPhase::Idle => None,
        }
    }

    /// Advance the phase machine to `now`, returning every boundary crossed
    /// in order. Phases chain at exact boundaries; none is ever skipped.
    pub fn advance(&mut self, now: u64) -> BoundarySet {
        let mut crossed = BoundarySet::new();
        while let Some(boundary) = self.advance_once(now) {
            crossed.push(boundary);
        }
        crossed
    }

    /// Cancel the travel. Charging is the sole abort window; once warping
    /// begins the jump is committed.
    ///
    /// # Errors
    ///
    /// Returns `WarpError::Cancellation` when the travel is past `Charging`.
    pub fn cancel(&mut self) -> Result<(), WarpError> {
        if self.phase != WarpPhase::Charging || self.status != TravelStatus::InProgress {
            return Err(WarpError::Cancellation { phase: self.phase });
        }
        self.phase = WarpPhase::Idle;
        self.status = TravelStatus::Cancelled;
        Ok(())
    }

    /// Mark the travel failed, recording the reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.phase = WarpPhase::Idle;
        self.status = TravelStatus::Failed;
        self.failure_reason = Some(reason.into());
    }
}
