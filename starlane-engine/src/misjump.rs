//! Probabilistic misjump resolution: roll, cause attribution, deviation,
//! and secondary penalties.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::calculator::WarpCalculationResult;
use crate::constants::{
    CAUSE_TIEBREAK_WEIGHT_MAX, MISJUMP_DAMAGE_MAX, MISJUMP_DAMAGE_MIN,
    MISJUMP_DAMAGE_SEVERE_BASELINE, MISJUMP_DELAY_MAX_TICKS, MISJUMP_DELAY_MIN_TICKS,
};
use crate::coords::{GridBounds, GridCoordinate3D};
use crate::rng::RngBundle;

/// Narrative attribution for a misjump, picked from the dominant factor.
///
/// Declaration order is the documented tie-break: when two factor weights
/// compare exactly equal, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisjumpCause {
    Distance,
    Terrain,
    Weather,
    GravityWell,
    Interdiction,
    EngineFault,
    NavigatorError,
}

/// Candidate weight considered during cause selection, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CauseWeight {
    pub cause: MisjumpCause,
    pub weight: f64,
}

/// Explainability trace for one misjump resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisjumpDecisionTrace {
    /// Uniform roll compared against the mishap chance.
    pub roll: f64,
    pub candidates: SmallVec<[CauseWeight; 8]>,
    pub chosen: MisjumpCause,
}

/// Outcome of rolling one jump against its calculated mishap chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MisjumpResult {
    pub has_misjump: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<MisjumpCause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<GridCoordinate3D>,
    /// Where the unit actually arrives; equals the request destination when
    /// the jump lands clean.
    pub actual_destination: GridCoordinate3D,
    pub damage_percent: f64,
    pub delay_ticks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<MisjumpDecisionTrace>,
}

impl MisjumpResult {
    fn clean(destination: GridCoordinate3D) -> Self {
        Self {
            has_misjump: false,
            cause: None,
            offset: None,
            actual_destination: destination,
            damage_percent: 0.0,
            delay_ticks: 0,
            trace: None,
        }
    }
}

/// Roll a calculated jump, resolving cause, deviation, and penalties.
///
/// When the dominant cause is an interdiction field and a drop point is
/// known, the traveler surfaces at the drop point instead of a random
/// offset from the destination.
#[must_use]
pub fn resolve(
    calc: &WarpCalculationResult,
    destination: GridCoordinate3D,
    interdiction_drop: Option<GridCoordinate3D>,
    bounds: &GridBounds,
    rng: &RngBundle,
) -> MisjumpResult {
    let roll: f64 = rng.roll().gen_range(0.0..1.0);
    if roll >= calc.mishap_chance {
        return MisjumpResult::clean(destination);
    }

    let (chosen, candidates) = select_cause(calc, rng);
    let severe = matches!(
        chosen,
        MisjumpCause::Interdiction | MisjumpCause::GravityWell
    );

    let (offset, actual_destination) = match (chosen, interdiction_drop) {
        (MisjumpCause::Interdiction, Some(drop)) => (None, bounds.clamp(drop)),
        _ => {
            let range = calc.deviation_range.max(1);
            let offset = {
                let mut stream = rng.offset();
                GridCoordinate3D {
                    x: stream.gen_range(-range..=range),
                    y: stream.gen_range(-range..=range),
                    z: stream.gen_range(-range..=range),
                }
            };
            (Some(offset), bounds.clamp(destination.offset_by(offset.x, offset.y, offset.z)))
        }
    };

    let (damage_percent, delay_ticks) = {
        let mut stream = rng.penalty();
        let mut damage = stream.gen_range(MISJUMP_DAMAGE_MIN..=MISJUMP_DAMAGE_MAX);
        if severe {
            damage += MISJUMP_DAMAGE_SEVERE_BASELINE;
        }
        (
            damage,
            stream.gen_range(MISJUMP_DELAY_MIN_TICKS..=MISJUMP_DELAY_MAX_TICKS),
        )
    };

    MisjumpResult {
        has_misjump: true,
        cause: Some(chosen),
        offset,
        actual_destination,
        damage_percent,
        delay_ticks,
        trace: Some(MisjumpDecisionTrace {
            roll,
            candidates,
            chosen,
        }),
    }
}

/// Pick the dominant cause by strictly-greater comparison over a fixed
/// candidate order; exact ties fall to the earlier candidate.
fn select_cause(
    calc: &WarpCalculationResult,
    rng: &RngBundle,
) -> (MisjumpCause, SmallVec<[CauseWeight; 8]>) {
    let (engine_noise, navigator_noise) = {
        let mut stream = rng.cause();
        (
            stream.gen_range(0.0..CAUSE_TIEBREAK_WEIGHT_MAX),
            stream.gen_range(0.0..CAUSE_TIEBREAK_WEIGHT_MAX),
        )
    };
    let candidates: SmallVec<[CauseWeight; 8]> = SmallVec::from_slice(&[
        CauseWeight {
            cause: MisjumpCause::Distance,
            weight: calc.factors.distance,
        },
        CauseWeight {
            cause: MisjumpCause::Terrain,
            weight: calc.factors.terrain,
        },
        CauseWeight {
            cause: MisjumpCause::Weather,
            weight: calc.factors.weather,
        },
        CauseWeight {
            cause: MisjumpCause::GravityWell,
            weight: calc.factors.gravity,
        },
        CauseWeight {
            cause: MisjumpCause::Interdiction,
            weight: calc.factors.interdiction,
        },
        CauseWeight {
            cause: MisjumpCause::EngineFault,
            weight: engine_noise,
        },
        CauseWeight {
            cause: MisjumpCause::NavigatorError,
            weight: navigator_noise,
        },
    ]);
    let mut chosen = candidates[0];
    for candidate in candidates.iter().skip(1) {
        if candidate.weight > chosen.weight {
            chosen = *candidate;
        }
    }
    (chosen.cause, candidates)
}
