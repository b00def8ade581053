//! Error taxonomy for warp requests and tick processing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::GridCoordinate3D;
use crate::travel::{UnitId, WarpPhase};

/// Stable machine-readable code attached to every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    Conflict,
    Permission,
    Cancellation,
    Runtime,
}

/// Errors raised when a warp request or lifecycle operation is rejected.
///
/// Request-time rejections are returned, never panicked, and never leave a
/// partial travel record behind.
#[derive(Debug, Error, PartialEq)]
pub enum WarpError {
    #[error("coordinate {coordinate} is outside the grid")]
    Validation { coordinate: GridCoordinate3D },
    #[error("unit {unit} already has a travel in progress")]
    Conflict { unit: UnitId },
    #[error("destination entry denied: {reason}")]
    Permission { reason: String },
    #[error("cancel rejected in phase {phase:?}; only charging travels can abort")]
    Cancellation { phase: WarpPhase },
    #[error("runtime failure: {detail}")]
    Runtime { detail: String },
}

impl WarpError {
    /// Code forwarded to the presentation layer alongside the message.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::Permission { .. } => ErrorCode::Permission,
            Self::Cancellation { .. } => ErrorCode::Cancellation,
            Self::Runtime { .. } => ErrorCode::Runtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_one_to_one() {
        let samples = [
            (
                WarpError::Validation {
                    coordinate: GridCoordinate3D::new(150, 20),
                },
                ErrorCode::Validation,
            ),
            (
                WarpError::Conflict { unit: UnitId(9) },
                ErrorCode::Conflict,
            ),
            (
                WarpError::Permission {
                    reason: String::from("hostile blockade"),
                },
                ErrorCode::Permission,
            ),
            (
                WarpError::Cancellation {
                    phase: WarpPhase::Cooling,
                },
                ErrorCode::Cancellation,
            ),
            (
                WarpError::Runtime {
                    detail: String::from("store unavailable"),
                },
                ErrorCode::Runtime,
            ),
        ];
        for (error, code) in samples {
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn messages_carry_context() {
        let error = WarpError::Permission {
            reason: String::from("grid cell contested"),
        };
        assert!(error.to_string().contains("grid cell contested"));
    }
}
