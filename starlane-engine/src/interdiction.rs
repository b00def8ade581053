//! Time-limited interdiction fields and path-intersection queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{
    INTERDICTION_DROP_DISTANCE, INTERDICTION_RADIUS_MAX, INTERDICTION_RADIUS_MIN,
    INTERDICTION_STRENGTH_MAX, INTERDICTION_STRENGTH_MIN,
};
use crate::coords::{GridBounds, GridCoordinate3D, sample_path};
use crate::numbers::round_f64_to_i32;
use crate::travel::FactionId;

/// Identifier of one interdiction field within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u64);

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What projected the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Station,
    Fleet,
    Anomaly,
}

/// Spatial volume that forces foreign travelers out of warp early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterdictionField {
    pub id: FieldId,
    pub owner: FactionId,
    pub center: GridCoordinate3D,
    pub radius: i32,
    pub strength: u8,
    /// Tick after which the field no longer blocks anything.
    pub expires_at_tick: u64,
    pub source: FieldSource,
    pub source_id: u64,
}

impl InterdictionField {
    #[must_use]
    pub const fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at_tick
    }

    /// Whether a point lies inside the field volume.
    #[must_use]
    pub fn covers(&self, point: GridCoordinate3D) -> bool {
        self.center.grid_distance(point) <= f64::from(self.radius)
    }
}

/// First interdiction hit on a sampled path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathHit {
    pub field: FieldId,
    pub owner: FactionId,
    pub strength: u8,
    /// Point where the traveler is forced out of warp: displaced from the
    /// field center outward along the approach vector, clamped to bounds.
    pub drop_point: GridCoordinate3D,
}

/// Errors raised when registering a field with invalid parameters.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("radius {value} out of range [{min}, {max}]")]
    RadiusRange { value: i32, min: i32, max: i32 },
    #[error("strength {value} out of range [{min}, {max}]")]
    StrengthRange { value: u8, min: u8, max: u8 },
    #[error("ttl must be at least one tick")]
    ZeroTtl,
}

/// Session-scoped registry of interdiction fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterdictionRegistry {
    next_id: u64,
    fields: BTreeMap<FieldId, InterdictionField>,
}

impl InterdictionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `FieldError` when radius, strength, or ttl violate bounds.
    pub fn create(
        &mut self,
        owner: FactionId,
        center: GridCoordinate3D,
        radius: i32,
        strength: u8,
        ttl_ticks: u64,
        source: FieldSource,
        source_id: u64,
        now: u64,
    ) -> Result<FieldId, FieldError> {
        if !(INTERDICTION_RADIUS_MIN..=INTERDICTION_RADIUS_MAX).contains(&radius) {
            return Err(FieldError::RadiusRange {
                value: radius,
                min: INTERDICTION_RADIUS_MIN,
                max: INTERDICTION_RADIUS_MAX,
            });
        }
        if !(INTERDICTION_STRENGTH_MIN..=INTERDICTION_STRENGTH_MAX).contains(&strength) {
            return Err(FieldError::StrengthRange {
                value: strength,
                min: INTERDICTION_STRENGTH_MIN,
                max: INTERDICTION_STRENGTH_MAX,
            });
        }
        if ttl_ticks == 0 {
            return Err(FieldError::ZeroTtl);
        }
        self.next_id += 1;
        let id = FieldId(self.next_id);
        self.fields.insert(
            id,
            InterdictionField {
                id,
                owner,
                center,
                radius,
                strength,
                expires_at_tick: now.saturating_add(ttl_ticks),
                source,
                source_id,
            },
        );
        Ok(id)
    }

    /// Remove a field, returning whether it existed.
    pub fn remove(&mut self, id: FieldId) -> bool {
        self.fields.remove(&id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: FieldId) -> Option<&InterdictionField> {
        self.fields.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Test the straight path for the first foreign, non-expired field hit.
    ///
    /// Fields owned by `traveling_faction` never block their own traffic.
    #[must_use]
    pub fn check_path(
        &self,
        origin: GridCoordinate3D,
        destination: GridCoordinate3D,
        traveling_faction: FactionId,
        now: u64,
        bounds: &GridBounds,
    ) -> Option<PathHit> {
        for point in sample_path(origin, destination) {
            for field in self.fields.values() {
                if field.owner == traveling_faction || field.is_expired(now) {
                    continue;
                }
                if field.covers(point) {
                    return Some(PathHit {
                        field: field.id,
                        owner: field.owner,
                        strength: field.strength,
                        drop_point: drop_point(field, point, origin, bounds),
                    });
                }
            }
        }
        None
    }

    /// Purge fields past their expiry, returning how many were removed.
    pub fn cleanup_expired(&mut self, now: u64) -> usize {
        let before = self.fields.len();
        self.fields.retain(|_, field| !field.is_expired(now));
        before - self.fields.len()
    }
}

/// Displace the drop point outward from the field center along the approach
/// vector by `radius + INTERDICTION_DROP_DISTANCE`.
fn drop_point(
    field: &InterdictionField,
    hit: GridCoordinate3D,
    origin: GridCoordinate3D,
    bounds: &GridBounds,
) -> GridCoordinate3D {
    let mut dx = f64::from(hit.x - field.center.x);
    let mut dy = f64::from(hit.y - field.center.y);
    let mut dz = f64::from(hit.z - field.center.z);
    if dx == 0.0 && dy == 0.0 && dz == 0.0 {
        // Hit dead center; fall back to the direction of approach.
        dx = f64::from(origin.x - field.center.x);
        dy = f64::from(origin.y - field.center.y);
        dz = f64::from(origin.z - field.center.z);
    }
    let len = dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt();
    let (ux, uy, uz) = if len > 0.0 {
        (dx / len, dy / len, dz / len)
    } else {
        (1.0, 0.0, 0.0)
    };
    let reach = f64::from(field.radius) + INTERDICTION_DROP_DISTANCE;
    bounds.clamp(GridCoordinate3D {
        x: field.center.x + round_f64_to_i32(ux * reach),
        y: field.center.y + round_f64_to_i32(uy * reach),
        z: field.center.z + round_f64_to_i32(uz * reach),
    })
}
