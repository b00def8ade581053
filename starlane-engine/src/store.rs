//! Persistence and grid-occupancy collaborator traits.
//!
//! Platform-specific backends implement these; the crate ships an in-memory
//! store suitable for tests and single-process servers.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::coords::GridCoordinate3D;
use crate::travel::{FactionId, SessionId, TravelId, TravelStatus, UnitId, WarpTravel};

/// Durable travel persistence. The store is the source of truth across
/// process restarts; the engine's active set is a cache over it.
pub trait TravelStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a newly accepted travel.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn create(&self, travel: &WarpTravel) -> Result<(), Self::Error>;

    /// Overwrite the stored record for an existing travel.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn update(&self, travel: &WarpTravel) -> Result<(), Self::Error>;

    /// Fetch one travel by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find(&self, id: TravelId) -> Result<Option<WarpTravel>, Self::Error>;

    /// All in-progress travels for a session, used by restart recovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find_in_progress(&self, session: SessionId) -> Result<Vec<WarpTravel>, Self::Error>;

    /// The in-progress travel of one unit, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find_in_progress_for_unit(
        &self,
        session: SessionId,
        unit: UnitId,
    ) -> Result<Option<WarpTravel>, Self::Error>;

    /// Highest travel id ever persisted, across every session and status.
    /// Id allocation must resume above this after a restart; terminal
    /// records are history and their ids are never reissued.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn max_id(&self) -> Result<Option<TravelId>, Self::Error>;
}

/// Result of asking the grid whether a unit may enter a destination cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDecision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EntryDecision {
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Grid occupancy collaborator relocating units on arrival.
pub trait GridOccupancy {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether `unit` may enter the destination cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the occupancy backend cannot be queried.
    fn can_enter(
        &self,
        session: SessionId,
        position: GridCoordinate3D,
        unit: UnitId,
        faction: FactionId,
    ) -> Result<EntryDecision, Self::Error>;

    /// Place `unit` at `position` on arrival.
    ///
    /// # Errors
    ///
    /// Returns an error if the occupancy backend rejects the write.
    fn add_unit(
        &self,
        session: SessionId,
        position: GridCoordinate3D,
        unit: UnitId,
        faction: FactionId,
    ) -> Result<(), Self::Error>;

    /// Remove `unit` from its departure cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the occupancy backend rejects the write.
    fn remove_unit(
        &self,
        session: SessionId,
        position: GridCoordinate3D,
        unit: UnitId,
        faction: FactionId,
    ) -> Result<(), Self::Error>;
}

/// In-memory travel store keyed by travel id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTravelStore {
    travels: RefCell<HashMap<TravelId, WarpTravel>>,
}

impl MemoryTravelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, across all statuses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.travels.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.travels.borrow().is_empty()
    }
}

impl TravelStore for MemoryTravelStore {
    type Error = Infallible;

    fn create(&self, travel: &WarpTravel) -> Result<(), Self::Error> {
        self.travels.borrow_mut().insert(travel.id, travel.clone());
        Ok(())
    }

    fn update(&self, travel: &WarpTravel) -> Result<(), Self::Error> {
        self.travels.borrow_mut().insert(travel.id, travel.clone());
        Ok(())
    }

    fn find(&self, id: TravelId) -> Result<Option<WarpTravel>, Self::Error> {
        Ok(self.travels.borrow().get(&id).cloned())
    }

    fn find_in_progress(&self, session: SessionId) -> Result<Vec<WarpTravel>, Self::Error> {
        let mut travels: Vec<WarpTravel> = self
            .travels
            .borrow()
            .values()
            .filter(|travel| travel.session == session && travel.status == TravelStatus::InProgress)
            .cloned()
            .collect();
        travels.sort_by_key(|travel| travel.id);
        Ok(travels)
    }

    fn find_in_progress_for_unit(
        &self,
        session: SessionId,
        unit: UnitId,
    ) -> Result<Option<WarpTravel>, Self::Error> {
        Ok(self
            .travels
            .borrow()
            .values()
            .find(|travel| {
                travel.session == session
                    && travel.unit == unit
                    && travel.status == TravelStatus::InProgress
            })
            .cloned())
    }

    fn max_id(&self) -> Result<Option<TravelId>, Self::Error> {
        Ok(self.travels.borrow().keys().copied().max())
    }
}

/// Occupancy backend that tracks placements but never denies entry.
#[derive(Debug, Clone, Default)]
pub struct OpenGrid {
    placements: RefCell<HashMap<(SessionId, UnitId), GridCoordinate3D>>,
}

impl OpenGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded position of a unit, if it arrived anywhere.
    #[must_use]
    pub fn position_of(&self, session: SessionId, unit: UnitId) -> Option<GridCoordinate3D> {
        self.placements.borrow().get(&(session, unit)).copied()
    }
}

impl GridOccupancy for OpenGrid {
    type Error = Infallible;

    fn can_enter(
        &self,
        _session: SessionId,
        _position: GridCoordinate3D,
        _unit: UnitId,
        _faction: FactionId,
    ) -> Result<EntryDecision, Self::Error> {
        Ok(EntryDecision::allow())
    }

    fn add_unit(
        &self,
        session: SessionId,
        position: GridCoordinate3D,
        unit: UnitId,
        _faction: FactionId,
    ) -> Result<(), Self::Error> {
        self.placements.borrow_mut().insert((session, unit), position);
        Ok(())
    }

    fn remove_unit(
        &self,
        session: SessionId,
        _position: GridCoordinate3D,
        unit: UnitId,
        _faction: FactionId,
    ) -> Result<(), Self::Error> {
        self.placements.borrow_mut().remove(&(session, unit));
        Ok(())
    }
}
