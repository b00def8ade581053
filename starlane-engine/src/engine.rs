//! Warp navigation orchestrator: validates requests, runs the calculation
//! pipeline, owns per-session spatial registries, advances travels on clock
//! ticks, and recovers in-flight travels after a restart.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};

use crate::calculator::{self, FuelClass, JumpProfile, WarpCalculationResult};
use crate::constants::{CHARGE_DURATION_TICKS, COOLDOWN_DURATION_TICKS};
use crate::coords::{GridBounds, GridCoordinate3D};
use crate::error::{ErrorCode, WarpError};
use crate::events::{EventSink, TravelEvent, TravelEventKind};
use crate::gravity::GravityWellMap;
use crate::interdiction::InterdictionRegistry;
use crate::misjump;
use crate::rng::RngBundle;
use crate::store::{GridOccupancy, TravelStore};
use crate::travel::{
    FactionId, PhaseBoundary, SessionId, TravelId, TravelStatus, UnitId, WarpTravel,
};
use crate::weather::WeatherField;

/// One pulse of the external game clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub session: SessionId,
    pub tick: u64,
}

/// Inbound request for a point-to-point jump.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpRequest {
    pub session: SessionId,
    pub unit: UnitId,
    pub faction: FactionId,
    pub origin: GridCoordinate3D,
    pub destination: GridCoordinate3D,
    pub engine_level: u8,
    pub navigator_skill: u8,
    pub fuel_class: FuelClass,
    /// Additive mishap term from the departure terrain.
    pub terrain_factor: f64,
    /// Terrain instability scaling misjump deviation, `0.0..=1.0`.
    pub terrain_instability: f64,
    /// Fuel multiplier from the departure terrain.
    pub terrain_fuel_multiplier: f64,
    /// Whether to fold weather, interdiction, and gravity along the path
    /// into the calculation.
    pub extended_factors: bool,
}

impl WarpRequest {
    /// Request with neutral terrain, standard fuel, and extended factors on.
    #[must_use]
    pub const fn new(
        session: SessionId,
        unit: UnitId,
        faction: FactionId,
        origin: GridCoordinate3D,
        destination: GridCoordinate3D,
    ) -> Self {
        Self {
            session,
            unit,
            faction,
            origin,
            destination,
            engine_level: 0,
            navigator_skill: 0,
            fuel_class: FuelClass::Standard,
            terrain_factor: 0.0,
            terrain_instability: 0.0,
            terrain_fuel_multiplier: 1.0,
            extended_factors: true,
        }
    }
}

/// Acceptance summary returned for a validated request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarpAccepted {
    pub travel_id: TravelId,
    /// Charge + warp + cooldown, in ticks.
    pub total_ticks: u32,
    pub fuel_cost: f64,
    pub mishap_chance: f64,
    /// Whether an interdiction field intersects the planned path.
    pub interdicted: bool,
}

/// Flat request outcome for transport layers that cannot carry `Result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpRequestOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<WarpAccepted>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl From<Result<WarpAccepted, WarpError>> for WarpRequestOutcome {
    fn from(result: Result<WarpAccepted, WarpError>) -> Self {
        match result {
            Ok(accepted) => Self {
                success: true,
                accepted: Some(accepted),
                error: None,
                code: None,
            },
            Err(error) => Self {
                success: false,
                accepted: None,
                code: Some(error.code()),
                error: Some(error.to_string()),
            },
        }
    }
}

/// Mutable state scoped to one game session, constructed on first use and
/// torn down with [`WarpNavigationEngine::end_session`].
#[derive(Debug, Clone, Default)]
pub struct SessionSpace {
    active: HashMap<TravelId, WarpTravel>,
    units_in_flight: HashSet<UnitId>,
    pub interdiction: InterdictionRegistry,
    pub weather: WeatherField,
    pub gravity: GravityWellMap,
    last_tick: u64,
}

impl SessionSpace {
    /// Number of travels currently advancing in this session.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn active_travel(&self, id: TravelId) -> Option<&WarpTravel> {
        self.active.get(&id)
    }

    /// Last clock tick this session processed.
    #[must_use]
    pub const fn last_tick(&self) -> u64 {
        self.last_tick
    }
}

/// Navigation engine binding the calculation pipeline to injected
/// persistence, grid occupancy, and event collaborators.
pub struct WarpNavigationEngine<S, G, E>
where
    S: TravelStore,
    G: GridOccupancy,
    E: EventSink,
{
    store: S,
    grid: G,
    sink: E,
    bounds: GridBounds,
    rng: RngBundle,
    sessions: HashMap<SessionId, SessionSpace>,
    next_travel_id: u64,
}

impl<S, G, E> WarpNavigationEngine<S, G, E>
where
    S: TravelStore,
    G: GridOccupancy,
    E: EventSink,
{
    /// Engine with default grid bounds, seeded for deterministic resolution.
    pub fn new(store: S, grid: G, sink: E, seed: u64) -> Self {
        Self {
            store,
            grid,
            sink,
            bounds: GridBounds::default(),
            rng: RngBundle::from_user_seed(seed),
            sessions: HashMap::new(),
            next_travel_id: 0,
        }
    }

    /// Override the playable grid extent.
    #[must_use]
    pub fn with_bounds(mut self, bounds: GridBounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub const fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    /// Borrow one session's space, if it exists yet.
    #[must_use]
    pub fn session_space(&self, session: SessionId) -> Option<&SessionSpace> {
        self.sessions.get(&session)
    }

    /// Borrow one session's space mutably, creating it on first use. Used
    /// to seed weather cells, interdiction fields, and gravity wells.
    pub fn session_space_mut(&mut self, session: SessionId) -> &mut SessionSpace {
        self.sessions.entry(session).or_default()
    }

    /// Tear down a session's registries and active set. Persisted travel
    /// records are untouched.
    pub fn end_session(&mut self, session: SessionId) {
        self.sessions.remove(&session);
    }

    /// Borrow the injected event sink (tests read recorded events here).
    #[must_use]
    pub const fn sink(&self) -> &E {
        &self.sink
    }

    /// Borrow the injected travel store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Borrow the injected grid occupancy view.
    #[must_use]
    pub const fn grid(&self) -> &G {
        &self.grid
    }

    /// Validate and accept a warp request, persisting the travel in
    /// `Charging`. A rejected request never leaves a partial record behind.
    ///
    /// # Errors
    ///
    /// `Validation` for out-of-bounds coordinates, `Conflict` when the unit
    /// is already travelling, `Permission` when the grid denies destination
    /// entry, `Runtime` when a collaborator fails.
    pub fn request_warp(&mut self, req: &WarpRequest, now: u64) -> Result<WarpAccepted, WarpError> {
        for coordinate in [req.origin, req.destination] {
            if !self.bounds.contains(coordinate) {
                return Err(WarpError::Validation { coordinate });
            }
        }

        let space = self.sessions.entry(req.session).or_default();
        if space.units_in_flight.contains(&req.unit) {
            return Err(WarpError::Conflict { unit: req.unit });
        }
        let stored = self
            .store
            .find_in_progress_for_unit(req.session, req.unit)
            .map_err(store_failure)?;
        if stored.is_some() {
            return Err(WarpError::Conflict { unit: req.unit });
        }

        let decision = self
            .grid
            .can_enter(req.session, req.destination, req.unit, req.faction)
            .map_err(store_failure)?;
        if !decision.allowed {
            return Err(WarpError::Permission {
                reason: decision
                    .reason
                    .unwrap_or_else(|| String::from("destination entry denied")),
            });
        }

        let mut profile = JumpProfile {
            engine_level: req.engine_level,
            navigator_skill: req.navigator_skill,
            fuel_class: req.fuel_class,
            terrain_factor: req.terrain_factor,
            terrain_instability: req.terrain_instability,
            terrain_fuel_multiplier: req.terrain_fuel_multiplier,
            ..JumpProfile::default()
        };
        let mut interdiction_drop = None;
        if req.extended_factors {
            let weather = space.weather.worst_along_path(req.origin, req.destination);
            profile.weather_factor = weather.mishap_factor();
            profile.weather_fuel_multiplier = weather.fuel_multiplier();
            profile.gravity_bonus = space.gravity.bonus_along_path(req.origin, req.destination);
            if let Some(hit) = space.interdiction.check_path(
                req.origin,
                req.destination,
                req.faction,
                now,
                &self.bounds,
            ) {
                profile.interdicted = true;
                interdiction_drop = Some(hit.drop_point);
            }
        }
        let calc = calculator::calculate(req.origin, req.destination, &profile);

        self.next_travel_id += 1;
        let travel = WarpTravel::begin_charging(
            TravelId(self.next_travel_id),
            req.session,
            req.unit,
            req.faction,
            req.origin,
            req.destination,
            req.engine_level,
            CHARGE_DURATION_TICKS,
            COOLDOWN_DURATION_TICKS,
            &calc,
            interdiction_drop,
            now,
        );

        // Reserve the unit before the store write so a second request in
        // the same tick cannot also pass the conflict check.
        space.units_in_flight.insert(req.unit);
        if let Err(error) = self.store.create(&travel) {
            space.units_in_flight.remove(&req.unit);
            return Err(store_failure(error));
        }

        let accepted = WarpAccepted {
            travel_id: travel.id,
            total_ticks: travel.durations.total(),
            fuel_cost: travel.fuel_cost,
            mishap_chance: travel.mishap_chance,
            interdicted: profile.interdicted,
        };
        self.sink.publish(lifecycle_event(
            TravelEventKind::Charging,
            &travel,
            now,
            json!({
                "origin": travel.origin,
                "destination": travel.destination,
                "distance_ly": travel.distance_ly,
                "charge_ticks": travel.durations.charge,
                "warp_ticks": travel.durations.warp,
                "cool_ticks": travel.durations.cool,
                "fuel_cost": travel.fuel_cost,
                "mishap_chance": travel.mishap_chance,
                "interdicted": profile.interdicted
            }),
        ));
        space.active.insert(travel.id, travel);
        Ok(accepted)
    }

    /// Cancel a charging travel. Charging is the sole abort window.
    ///
    /// # Errors
    ///
    /// `Cancellation` when the travel is past `Charging` or already
    /// terminal, `Runtime` when the travel or session is unknown or the
    /// store write fails.
    pub fn cancel_warp(
        &mut self,
        session: SessionId,
        id: TravelId,
        now: u64,
    ) -> Result<(), WarpError> {
        let Some(space) = self.sessions.get_mut(&session) else {
            return Err(WarpError::Runtime {
                detail: format!("session {session} has no active travels"),
            });
        };
        let Some(travel) = space.active.get(&id) else {
            // Terminal travels surface the cancellation guard, unknown ids
            // a runtime failure.
            let stored = self.store.find(id).map_err(store_failure)?;
            return match stored {
                Some(terminal) => Err(WarpError::Cancellation {
                    phase: terminal.phase,
                }),
                None => Err(WarpError::Runtime {
                    detail: format!("travel {id} is unknown"),
                }),
            };
        };

        let mut cancelled = travel.clone();
        cancelled.cancel()?;
        self.store.update(&cancelled).map_err(store_failure)?;

        space.active.remove(&id);
        space.units_in_flight.remove(&cancelled.unit);
        self.sink.publish(lifecycle_event(
            TravelEventKind::Cancelled,
            &cancelled,
            now,
            json!({ "cancelled_at_tick": now }),
        ));
        Ok(())
    }

    /// Mark an active travel irrecoverably failed: terminal status and
    /// reason persisted, unit reservation released, failure event emitted.
    /// The unit stays at its origin.
    ///
    /// # Errors
    ///
    /// `Runtime` when the travel is not active in the session or the store
    /// write fails.
    pub fn fail_travel(
        &mut self,
        session: SessionId,
        id: TravelId,
        reason: impl Into<String>,
        now: u64,
    ) -> Result<(), WarpError> {
        let Some(space) = self.sessions.get_mut(&session) else {
            return Err(WarpError::Runtime {
                detail: format!("session {session} has no active travels"),
            });
        };
        let Some(travel) = space.active.get(&id) else {
            return Err(WarpError::Runtime {
                detail: format!("travel {id} is not active"),
            });
        };

        let reason = reason.into();
        let mut failed = travel.clone();
        failed.fail(reason.clone());
        self.store.update(&failed).map_err(store_failure)?;

        space.active.remove(&id);
        space.units_in_flight.remove(&failed.unit);
        self.sink.publish(lifecycle_event(
            TravelEventKind::Failed,
            &failed,
            now,
            json!({ "reason": reason, "failed_at_tick": now }),
        ));
        Ok(())
    }

    /// Advance every active travel of the ticking session. A failure in one
    /// travel is logged and skipped; the rest of the batch still advances.
    pub fn on_tick(&mut self, clock: ClockTick) {
        let Some(space) = self.sessions.get_mut(&clock.session) else {
            return;
        };
        space.last_tick = clock.tick;
        let mut ids: Vec<TravelId> = space.active.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some(mut travel) = space.active.remove(&id) else {
                continue;
            };
            match advance_one(
                &self.store,
                &self.grid,
                &mut self.sink,
                &self.rng,
                &self.bounds,
                &mut travel,
                clock.tick,
            ) {
                Ok(true) => {
                    space.units_in_flight.remove(&travel.unit);
                }
                Ok(false) => {
                    space.active.insert(id, travel);
                }
                Err(error) => {
                    // The travel sits at its last committed boundary; the
                    // next tick retries from there without replaying it.
                    log::warn!("travel {id} failed to advance at tick {}: {error}", clock.tick);
                    space.active.insert(id, travel);
                }
            }
        }
    }

    /// Current record for a travel: the live active entry when present,
    /// otherwise the persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub fn status(
        &self,
        session: SessionId,
        id: TravelId,
    ) -> Result<Option<WarpTravel>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        if let Some(space) = self.sessions.get(&session) {
            if let Some(travel) = space.active.get(&id) {
                return Ok(Some(travel.clone()));
            }
        }
        self.store.find(id).map_err(Into::into)
    }

    /// Reload persisted in-progress travels into the active set so tick
    /// processing resumes after a restart. Returns how many were restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lookup fails.
    pub fn recover_session(&mut self, session: SessionId) -> Result<usize, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        // Resume id allocation above every persisted record, terminal ones
        // included, so historical ids are never reissued.
        if let Some(max) = self.store.max_id().map_err(Into::into)? {
            self.next_travel_id = self.next_travel_id.max(max.0);
        }
        let travels = self.store.find_in_progress(session).map_err(Into::into)?;
        let space = self.sessions.entry(session).or_default();
        let mut restored = 0;
        for travel in travels {
            space.units_in_flight.insert(travel.unit);
            space.active.insert(travel.id, travel);
            restored += 1;
        }
        Ok(restored)
    }
}

/// Advance one travel, handling each crossed boundary in order. A boundary
/// is committed back to `travel` only once its store write and events have
/// succeeded, so an error leaves `travel` at the last committed boundary
/// and a retry never republishes an earlier one. Returns whether the
/// travel completed and left the active set.
fn advance_one<S, G, E>(
    store: &S,
    grid: &G,
    sink: &mut E,
    rng: &RngBundle,
    bounds: &GridBounds,
    travel: &mut WarpTravel,
    now: u64,
) -> Result<bool, WarpError>
where
    S: TravelStore,
    G: GridOccupancy,
    E: EventSink,
{
    loop {
        let mut step = travel.clone();
        let Some(boundary) = step.advance_once(now) else {
            return Ok(false);
        };
        match boundary {
            PhaseBoundary::WarpEntered => {
                store.update(&step).map_err(store_failure)?;
                sink.publish(lifecycle_event(
                    TravelEventKind::Started,
                    &step,
                    step.phase_started_tick,
                    json!({
                        "destination": step.destination,
                        "warp_ticks": step.durations.warp
                    }),
                ));
            }
            PhaseBoundary::CoolingEntered => {
                resolve_misjump(store, sink, rng, bounds, &mut step)?;
            }
            PhaseBoundary::TravelCompleted => {
                complete_travel(store, grid, sink, &mut step)?;
                *travel = step;
                return Ok(true);
            }
        }
        *travel = step;
    }
}

/// Roll the misjump exactly once, at the warping→cooling boundary.
fn resolve_misjump<S, E>(
    store: &S,
    sink: &mut E,
    rng: &RngBundle,
    bounds: &GridBounds,
    travel: &mut WarpTravel,
) -> Result<(), WarpError>
where
    S: TravelStore,
    E: EventSink,
{
    if travel.misjump_resolved {
        return Ok(());
    }
    travel.misjump_resolved = true;
    let calc = WarpCalculationResult {
        distance_ly: travel.distance_ly,
        fuel_cost: travel.fuel_cost,
        travel_ticks: travel.durations.warp,
        mishap_chance: travel.mishap_chance,
        deviation_range: travel.deviation_range,
        factors: travel.factors,
    };
    let result = misjump::resolve(&calc, travel.destination, travel.interdiction_drop, bounds, rng);
    if result.has_misjump {
        travel.has_misjump = true;
        travel.misjump_offset = result.offset;
        travel.actual_destination = Some(result.actual_destination);
        // The scramble costs extra cooldown before the drive settles.
        travel.durations.cool += result.delay_ticks;
    }
    store.update(travel).map_err(store_failure)?;
    if result.has_misjump {
        sink.publish(lifecycle_event(
            TravelEventKind::Misjump,
            travel,
            travel.phase_started_tick,
            json!({
                "intended": travel.destination,
                "actual": result.actual_destination,
                "offset": result.offset,
                "cause": result.cause,
                "damage_percent": result.damage_percent,
                "delay_ticks": result.delay_ticks
            }),
        ));
    }
    Ok(())
}

/// Relocate the unit and close out the record.
fn complete_travel<S, G, E>(
    store: &S,
    grid: &G,
    sink: &mut E,
    travel: &mut WarpTravel,
) -> Result<(), WarpError>
where
    S: TravelStore,
    G: GridOccupancy,
    E: EventSink,
{
    let arrival = travel.arrival_point();
    grid.remove_unit(travel.session, travel.origin, travel.unit, travel.faction)
        .map_err(store_failure)?;
    grid.add_unit(travel.session, arrival, travel.unit, travel.faction)
        .map_err(store_failure)?;
    travel.status = TravelStatus::Completed;
    store.update(travel).map_err(store_failure)?;
    sink.publish(lifecycle_event(
        TravelEventKind::Completed,
        travel,
        travel.phase_started_tick,
        json!({
            "arrival": arrival,
            "misjumped": travel.has_misjump
        }),
    ));
    Ok(())
}

fn lifecycle_event(
    kind: TravelEventKind,
    travel: &WarpTravel,
    tick: u64,
    payload: serde_json::Value,
) -> TravelEvent {
    TravelEvent {
        kind,
        travel_id: travel.id,
        session_id: travel.session,
        unit_id: travel.unit,
        faction_id: travel.faction,
        tick,
        payload,
    }
}

fn store_failure(error: impl std::error::Error) -> WarpError {
    WarpError::Runtime {
        detail: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::events::RecordingSink;
    use crate::store::{EntryDecision, MemoryTravelStore, OpenGrid};
    use crate::travel::WarpPhase;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use thiserror::Error;

    fn engine() -> WarpNavigationEngine<MemoryTravelStore, OpenGrid, RecordingSink> {
        WarpNavigationEngine::new(
            MemoryTravelStore::new(),
            OpenGrid::new(),
            RecordingSink::new(),
            1234,
        )
    }

    fn request(unit: u64, destination: GridCoordinate3D) -> WarpRequest {
        WarpRequest::new(
            SessionId(1),
            UnitId(unit),
            FactionId(1),
            GridCoordinate3D::new(5, 5),
            destination,
        )
    }

    #[test]
    fn out_of_bounds_requests_are_rejected_without_a_record() {
        let mut engine = engine();
        let error = engine
            .request_warp(&request(1, GridCoordinate3D::new(150, 20)), 0)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::Validation);
        assert!(engine.store.is_empty());
        assert!(engine.sink().events.is_empty());
    }

    #[test]
    fn duplicate_unit_requests_conflict() {
        let mut engine = engine();
        let accepted = engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .expect("first request accepted");
        let error = engine
            .request_warp(&request(1, GridCoordinate3D::new(60, 60)), 0)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(engine.store.len(), 1);
        assert_eq!(
            engine
                .status(SessionId(1), accepted.travel_id)
                .unwrap()
                .map(|t| t.status),
            Some(TravelStatus::InProgress)
        );
    }

    #[test]
    fn grid_denial_is_forwarded_as_permission_error() {
        #[derive(Debug, Default)]
        struct ClosedGrid;
        impl GridOccupancy for ClosedGrid {
            type Error = Infallible;
            fn can_enter(
                &self,
                _session: SessionId,
                _position: GridCoordinate3D,
                _unit: UnitId,
                _faction: FactionId,
            ) -> Result<EntryDecision, Self::Error> {
                Ok(EntryDecision::deny("cell contested by hostile fleet"))
            }
            fn add_unit(
                &self,
                _session: SessionId,
                _position: GridCoordinate3D,
                _unit: UnitId,
                _faction: FactionId,
            ) -> Result<(), Self::Error> {
                Ok(())
            }
            fn remove_unit(
                &self,
                _session: SessionId,
                _position: GridCoordinate3D,
                _unit: UnitId,
                _faction: FactionId,
            ) -> Result<(), Self::Error> {
                Ok(())
            }
        }

        let mut engine = WarpNavigationEngine::new(
            MemoryTravelStore::new(),
            ClosedGrid,
            RecordingSink::new(),
            9,
        );
        let error = engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .unwrap_err();
        assert_eq!(
            error,
            WarpError::Permission {
                reason: String::from("cell contested by hostile fleet")
            }
        );
        assert!(engine.store.is_empty());
    }

    #[test]
    fn cancel_is_only_legal_while_charging() {
        let mut engine = engine();
        let session = SessionId(1);
        let accepted = engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .expect("accepted");

        // Past the charge window the jump is committed.
        engine.on_tick(ClockTick { session, tick: 3 });
        let error = engine.cancel_warp(session, accepted.travel_id, 3).unwrap_err();
        assert_eq!(
            error,
            WarpError::Cancellation {
                phase: WarpPhase::Warping
            }
        );

        // A fresh travel cancels cleanly during charging.
        let second = engine
            .request_warp(&request(2, GridCoordinate3D::new(60, 20)), 3)
            .expect("accepted");
        engine.cancel_warp(session, second.travel_id, 4).expect("cancelled");
        assert_eq!(
            engine.status(session, second.travel_id).unwrap().map(|t| t.status),
            Some(TravelStatus::Cancelled)
        );
        // The unit is free to request again immediately.
        assert!(engine
            .request_warp(&request(2, GridCoordinate3D::new(60, 20)), 4)
            .is_ok());
    }

    #[test]
    fn unknown_travel_cancel_is_a_runtime_error() {
        let mut engine = engine();
        engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .expect("accepted");
        let error = engine.cancel_warp(SessionId(1), TravelId(99), 0).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Runtime);
    }

    #[test]
    fn fail_travel_terminates_persists_and_frees_the_unit() {
        let mut engine = engine();
        let session = SessionId(1);
        let accepted = engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .expect("accepted");
        engine.on_tick(ClockTick { session, tick: 4 });

        engine
            .fail_travel(session, accepted.travel_id, "drive containment breach", 4)
            .expect("active travel fails cleanly");

        let record = engine
            .status(session, accepted.travel_id)
            .unwrap()
            .expect("record persisted");
        assert_eq!(record.status, TravelStatus::Failed);
        assert_eq!(
            record.failure_reason.as_deref(),
            Some("drive containment breach")
        );
        assert_eq!(engine.sink().kinds().last(), Some(&TravelEventKind::Failed));
        // The unit never moved and is free to jump again.
        assert!(engine.grid().position_of(session, UnitId(1)).is_none());
        assert!(engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 4)
            .is_ok());

        let error = engine.fail_travel(session, TravelId(99), "no such", 4).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Runtime);
    }

    #[derive(Debug, Error)]
    #[error("store offline")]
    struct StoreOffline;

    /// Store that rejects the first cooling-phase write, then recovers.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryTravelStore,
        fail_next_cooling: RefCell<bool>,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryTravelStore::new(),
                fail_next_cooling: RefCell::new(true),
            }
        }
    }

    impl TravelStore for FlakyStore {
        type Error = StoreOffline;

        fn create(&self, travel: &WarpTravel) -> Result<(), Self::Error> {
            self.inner.create(travel).expect("infallible");
            Ok(())
        }

        fn update(&self, travel: &WarpTravel) -> Result<(), Self::Error> {
            if travel.phase == WarpPhase::Cooling
                && travel.status == TravelStatus::InProgress
                && *self.fail_next_cooling.borrow()
            {
                *self.fail_next_cooling.borrow_mut() = false;
                return Err(StoreOffline);
            }
            self.inner.update(travel).expect("infallible");
            Ok(())
        }

        fn find(&self, id: TravelId) -> Result<Option<WarpTravel>, Self::Error> {
            Ok(self.inner.find(id).expect("infallible"))
        }

        fn find_in_progress(&self, session: SessionId) -> Result<Vec<WarpTravel>, Self::Error> {
            Ok(self.inner.find_in_progress(session).expect("infallible"))
        }

        fn find_in_progress_for_unit(
            &self,
            session: SessionId,
            unit: UnitId,
        ) -> Result<Option<WarpTravel>, Self::Error> {
            Ok(self
                .inner
                .find_in_progress_for_unit(session, unit)
                .expect("infallible"))
        }

        fn max_id(&self) -> Result<Option<TravelId>, Self::Error> {
            Ok(self.inner.max_id().expect("infallible"))
        }
    }

    #[test]
    fn a_mid_advance_store_failure_never_replays_earlier_boundaries() {
        let mut engine = WarpNavigationEngine::new(
            FlakyStore::new(),
            OpenGrid::new(),
            RecordingSink::new(),
            21,
        );
        let session = SessionId(1);
        let accepted = engine
            .request_warp(&request(1, GridCoordinate3D::new(5, 10)), 0)
            .expect("accepted");

        // Tick 8 crosses both the warp and cooling boundaries; the cooling
        // write is rejected, so the travel holds at the warp boundary with
        // its start event already out.
        engine.on_tick(ClockTick { session, tick: 8 });
        let kinds = engine.sink().kinds();
        assert_eq!(
            kinds.iter().filter(|k| **k == TravelEventKind::Started).count(),
            1
        );

        // Retry succeeds and the journey runs out without a duplicate.
        engine.on_tick(ClockTick { session, tick: 9 });
        engine.on_tick(ClockTick { session, tick: 40 });
        let record = engine
            .status(session, accepted.travel_id)
            .unwrap()
            .expect("record persisted");
        assert_eq!(record.status, TravelStatus::Completed);
        let kinds = engine.sink().kinds();
        assert_eq!(
            kinds.iter().filter(|k| **k == TravelEventKind::Started).count(),
            1
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == TravelEventKind::Completed).count(),
            1
        );
    }

    #[test]
    fn request_outcome_envelope_flattens_both_arms() {
        let mut engine = engine();
        let accepted: WarpRequestOutcome = engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .into();
        assert!(accepted.success);
        assert!(accepted.accepted.is_some());
        assert_eq!(accepted.code, None);

        let rejected: WarpRequestOutcome = engine
            .request_warp(&request(1, GridCoordinate3D::new(500, 40)), 0)
            .into();
        assert!(!rejected.success);
        assert_eq!(rejected.code, Some(ErrorCode::Validation));
        assert!(rejected.error.is_some());
    }

    #[test]
    fn sessions_are_isolated_and_torn_down() {
        let mut engine = engine();
        engine
            .request_warp(&request(1, GridCoordinate3D::new(40, 40)), 0)
            .expect("accepted");
        assert_eq!(
            engine.session_space(SessionId(1)).map(SessionSpace::active_count),
            Some(1)
        );
        // Ticks for another session leave this one untouched.
        engine.on_tick(ClockTick {
            session: SessionId(2),
            tick: 50,
        });
        let space = engine.session_space(SessionId(1)).expect("session exists");
        assert_eq!(space.active_count(), 1);

        engine.end_session(SessionId(1));
        assert!(engine.session_space(SessionId(1)).is_none());
        // The persisted record survives teardown.
        assert_eq!(engine.store.len(), 1);
    }
}
