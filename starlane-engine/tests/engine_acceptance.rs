//! Acceptance-path behavior: calculation numbers surfaced on acceptance,
//! session isolation, and the environmental factors folded into a request.

use starlane_engine::{
    ClockTick, FactionId, FuelClass, GravityWell, GridCoordinate3D, MemoryTravelStore, OpenGrid,
    RecordingSink, SessionId, SpaceWeather, UnitId, WarpNavigationEngine, WarpRequest,
};

type Engine = WarpNavigationEngine<MemoryTravelStore, OpenGrid, RecordingSink>;

fn engine(seed: u64) -> Engine {
    WarpNavigationEngine::new(
        MemoryTravelStore::new(),
        OpenGrid::new(),
        RecordingSink::new(),
        seed,
    )
}

#[test]
fn reference_jump_numbers_surface_on_acceptance() {
    let mut engine = engine(1);
    let mut req = WarpRequest::new(
        SessionId(1),
        UnitId(1),
        FactionId(1),
        GridCoordinate3D::new(0, 0),
        GridCoordinate3D::new(30, 40),
    );
    req.engine_level = 1;

    let accepted = engine.request_warp(&req, 0).expect("accepted");
    // 500 ly at engine level 1: ceil(500 / 11.5) = 44 warp ticks.
    assert_eq!(accepted.total_ticks, 3 + 44 + 2);
    // (5 + 500 * 0.8) / 1.05 with neutral terrain, weather, and fuel class.
    assert!((accepted.fuel_cost - 405.0 / 1.05).abs() < 1e-9);
    // 0.02 base + 500 * 0.0002 distance - 0.005 engine reduction.
    assert!((accepted.mishap_chance - 0.115).abs() < 1e-9);
    assert!(!accepted.interdicted);
}

#[test]
fn premium_fuel_discounts_and_emergency_surcharges() {
    let mut engine = engine(1);
    let base = WarpRequest::new(
        SessionId(1),
        UnitId(1),
        FactionId(1),
        GridCoordinate3D::new(0, 0),
        GridCoordinate3D::new(30, 40),
    );
    let mut premium = base.clone();
    premium.unit = UnitId(2);
    premium.fuel_class = FuelClass::Premium;
    let mut emergency = base.clone();
    emergency.unit = UnitId(3);
    emergency.fuel_class = FuelClass::Emergency;

    let standard = engine.request_warp(&base, 0).expect("accepted");
    let premium = engine.request_warp(&premium, 0).expect("accepted");
    let emergency = engine.request_warp(&emergency, 0).expect("accepted");

    assert!((premium.fuel_cost - standard.fuel_cost * 0.85).abs() < 1e-9);
    assert!((emergency.fuel_cost - standard.fuel_cost * 1.5).abs() < 1e-9);
}

#[test]
fn hazardous_weather_raises_both_risk_and_fuel() {
    let clear = {
        let mut engine = engine(1);
        let req = WarpRequest::new(
            SessionId(1),
            UnitId(1),
            FactionId(1),
            GridCoordinate3D::new(0, 0),
            GridCoordinate3D::new(20, 0),
        );
        engine.request_warp(&req, 0).expect("accepted")
    };
    let stormy = {
        let mut engine = engine(1);
        let session = SessionId(1);
        for x in 0..=20 {
            engine
                .session_space_mut(session)
                .weather
                .set_cell(x, 0, SpaceWeather::WarpTurbulence);
        }
        let req = WarpRequest::new(
            session,
            UnitId(1),
            FactionId(1),
            GridCoordinate3D::new(0, 0),
            GridCoordinate3D::new(20, 0),
        );
        engine.request_warp(&req, 0).expect("accepted")
    };

    assert!((stormy.mishap_chance - clear.mishap_chance - 0.15).abs() < 1e-9);
    assert!((stormy.fuel_cost - clear.fuel_cost * 1.5).abs() < 1e-9);
}

#[test]
fn gravity_wells_on_the_path_slow_the_transit() {
    let unhindered = {
        let mut engine = engine(1);
        let req = WarpRequest::new(
            SessionId(1),
            UnitId(1),
            FactionId(1),
            GridCoordinate3D::new(0, 0),
            GridCoordinate3D::new(60, 0),
        );
        engine.request_warp(&req, 0).expect("accepted")
    };
    let hindered = {
        let mut engine = engine(1);
        let session = SessionId(1);
        engine
            .session_space_mut(session)
            .gravity
            .add(GravityWell::at(GridCoordinate3D::new(30, 0)));
        let req = WarpRequest::new(
            session,
            UnitId(1),
            FactionId(1),
            GridCoordinate3D::new(0, 0),
            GridCoordinate3D::new(60, 0),
        );
        engine.request_warp(&req, 0).expect("accepted")
    };

    assert!(hindered.total_ticks > unhindered.total_ticks);
    assert!(hindered.mishap_chance > unhindered.mishap_chance);
}

#[test]
fn sessions_do_not_bleed_into_each_other() {
    let mut engine = engine(1);
    let request = |session: u64| {
        WarpRequest::new(
            SessionId(session),
            UnitId(1),
            FactionId(1),
            GridCoordinate3D::new(5, 5),
            GridCoordinate3D::new(5, 10),
        )
    };
    // The same unit id in two different sessions is two different units.
    let first = engine.request_warp(&request(1), 0).expect("accepted");
    let second = engine.request_warp(&request(2), 0).expect("accepted");
    assert_ne!(first.travel_id, second.travel_id);

    // Ticking session 1 to completion leaves session 2 still charging.
    engine.on_tick(ClockTick {
        session: SessionId(1),
        tick: 100,
    });
    let space = engine.session_space(SessionId(2)).expect("session exists");
    assert_eq!(space.active_count(), 1);
}
