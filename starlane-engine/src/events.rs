//! Structured lifecycle events emitted by the navigation engine.
//!
//! Events are the engine's only outward-facing surface; a presentation or
//! notification layer subscribes through an injected [`EventSink`].

use serde::{Deserialize, Serialize};

use crate::travel::{FactionId, SessionId, TravelId, UnitId};

/// Mechanical kind of a travel lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelEventKind {
    /// Travel accepted; the drive is spinning up.
    Charging,
    /// Charging finished; the jump is committed and underway.
    Started,
    /// The jump deviated; payload carries intended vs. actual destination.
    Misjump,
    Completed,
    Cancelled,
    Failed,
}

/// Structured event describing one travel lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEvent {
    pub kind: TravelEventKind,
    pub travel_id: TravelId,
    pub session_id: SessionId,
    pub unit_id: UnitId,
    pub faction_id: FactionId,
    /// Tick at which the transition took effect.
    pub tick: u64,
    /// Phase-specific structured payload for downstream rendering.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// Outbound event channel injected into the engine.
pub trait EventSink {
    fn publish(&mut self, event: TravelEvent);
}

/// Sink that records every published event in order. Used by tests and
/// diagnostic tooling.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<TravelEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds of all recorded events, in publication order.
    #[must_use]
    pub fn kinds(&self) -> Vec<TravelEventKind> {
        self.events.iter().map(|event| event.kind).collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, event: TravelEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_roundtrip_through_serde() {
        let event = TravelEvent {
            kind: TravelEventKind::Misjump,
            travel_id: TravelId(8),
            session_id: SessionId(1),
            unit_id: UnitId(5),
            faction_id: FactionId(2),
            tick: 120,
            payload: serde_json::json!({
                "intended": { "x": 50, "y": 50, "z": 0 },
                "actual": { "x": 47, "y": 53, "z": 0 }
            }),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let restored: TravelEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, event);
    }

    #[test]
    fn recording_sink_preserves_order() {
        let mut sink = RecordingSink::new();
        for kind in [TravelEventKind::Charging, TravelEventKind::Started] {
            sink.publish(TravelEvent {
                kind,
                travel_id: TravelId(1),
                session_id: SessionId(1),
                unit_id: UnitId(1),
                faction_id: FactionId(1),
                tick: 0,
                payload: serde_json::Value::Null,
            });
        }
        assert_eq!(
            sink.kinds(),
            vec![TravelEventKind::Charging, TravelEventKind::Started]
        );
    }
}
