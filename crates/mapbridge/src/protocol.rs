//! # Line Protocol
//!
//! One JSON document per line in each direction.
//!
//! ```text
//! → {"id": 1, "op": "update_map", "params": {"map_id": 1}}
//! ← {"id": 1, "result": null}
//! → {"id": 2, "op": "delete_map", "params": {"map_id": 9}}
//! ← {"id": 2, "result": "Map with id 9 not found when deleting map"}
//! ← {"event": "click", "map_id": 1, "data": [51.5, -0.09]}
//! ```
//!
//! Besides the bridge [`Command`]s the host understands subscriptions
//! (`on_map_click`, `on_map_move`) and a few operations that poke the
//! in-memory surface (`register_element`, `simulate_click`, `simulate_move`).

use mapbridge_core::{Command, Reply};
use mapbridge_shared::{EventKind, EventPayload, LatLng, MapId, MapRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HostResult;

/// Incoming request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlates the response.
    pub id: u64,
    /// Operation name.
    pub op: String,
    /// Operation parameters.
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Parses one line. On failure the request id is still returned when it
    /// could be read, so the error can be correlated.
    pub fn parse(line: &str) -> Result<Self, (Option<u64>, serde_json::Error)> {
        let value: Value = serde_json::from_str(line).map_err(|e| (None, e))?;
        let id = value.get("id").and_then(Value::as_u64);
        serde_json::from_value(value).map_err(|e| (id, e))
    }
}

/// Reply to one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request, `null` if it could not be read.
    pub id: Option<u64>,
    /// `null` on success, error string on failure.
    pub result: Reply,
}

/// Event pushed from a subscription.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Push {
    /// Event kind.
    pub event: EventKind,
    /// Map the event happened on.
    pub map_id: MapId,
    /// Flat payload.
    pub data: EventPayload,
}

impl Push {
    /// Wraps a payload from `map_id`.
    #[must_use]
    pub fn new(map_id: MapId, data: EventPayload) -> Self {
        Self {
            event: data.kind(),
            map_id,
            data,
        }
    }
}

/// Anything written to stdout.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    /// Request reply.
    Response(Response),
    /// Subscription event.
    Push(Push),
}

impl Outbound {
    /// Serializes to a single line (no trailing newline).
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

#[derive(Deserialize)]
struct ElementParams {
    element_id: String,
}

#[derive(Deserialize)]
struct ClickParams {
    map_id: MapId,
    coordinate: LatLng,
}

#[derive(Deserialize)]
struct MoveParams {
    map_id: MapId,
    center: LatLng,
    zoom: f64,
}

/// What a request asks the host to do.
#[derive(Clone, Debug, PartialEq)]
pub enum HostOp {
    /// A bridge command.
    Bridge(Command),
    /// Forward events of `kind` on `map_id`.
    Subscribe {
        /// Map to listen on.
        map_id: MapId,
        /// Event kind.
        kind: EventKind,
    },
    /// Make a content element resolvable on the surface.
    RegisterElement {
        /// Element id, e.g. `mapbridge-popup-9`.
        element_id: String,
    },
    /// Fire a click on a live map.
    SimulateClick {
        /// Target map.
        map_id: MapId,
        /// Clicked coordinate.
        coordinate: LatLng,
    },
    /// Fire a move-end on a live map.
    SimulateMove {
        /// Target map.
        map_id: MapId,
        /// New center.
        center: LatLng,
        /// New zoom.
        zoom: f64,
    },
}

impl HostOp {
    /// Host-only operation names.
    pub const HOST_NAMES: [&'static str; 5] = [
        "on_map_click",
        "on_map_move",
        "register_element",
        "simulate_click",
        "simulate_move",
    ];

    /// Decodes an operation name and its parameters.
    pub fn parse(op: &str, params: Value) -> HostResult<Self> {
        let parsed = match op {
            "on_map_click" | "on_map_move" => {
                let MapRef { map_id } = serde_json::from_value(params)?;
                let kind = if op == "on_map_click" {
                    EventKind::Click
                } else {
                    EventKind::Move
                };
                Self::Subscribe { map_id, kind }
            }
            "register_element" => {
                let ElementParams { element_id } = serde_json::from_value(params)?;
                Self::RegisterElement { element_id }
            }
            "simulate_click" => {
                let ClickParams { map_id, coordinate } = serde_json::from_value(params)?;
                Self::SimulateClick { map_id, coordinate }
            }
            "simulate_move" => {
                let MoveParams {
                    map_id,
                    center,
                    zoom,
                } = serde_json::from_value(params)?;
                Self::SimulateMove {
                    map_id,
                    center,
                    zoom,
                }
            }
            _ => Self::Bridge(Command::from_parts(op, params)?),
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use mapbridge_shared::{MarkerId, MarkerRef};
    use serde_json::json;

    #[test]
    fn test_request_parse_keeps_id_on_bad_shape() {
        let request = Request::parse(r#"{"id": 4, "op": "delete_map", "params": {"map_id": 1}}"#)
            .unwrap();
        assert_eq!(request.id, 4);
        assert_eq!(request.op, "delete_map");

        let (id, _) = Request::parse(r#"{"id": 7, "params": {}}"#).unwrap_err();
        assert_eq!(id, Some(7));
        let (id, _) = Request::parse("not json").unwrap_err();
        assert_eq!(id, None);
    }

    #[test]
    fn test_outbound_lines() {
        let ok = Outbound::Response(Response {
            id: Some(1),
            result: Reply::OK,
        });
        assert_eq!(ok.to_line().unwrap(), r#"{"id":1,"result":null}"#);

        let push = Outbound::Push(Push::new(
            MapId(2),
            EventPayload::Move {
                center: LatLng::new(1.0, 2.0),
                zoom: 3.0,
            },
        ));
        assert_eq!(
            push.to_line().unwrap(),
            r#"{"event":"move","map_id":2,"data":[1.0,2.0,3.0]}"#
        );
    }

    #[test]
    fn test_parse_host_and_bridge_ops() {
        assert_eq!(
            HostOp::parse("on_map_move", json!({"map_id": 3})).unwrap(),
            HostOp::Subscribe {
                map_id: MapId(3),
                kind: EventKind::Move
            }
        );
        assert_eq!(
            HostOp::parse("simulate_click", json!({"map_id": 1, "coordinate": [4, 5]})).unwrap(),
            HostOp::SimulateClick {
                map_id: MapId(1),
                coordinate: LatLng::new(4.0, 5.0)
            }
        );
        assert_eq!(
            HostOp::parse("delete_marker", json!({"map_id": 1, "marker_id": 2})).unwrap(),
            HostOp::Bridge(Command::DeleteMarker(MarkerRef {
                map_id: MapId(1),
                marker_id: MarkerId(2)
            }))
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(matches!(
            HostOp::parse("teleport", json!({})),
            Err(HostError::Bridge(_))
        ));
        assert!(matches!(
            HostOp::parse("register_element", json!({"id": "x"})),
            Err(HostError::Malformed(_))
        ));
    }
}
