//! # Command Envelope
//!
//! Every host operation travels the same way: receive a parameter payload,
//! run the operation, send back `null` on success or a string describing the
//! failure. [`envelope`] is that error boundary; [`Command`] names every
//! operation it can carry and [`Bridge::dispatch`] routes one.
//!
//! ```text
//! {"op": "update_marker", "params": {"map_id": 1, "marker_id": 5, "coordinate": [1, 1]}}
//!     → null
//! {"op": "delete_map", "params": {"map_id": 7}}
//!     → "Map with id 7 not found when deleting map"
//! ```

use std::fmt;
use std::future::Future;

use mapbridge_shared::{
    MapRef, MapUpdate, MarkerRef, MarkerUpdate, PolygonRef, PolygonUpdate, PopupRef, PopupUpdate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use crate::surface::DrawingSurface;

/// Result sent back to the host: `null` or an error string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(pub Option<String>);

impl Reply {
    /// Success.
    pub const OK: Self = Self(None);

    /// Failure with a description.
    pub fn failure(reason: impl fmt::Display) -> Self {
        Self(Some(reason.to_string()))
    }

    /// Converts an operation result.
    pub fn from_result<T, E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::OK,
            Err(e) => Self::failure(e),
        }
    }

    /// `true` on success.
    #[must_use]
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.0.is_none()
    }

    /// Failure description, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Every operation the envelope can carry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "params", rename_all = "snake_case")]
pub enum Command {
    /// Create or update a map.
    UpdateMap(MapUpdate),
    /// Destroy a map.
    DeleteMap(MapRef),
    /// Create or update a marker.
    UpdateMarker(MarkerUpdate),
    /// Remove a marker.
    DeleteMarker(MarkerRef),
    /// Create or update a polygon.
    UpdatePolygon(PolygonUpdate),
    /// Remove a polygon.
    DeletePolygon(PolygonRef),
    /// Store and bind a popup.
    UpdatePopup(PopupUpdate),
    /// Unbind and forget a popup.
    DeletePopup(PopupRef),
}

impl Command {
    /// Every operation name, as it appears on the wire.
    pub const NAMES: [&'static str; 8] = [
        "update_map",
        "delete_map",
        "update_marker",
        "delete_marker",
        "update_polygon",
        "delete_polygon",
        "update_popup",
        "delete_popup",
    ];

    /// Builds a command from an operation name and its raw parameters.
    pub fn from_parts(op: &str, params: serde_json::Value) -> BridgeResult<Self> {
        if !Self::NAMES.contains(&op) {
            return Err(BridgeError::InvalidParams(format!("unknown operation {op:?}")));
        }
        let tagged = serde_json::json!({ "op": op, "params": params });
        serde_json::from_value(tagged)
            .map_err(|e| BridgeError::InvalidParams(format!("{op}: {e}")))
    }

    /// Wire name of the operation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UpdateMap(_) => "update_map",
            Self::DeleteMap(_) => "delete_map",
            Self::UpdateMarker(_) => "update_marker",
            Self::DeleteMarker(_) => "delete_marker",
            Self::UpdatePolygon(_) => "update_polygon",
            Self::DeletePolygon(_) => "delete_polygon",
            Self::UpdatePopup(_) => "update_popup",
            Self::DeletePopup(_) => "delete_popup",
        }
    }
}

/// Receive, run, reply.
///
/// Any failure, whether receiving the payload or running the operation,
/// becomes an error string. Nothing escapes as a panic or an unhandled
/// error. The reply is handed to `send` and also returned.
pub async fn envelope<P, E1, E2, R, O, Fut, Tx>(receive: R, operation: O, send: Tx) -> Reply
where
    R: Future<Output = Result<P, E1>>,
    E1: fmt::Display,
    O: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<(), E2>>,
    E2: fmt::Display,
    Tx: FnOnce(Reply),
{
    let reply = match receive.await {
        Ok(params) => match operation(params).await {
            Ok(()) => Reply::OK,
            Err(e) => {
                error!(error = %e, "Operation failed");
                Reply::failure(e)
            }
        },
        Err(e) => {
            error!(error = %e, "Failed to receive parameters");
            Reply::failure(e)
        }
    };
    send(reply.clone());
    reply
}

impl<S: DrawingSurface> Bridge<S> {
    /// Runs one command.
    pub async fn dispatch(&self, command: Command) -> BridgeResult<()> {
        let result = match command {
            Command::UpdateMap(update) => self.update_map(update).await,
            Command::DeleteMap(target) => self.delete_map(target),
            Command::UpdateMarker(update) => self.update_marker(update),
            Command::DeleteMarker(target) => self.delete_marker(target),
            Command::UpdatePolygon(update) => self.update_polygon(update),
            Command::DeletePolygon(target) => self.delete_polygon(target),
            Command::UpdatePopup(update) => self.update_popup(update),
            Command::DeletePopup(target) => self.delete_popup(target),
        };
        self.stats.record_command(result.is_ok());
        result
    }

    /// Runs one command through the envelope and returns the reply.
    pub async fn execute(&self, command: Command) -> Reply {
        let op = command.name();
        let reply = envelope(
            async { Ok::<_, BridgeError>(command) },
            |command| self.dispatch(command),
            |_| {},
        )
        .await;
        debug!(op, ok = reply.is_ok(), "Command executed");
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::surface::RecordingSurface;
    use mapbridge_shared::{MapId, MarkerId};
    use std::time::Duration;

    fn bridge() -> Bridge<RecordingSurface> {
        Bridge::with_config(
            RecordingSurface::new(),
            BridgeConfig::default().with_settle_delay(Duration::ZERO),
        )
    }

    #[test]
    fn test_reply_wire_shape() {
        assert_eq!(serde_json::to_string(&Reply::OK).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Reply::failure("boom")).unwrap(),
            "\"boom\""
        );
    }

    #[test]
    fn test_command_from_parts() {
        let command = Command::from_parts(
            "delete_marker",
            serde_json::json!({"map_id": 1, "marker_id": 5}),
        )
        .unwrap();
        assert_eq!(
            command,
            Command::DeleteMarker(MarkerRef {
                map_id: MapId(1),
                marker_id: MarkerId(5),
            })
        );
        assert_eq!(command.name(), "delete_marker");
    }

    #[test]
    fn test_unknown_operation_and_bad_params() {
        assert!(matches!(
            Command::from_parts("explode", serde_json::json!({})),
            Err(BridgeError::InvalidParams(_))
        ));
        let err = Command::from_parts("delete_map", serde_json::json!({"map": 1})).unwrap_err();
        assert!(err.to_string().contains("delete_map"));
    }

    #[tokio::test]
    async fn test_envelope_reports_receive_failure() {
        let mut sent = None;
        let reply = envelope(
            async { Err::<(), _>("channel closed") },
            |()| async { Ok::<(), String>(()) },
            |reply| sent = Some(reply),
        )
        .await;

        assert_eq!(reply.error(), Some("channel closed"));
        assert_eq!(sent, Some(reply));
    }

    #[tokio::test]
    async fn test_execute_counts_outcomes() {
        let bridge = bridge();
        let ok = bridge
            .execute(Command::UpdateMap(MapUpdate::new(MapId(1), Default::default())))
            .await;
        let failed = bridge
            .execute(Command::DeleteMap(MapRef { map_id: MapId(2) }))
            .await;

        assert!(ok.is_ok());
        assert_eq!(
            failed.error(),
            Some("Map with id 2 not found when deleting map")
        );
        let stats = bridge.stats().snapshot();
        assert_eq!((stats.commands_ok, stats.commands_failed), (1, 1));
    }
}
