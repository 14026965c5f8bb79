//! Host errors.

use mapbridge_core::{BridgeError, ConfigError};
use thiserror::Error;

/// Host error types.
#[derive(Debug, Error)]
pub enum HostError {
    /// Reading stdin or writing stdout failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request line was not valid JSON or had the wrong shape.
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The bridge refused the operation.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A protocol worker thread panicked.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;
    use mapbridge_shared::{EntityKind, MapId};

    #[test]
    fn test_bridge_errors_keep_their_message() {
        let err: HostError = BridgeError::not_found(EntityKind::Map, 3, "deleting map").into();
        assert_eq!(err.to_string(), "Map with id 3 not found when deleting map");

        let cancelled: HostError = BridgeError::Cancelled { map_id: MapId(1) }.into();
        assert!(cancelled.to_string().contains("cancelled"));
    }

    #[test]
    fn test_malformed_wraps_json_error() {
        let err: HostError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed request"));
    }
}
