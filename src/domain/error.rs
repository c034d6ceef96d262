use thiserror::Error;
use uuid::Uuid;

/// Errors raised while discovering, connecting to, or driving the hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    #[error("BLE scan failed: {0}")]
    Scan(#[source] btleplug::Error),

    #[error("could not find a hub whose name contains {pattern:?} within {timeout_ms} ms")]
    NotFound { pattern: String, timeout_ms: u64 },

    #[error("connection to hub failed: {0}")]
    Connection(#[source] btleplug::Error),

    #[error("characteristic {0} not found on hub")]
    CharacteristicMissing(Uuid),

    #[error("speed must be between -100 and 100, got {0}")]
    InvalidSpeed(i32),

    #[error("failed to write motor command: {0}")]
    Write(#[source] btleplug::Error),

    #[error("hub is not connected")]
    NotConnected,
}
