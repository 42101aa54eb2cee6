use thiserror::Error;

use super::address::AddressParseError;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressParseError),
    #[error("wireless adapter not available")]
    AdapterMissing,
    #[error("wireless adapter is disabled")]
    AdapterDisabled,
    #[error("wireless permission not granted")]
    NotAuthorized,
    #[error("peripheral service not found")]
    ServiceNotFound,
    #[error("writable characteristic not found")]
    CharacteristicNotFound,
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("connection attempt timed out")]
    ConnectTimeout,
    #[error("peripheral not connected")]
    NotConnected,
    #[error("peripheral connection lost")]
    ConnectionLost,
    #[error("write failed: {0}")]
    WriteFailed(String),
}
