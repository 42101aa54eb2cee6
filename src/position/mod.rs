mod client;
mod error;
mod types;

pub use client::{
    HttpTransport, PositionClient, PositionQuery, PositionTransport, RawReply, DEFAULT_BASE_URL,
};
pub use error::{PositionError, TransportError};
pub use types::{PositionSample, SatelliteId};
