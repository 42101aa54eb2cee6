use thiserror::Error;

use crate::location::LocationError;
use crate::position::SatelliteId;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("satellite id {0} outside valid range (1-{max})", max = SatelliteId::MAX)]
    InvalidSatelliteId(u32),
    #[error("observer location not available")]
    NoLocation,
    #[error("observer location is missing coordinates")]
    IncompleteLocation,
    #[error(transparent)]
    Location(#[from] LocationError),
}
