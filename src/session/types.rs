use serde::Serialize;

use crate::location::ObserverLocation;
use crate::position::{PositionSample, SatelliteId};

/// Read-only snapshot of the tracking session. Observers get a copy;
/// only the controller mutates the underlying state.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SessionStatus {
    pub satellite_id: Option<SatelliteId>,
    pub tracking: bool,
    pub loading_location: bool,
    pub location: Option<ObserverLocation>,
    pub sample: Option<PositionSample>,
    pub error: Option<String>,
}
