use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// NORAD catalog number, valid range (0, 99999].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct SatelliteId(u32);

impl SatelliteId {
    pub const MAX: u32 = 99_999;

    pub fn new(id: u32) -> Option<Self> {
        if id > 0 && id <= Self::MAX {
            Some(Self(id))
        } else {
            None
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Single look-angle sample produced by a poll cycle.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PositionSample {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub timestamp: DateTime<Utc>,
    pub satellite_name: String,
    pub satellite_latitude: Option<f64>,
    pub satellite_longitude: Option<f64>,
    pub satellite_altitude_km: Option<f64>,
    pub eclipsed: Option<bool>,
}

// Wire format of the upstream positions endpoint. The service reports
// application errors through a top-level `error` field, on 200 responses
// included.

#[derive(Debug, Clone, Deserialize)]
pub struct PositionsResponse {
    pub info: Option<SatelliteInfo>,
    pub positions: Option<Vec<RawPosition>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteInfo {
    #[serde(rename = "satid")]
    pub sat_id: Option<u32>,
    #[serde(rename = "satname")]
    pub sat_name: Option<String>,
    #[serde(rename = "transactionscount")]
    pub transactions_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    #[serde(rename = "satlatitude")]
    pub sat_latitude: Option<f64>,
    #[serde(rename = "satlongitude")]
    pub sat_longitude: Option<f64>,
    #[serde(rename = "sataltitude")]
    pub sat_altitude: Option<f64>,
    pub azimuth: Option<f64>,
    pub elevation: Option<f64>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub timestamp: Option<i64>,
    pub eclipsed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satellite_id_range() {
        assert!(SatelliteId::new(0).is_none());
        assert!(SatelliteId::new(100_000).is_none());
        assert_eq!(SatelliteId::new(25544).map(|id| id.get()), Some(25544));
        assert_eq!(SatelliteId::new(99_999).map(|id| id.get()), Some(99_999));
    }
}
