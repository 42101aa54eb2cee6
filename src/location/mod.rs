use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location permission not granted")]
    NotAuthorized,
    #[error("no position fix available")]
    NoFix,
}

/// Observer position used for look-angle queries. Coordinates may be
/// absent (no fix yet); absence is distinct from a zero coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ObserverLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    #[serde(default)]
    pub manual: bool,
}

impl ObserverLocation {
    pub fn manual(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            altitude_m: Some(altitude_m),
            manual: true,
        }
    }

    /// Parse a "lat, lon" coordinate string.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat = parts[0].parse().ok()?;
        let lon = parts[1].parse().ok()?;
        Some(Self {
            latitude: Some(lat),
            longitude: Some(lon),
            altitude_m,
            manual: false,
        })
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn altitude_or_default(&self) -> f64 {
        self.altitude_m.unwrap_or(0.0)
    }
}

/// Source of observer positions. The device GPS provider lives behind
/// this trait; `authorized` reflects its permission state and may flip
/// false at any point during a session.
#[async_trait]
pub trait LocationSource: Send + Sync {
    fn authorized(&self) -> bool;

    /// One-shot position fetch.
    async fn current(&self) -> Result<ObserverLocation, LocationError>;
}

/// Location source backed by configured station coordinates. Reports
/// `NoFix` when none are configured.
pub struct FixedLocationSource {
    location: Option<ObserverLocation>,
}

impl FixedLocationSource {
    pub fn new(location: Option<ObserverLocation>) -> Self {
        Self { location }
    }
}

#[async_trait]
impl LocationSource for FixedLocationSource {
    fn authorized(&self) -> bool {
        true
    }

    async fn current(&self) -> Result<ObserverLocation, LocationError> {
        self.location.ok_or(LocationError::NoFix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pair() {
        let loc = ObserverLocation::from_coordinates("47.64, -122.33", Some(86.0)).unwrap();
        assert_eq!(loc.coordinates(), Some((47.64, -122.33)));
        assert_eq!(loc.altitude_or_default(), 86.0);
        assert!(!loc.manual);
    }

    #[test]
    fn rejects_incomplete_coordinates() {
        assert!(ObserverLocation::from_coordinates("47.64", None).is_none());
        assert!(ObserverLocation::from_coordinates("north, west", None).is_none());
    }

    #[test]
    fn missing_altitude_defaults_to_zero() {
        let loc = ObserverLocation::from_coordinates("0.0, 0.0", None).unwrap();
        assert_eq!(loc.altitude_or_default(), 0.0);
        // A present zero coordinate is still a coordinate.
        assert_eq!(loc.coordinates(), Some((0.0, 0.0)));
    }

    #[tokio::test]
    async fn fixed_source_reports_no_fix_without_coordinates() {
        let source = FixedLocationSource::new(None);
        assert!(source.authorized());
        assert!(matches!(source.current().await, Err(LocationError::NoFix)));
    }

    #[test]
    fn partial_fix_has_no_coordinates() {
        let loc = ObserverLocation {
            latitude: Some(10.0),
            longitude: None,
            altitude_m: None,
            manual: false,
        };
        assert_eq!(loc.coordinates(), None);
    }
}
