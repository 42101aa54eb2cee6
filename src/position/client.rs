use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::error::{PositionError, TransportError};
use super::types::{PositionSample, PositionsResponse, SatelliteId};
use crate::location::ObserverLocation;

pub const DEFAULT_BASE_URL: &str = "https://api.n2yo.com/rest/v1/satellite";

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// The service predicts positions over a window; one second yields a
// single current sample.
const PREDICTION_WINDOW_S: u32 = 1;

/// Parameters of one position lookup.
#[derive(Debug, Clone)]
pub struct PositionQuery {
    pub satellite_id: SatelliteId,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub credential: String,
}

/// Raw HTTP reply, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PositionTransport: Send + Sync {
    async fn request(&self, query: &PositionQuery) -> Result<RawReply, TransportError>;
}

/// Live transport against the remote position service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PositionTransport for HttpTransport {
    async fn request(&self, query: &PositionQuery) -> Result<RawReply, TransportError> {
        let url = format!(
            "{}/positions/{}/{}/{}/{}/{}",
            self.base_url,
            query.satellite_id,
            query.latitude,
            query.longitude,
            query.altitude_m,
            PREDICTION_WINDOW_S
        );

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", query.credential.as_str())])
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawReply { status, body })
    }
}

/// Client for single position lookups. Transport failures are retried
/// with doubling backoff; everything the service itself said is
/// classified and surfaced on the first attempt.
pub struct PositionClient {
    transport: Arc<dyn PositionTransport>,
}

impl PositionClient {
    pub fn new(transport: Arc<dyn PositionTransport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(
        &self,
        satellite_id: SatelliteId,
        location: &ObserverLocation,
        credential: &str,
    ) -> Result<PositionSample, PositionError> {
        if credential.trim().is_empty() {
            return Err(PositionError::MissingCredential);
        }
        let (latitude, longitude) = location
            .coordinates()
            .ok_or(PositionError::IncompleteLocation)?;

        let query = PositionQuery {
            satellite_id,
            latitude,
            longitude,
            altitude_m: location.altitude_or_default(),
            credential: credential.trim().to_string(),
        };

        let mut attempt = 1;
        loop {
            match self.transport.request(&query).await {
                Ok(reply) => return interpret(satellite_id, reply),
                Err(err) => {
                    if attempt == MAX_ATTEMPTS {
                        warn!(
                            "position request for {} failed after {} attempts: {}",
                            satellite_id, MAX_ATTEMPTS, err
                        );
                        return Err(err.into());
                    }
                    let backoff = INITIAL_BACKOFF * (1u32 << (attempt - 1));
                    debug!(
                        "position request attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, MAX_ATTEMPTS, err, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn interpret(satellite_id: SatelliteId, reply: RawReply) -> Result<PositionSample, PositionError> {
    if !(200..300).contains(&reply.status) {
        return Err(classify_status(reply.status, &reply.body));
    }

    let parsed: PositionsResponse =
        serde_json::from_str(&reply.body).map_err(|e| PositionError::Malformed(e.to_string()))?;

    // The service reports application errors inside 200 responses.
    if let Some(message) = parsed.error.as_deref().filter(|m| !m.trim().is_empty()) {
        warn!("position service returned error in 200 reply: {}", message);
        return Err(classify_api_error(message));
    }

    let positions = parsed.positions.unwrap_or_default();
    let position = positions.first().ok_or(PositionError::NoData)?;
    let (azimuth_deg, elevation_deg) = match (position.azimuth, position.elevation) {
        (Some(az), Some(el)) => (az, el),
        _ => return Err(PositionError::NoData),
    };

    let timestamp = position
        .timestamp
        .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
        .unwrap_or_else(Utc::now);
    let satellite_name = parsed
        .info
        .and_then(|i| i.sat_name)
        .unwrap_or_else(|| format!("Satellite {}", satellite_id));

    Ok(PositionSample {
        azimuth_deg,
        elevation_deg,
        timestamp,
        satellite_name,
        satellite_latitude: position.sat_latitude,
        satellite_longitude: position.sat_longitude,
        satellite_altitude_km: position.sat_altitude,
        eclipsed: position.eclipsed,
    })
}

fn classify_api_error(message: &str) -> PositionError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("invalid api key") {
        PositionError::InvalidCredential
    } else if lower.contains("rate limit") {
        PositionError::RateLimited
    } else {
        PositionError::Api(message.to_string())
    }
}

fn classify_status(status: u16, body: &str) -> PositionError {
    // Error replies usually carry the same JSON `error` field; fall back
    // to the status code when the body says nothing usable.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return match classify_api_error(message) {
                PositionError::Api(msg) if status >= 500 => PositionError::Upstream(msg),
                other => other,
            };
        }
    }

    match status {
        401 => PositionError::AuthFailed,
        429 => PositionError::RateLimited,
        s if s >= 500 => PositionError::Upstream(format!("HTTP {}", s)),
        s => PositionError::Api(format!("HTTP {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn observer() -> ObserverLocation {
        ObserverLocation::manual(47.6, -122.3, 50.0)
    }

    fn satellite() -> SatelliteId {
        SatelliteId::new(25544).unwrap()
    }

    struct FailingTransport {
        calls: AtomicU32,
        call_times: Mutex<Vec<Instant>>,
    }

    impl FailingTransport {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PositionTransport for FailingTransport {
        async fn request(&self, _query: &PositionQuery) -> Result<RawReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            Err(TransportError("connection refused".into()))
        }
    }

    struct CannedTransport {
        status: u16,
        body: String,
        calls: AtomicU32,
    }

    impl CannedTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PositionTransport for CannedTransport {
        async fn request(&self, _query: &PositionQuery) -> Result<RawReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawReply {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    const GOOD_BODY: &str = r#"{
        "info": {"satid": 25544, "satname": "SPACE STATION", "transactionscount": 4},
        "positions": [{
            "satlatitude": 21.07, "satlongitude": -102.93, "sataltitude": 437.2,
            "azimuth": 45.6, "elevation": -7.2, "ra": 287.5, "dec": -43.1,
            "timestamp": 1521354418, "eclipsed": false
        }]
    }"#;

    #[tokio::test(start_paused = true)]
    async fn transport_failures_retry_three_times_with_doubling_backoff() {
        let transport = Arc::new(FailingTransport::new());
        let client = PositionClient::new(transport.clone());

        let started = Instant::now();
        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;

        assert!(matches!(result, Err(PositionError::Transport(_))));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);

        let times = transport.call_times.lock().unwrap();
        assert_eq!(times[1] - times[0], Duration::from_secs(1));
        assert_eq!(times[2] - times[1], Duration::from_secs(2));
        // No trailing delay after the final attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn success_parses_first_position() {
        let transport = Arc::new(CannedTransport::new(200, GOOD_BODY));
        let client = PositionClient::new(transport.clone());

        let sample = client
            .fetch(satellite(), &observer(), "A1B2-C3D4-E5F6")
            .await
            .unwrap();

        assert_eq!(sample.azimuth_deg, 45.6);
        assert_eq!(sample.elevation_deg, -7.2);
        assert_eq!(sample.satellite_name, "SPACE STATION");
        assert_eq!(sample.timestamp.timestamp(), 1521354418);
        assert_eq!(sample.eclipsed, Some(false));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn error_field_in_200_reply_is_classified_without_retry() {
        let transport = Arc::new(CannedTransport::new(
            200,
            r#"{"error": "Invalid API Key!"}"#,
        ));
        let client = PositionClient::new(transport.clone());

        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;

        assert!(matches!(result, Err(PositionError::InvalidCredential)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_message_is_classified() {
        let transport = Arc::new(CannedTransport::new(
            200,
            r#"{"error": "API rate limit exceeded, slow down"}"#,
        ));
        let client = PositionClient::new(transport);

        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;
        assert!(matches!(result, Err(PositionError::RateLimited)));
    }

    #[tokio::test]
    async fn empty_positions_is_no_data() {
        let transport = Arc::new(CannedTransport::new(
            200,
            r#"{"info": {"satid": 99998, "satname": null, "transactionscount": 1}, "positions": []}"#,
        ));
        let client = PositionClient::new(transport);

        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;
        assert!(matches!(result, Err(PositionError::NoData)));
    }

    #[tokio::test]
    async fn position_without_look_angles_is_no_data() {
        let transport = Arc::new(CannedTransport::new(
            200,
            r#"{"positions": [{"satlatitude": 1.0, "timestamp": 1521354418}]}"#,
        ));
        let client = PositionClient::new(transport);

        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;
        assert!(matches!(result, Err(PositionError::NoData)));
    }

    #[tokio::test]
    async fn status_codes_map_to_distinct_errors() {
        for (status, body) in [(401u16, "{}"), (429, "{}"), (503, "not json")] {
            let transport = Arc::new(CannedTransport::new(status, body));
            let client = PositionClient::new(transport.clone());
            let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;
            match status {
                401 => assert!(matches!(result, Err(PositionError::AuthFailed))),
                429 => assert!(matches!(result, Err(PositionError::RateLimited))),
                _ => assert!(matches!(result, Err(PositionError::Upstream(_)))),
            }
            // Status-level rejections are not retried.
            assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn structured_error_body_wins_over_status_fallback() {
        let transport = Arc::new(CannedTransport::new(
            403,
            r#"{"error": "rate limit exceeded for key"}"#,
        ));
        let client = PositionClient::new(transport);

        let result = client.fetch(satellite(), &observer(), "A1B2-C3D4-E5F6").await;
        assert!(matches!(result, Err(PositionError::RateLimited)));
    }

    #[tokio::test]
    async fn preconditions_fail_before_any_network_call() {
        let transport = Arc::new(FailingTransport::new());
        let client = PositionClient::new(transport.clone());

        let result = client.fetch(satellite(), &observer(), "   ").await;
        assert!(matches!(result, Err(PositionError::MissingCredential)));

        let incomplete = ObserverLocation {
            latitude: Some(47.6),
            longitude: None,
            altitude_m: None,
            manual: true,
        };
        let result = client
            .fetch(satellite(), &incomplete, "A1B2-C3D4-E5F6")
            .await;
        assert!(matches!(result, Err(PositionError::IncompleteLocation)));

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
