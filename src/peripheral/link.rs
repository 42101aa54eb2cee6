use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::address::MacAddress;
use super::error::LinkError;
use super::payload::format_pointing;
use super::transport::{PointerConnection, PointerTransport};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

struct Inner {
    connection: Option<Box<dyn PointerConnection>>,
    attempt: Option<JoinHandle<()>>,
    // Bumped on every connect/disconnect; an attempt whose seq no longer
    // matches lost the race and must not touch shared state.
    attempt_seq: u64,
}

/// Connection to the single pointer peripheral. All state transitions
/// go through `set_state`; observers watch the state channel.
#[derive(Clone)]
pub struct PeripheralLink {
    transport: Arc<dyn PointerTransport>,
    inner: Arc<Mutex<Inner>>,
    state_tx: Arc<watch::Sender<LinkState>>,
}

impl PeripheralLink {
    pub fn new(transport: Arc<dyn PointerTransport>) -> Self {
        let (state_tx, _) = watch::channel(LinkState::Disconnected);
        Self {
            transport,
            inner: Arc::new(Mutex::new(Inner {
                connection: None,
                attempt: None,
                attempt_seq: 0,
            })),
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn state(&self) -> LinkState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: LinkState) {
        self.state_tx.send_if_modified(|current| {
            if *current != state {
                debug!("peripheral link {} -> {}", current, state);
                *current = state;
                true
            } else {
                false
            }
        });
    }

    /// Begin connecting to `address`. Fails fast, without touching the
    /// transport, on a malformed address or an unusable adapter. A new
    /// call supersedes any attempt still in flight.
    pub async fn connect(&self, address: &str) -> Result<(), LinkError> {
        let address = match MacAddress::parse(address) {
            Ok(address) => address,
            Err(err) => {
                warn!("{}", err);
                self.set_state(LinkState::Error);
                return Err(err.into());
            }
        };

        if !self.transport.adapter_available() {
            self.set_state(LinkState::Error);
            return Err(LinkError::AdapterMissing);
        }
        if !self.transport.adapter_enabled() {
            self.set_state(LinkState::Error);
            return Err(LinkError::AdapterDisabled);
        }
        if !self.transport.authorized() {
            self.set_state(LinkState::Error);
            return Err(LinkError::NotAuthorized);
        }

        let mut inner = self.inner.lock().await;
        if let Some(attempt) = inner.attempt.take() {
            attempt.abort();
        }
        inner.attempt_seq += 1;
        let seq = inner.attempt_seq;
        if let Some(mut connection) = inner.connection.take() {
            connection.close().await;
        }

        self.set_state(LinkState::Connecting);
        info!("connecting to peripheral {}", address);

        let link = self.clone();
        inner.attempt = Some(tokio::spawn(async move {
            link.run_attempt(seq, address).await;
        }));
        Ok(())
    }

    async fn run_attempt(self, seq: u64, address: MacAddress) {
        let outcome = match timeout(CONNECT_TIMEOUT, establish(&*self.transport, &address)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::ConnectTimeout),
        };

        let mut inner = self.inner.lock().await;
        if inner.attempt_seq != seq {
            // Superseded while connecting; release quietly.
            if let Ok(mut connection) = outcome {
                connection.close().await;
            }
            return;
        }
        inner.attempt = None;

        match outcome {
            Ok(connection) => {
                inner.connection = Some(connection);
                self.set_state(LinkState::Connected);
                info!("peripheral {} connected", address);
            }
            Err(err) => {
                warn!("peripheral connect failed: {}", err);
                self.set_state(LinkState::Error);
            }
        }
    }

    /// Idempotent. An intentional disconnect never classifies as Error,
    /// whatever state the link was in.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(attempt) = inner.attempt.take() {
            attempt.abort();
        }
        inner.attempt_seq += 1;
        if let Some(mut connection) = inner.connection.take() {
            connection.close().await;
            info!("peripheral disconnected");
        }
        drop(inner);
        self.set_state(LinkState::Disconnected);
    }

    /// Fire-and-forget pointing write; only valid while Connected.
    /// Failures are reported, not retried — losing the connection also
    /// releases it and lands in Error.
    pub async fn send(&self, azimuth_deg: f64, elevation_deg: f64) -> Result<(), LinkError> {
        if !self.transport.authorized() {
            // Permission revoked under us.
            self.set_state(LinkState::Error);
            return Err(LinkError::NotAuthorized);
        }
        if self.state() != LinkState::Connected {
            return Err(LinkError::NotConnected);
        }

        let line = format_pointing(azimuth_deg, elevation_deg);
        let mut inner = self.inner.lock().await;
        let result = match inner.connection.as_mut() {
            Some(connection) => connection.write(line.as_bytes()).await,
            None => return Err(LinkError::NotConnected),
        };

        match result {
            Ok(()) => {
                debug!("sent pointing line {:?}", line);
                Ok(())
            }
            Err(LinkError::ConnectionLost) => {
                warn!("peripheral connection lost");
                if let Some(mut connection) = inner.connection.take() {
                    connection.close().await;
                }
                self.set_state(LinkState::Error);
                Err(LinkError::ConnectionLost)
            }
            Err(err) => {
                warn!("peripheral write failed: {}", err);
                Err(err)
            }
        }
    }

    /// Scoped release: cancels any pending attempt, drops the
    /// connection, resets state. Safe to call repeatedly.
    pub async fn cleanup(&self) {
        self.disconnect().await;
    }
}

async fn establish(
    transport: &dyn PointerTransport,
    address: &MacAddress,
) -> Result<Box<dyn PointerConnection>, LinkError> {
    let mut connection = transport.connect(address).await?;
    if let Err(err) = connection.discover_writer().await {
        connection.close().await;
        return Err(err);
    }
    Ok(connection)
}
