use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::error::SessionError;
use super::types::SessionStatus;
use crate::location::{LocationError, LocationSource, ObserverLocation};
use crate::peripheral::{LinkState, PeripheralLink};
use crate::position::{PositionClient, SatelliteId};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const ERROR_DISMISS_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Shared {
    satellite_id: Option<SatelliteId>,
    tracking: bool,
    loading_location: bool,
    location: Option<ObserverLocation>,
    credential: Option<String>,
    sample: Option<crate::position::PositionSample>,
    error: Option<String>,
    // Bumped on every error set/clear; a dismiss timer only fires if its
    // seq is still current, so a stale timer can never clear a newer
    // error.
    error_seq: u64,
    dismiss: Option<JoinHandle<()>>,
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

#[derive(Clone)]
struct WorkerCtx {
    shared: Arc<StdMutex<Shared>>,
    client: Arc<PositionClient>,
    source: Arc<dyn LocationSource>,
    link: PeripheralLink,
}

/// Orchestrates one tracking session: validates inputs, runs the poll
/// loop, owns the shared snapshot state, and forwards samples to the
/// peripheral link.
pub struct SessionController {
    shared: Arc<StdMutex<Shared>>,
    client: Arc<PositionClient>,
    source: Arc<dyn LocationSource>,
    link: PeripheralLink,
    poll_interval: Duration,
    worker: Option<WorkerHandle>,
}

impl SessionController {
    pub fn new(
        client: Arc<PositionClient>,
        source: Arc<dyn LocationSource>,
        link: PeripheralLink,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared {
                satellite_id: None,
                tracking: false,
                loading_location: false,
                location: None,
                credential: None,
                sample: None,
                error: None,
                error_seq: 0,
                dismiss: None,
            })),
            client,
            source,
            link,
            poll_interval,
            worker: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        let locked = self.shared.lock().unwrap();
        SessionStatus {
            satellite_id: locked.satellite_id,
            tracking: locked.tracking,
            loading_location: locked.loading_location,
            location: locked.location,
            sample: locked.sample.clone(),
            error: locked.error.clone(),
        }
    }

    pub fn update_credential(&self, credential: Option<String>) {
        let mut locked = self.shared.lock().unwrap();
        locked.credential = credential;
        debug!("session credential updated");
    }

    /// Replace the observer location with a manually entered one. The
    /// running poll loop picks it up on its next cycle.
    pub fn set_manual_location(&self, latitude: f64, longitude: f64, altitude_m: f64) {
        {
            let mut locked = self.shared.lock().unwrap();
            locked.location = Some(ObserverLocation::manual(latitude, longitude, altitude_m));
        }
        clear_error(&self.shared);
        info!(
            "manual observer location set to ({}, {}, {} m)",
            latitude, longitude, altitude_m
        );
    }

    /// One-shot fetch from the configured location source.
    pub async fn refresh_location(&self) -> Result<ObserverLocation, SessionError> {
        self.shared.lock().unwrap().loading_location = true;

        let result = if self.source.authorized() {
            self.source.current().await.map_err(SessionError::from)
        } else {
            Err(SessionError::Location(LocationError::NotAuthorized))
        };

        self.shared.lock().unwrap().loading_location = false;
        match result {
            Ok(location) => {
                self.shared.lock().unwrap().location = Some(location);
                clear_error(&self.shared);
                Ok(location)
            }
            Err(err) => {
                set_error(&self.shared, err.to_string());
                Err(err)
            }
        }
    }

    /// Validate and start tracking `satellite_id`. Any previous poll
    /// task is cancelled first; on validation failure the session state
    /// is left unchanged.
    pub async fn start(&mut self, satellite_id: u32) -> Result<(), SessionError> {
        let id = match SatelliteId::new(satellite_id) {
            Some(id) => id,
            None => {
                let err = SessionError::InvalidSatelliteId(satellite_id);
                set_error(&self.shared, err.to_string());
                return Err(err);
            }
        };

        let location = self.shared.lock().unwrap().location;
        match location {
            None => {
                let err = SessionError::NoLocation;
                set_error(&self.shared, err.to_string());
                return Err(err);
            }
            Some(location) if location.coordinates().is_none() => {
                let err = SessionError::IncompleteLocation;
                set_error(&self.shared, err.to_string());
                return Err(err);
            }
            Some(_) => {}
        }

        self.stop_worker().await;
        clear_error(&self.shared);
        {
            let mut locked = self.shared.lock().unwrap();
            locked.satellite_id = Some(id);
            locked.tracking = true;
        }

        let ctx = WorkerCtx {
            shared: Arc::clone(&self.shared),
            client: Arc::clone(&self.client),
            source: Arc::clone(&self.source),
            link: self.link.clone(),
        };
        let poll_interval = self.poll_interval;
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_poll_loop(ctx, id, poll_interval, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });

        info!("tracking satellite {}", id);
        Ok(())
    }

    /// Stop tracking. The poll task is joined before state flips, so no
    /// update from it can arrive after this returns.
    pub async fn stop(&mut self) {
        self.stop_worker().await;
        let mut locked = self.shared.lock().unwrap();
        locked.tracking = false;
        locked.sample = None;
        info!("tracking stopped");
    }

    /// Manually dismiss the surfaced error.
    pub fn dismiss_error(&self) {
        clear_error(&self.shared);
    }

    async fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
    }
}

async fn run_poll_loop(
    ctx: WorkerCtx,
    satellite_id: SatelliteId,
    poll_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let keep_going = tokio::select! {
            _ = &mut stop_rx => false,
            keep = run_cycle(&ctx, satellite_id) => keep,
        };
        if !keep_going {
            return;
        }

        let stopped = tokio::select! {
            _ = &mut stop_rx => true,
            _ = sleep(poll_interval) => false,
        };
        if stopped {
            return;
        }
    }
}

/// One poll cycle. Returns false when the failure is session-fatal; the
/// session state has then already been cleared.
async fn run_cycle(ctx: &WorkerCtx, satellite_id: SatelliteId) -> bool {
    // Permission can be revoked at any point mid-session; that ends the
    // session, unlike ordinary per-cycle faults.
    if !ctx.source.authorized() {
        warn!("location permission revoked, stopping tracking");
        {
            let mut locked = ctx.shared.lock().unwrap();
            locked.tracking = false;
            locked.sample = None;
        }
        set_error(&ctx.shared, "location permission revoked".to_string());
        return false;
    }

    // Re-read the location each cycle so mid-session updates take
    // effect without a restart.
    let (location, credential) = {
        let locked = ctx.shared.lock().unwrap();
        (locked.location, locked.credential.clone())
    };
    let Some(location) = location else {
        set_error(&ctx.shared, SessionError::NoLocation.to_string());
        return true;
    };
    let credential = credential.unwrap_or_default();

    match ctx.client.fetch(satellite_id, &location, &credential).await {
        Ok(sample) => {
            ctx.shared.lock().unwrap().sample = Some(sample.clone());
            clear_error(&ctx.shared);

            if ctx.link.state() == LinkState::Connected {
                let link = ctx.link.clone();
                tokio::spawn(async move {
                    if let Err(err) = link.send(sample.azimuth_deg, sample.elevation_deg).await {
                        warn!("pointing forward failed: {}", err);
                    }
                });
            }
        }
        Err(err) => {
            debug!("poll cycle for {} failed: {}", satellite_id, err);
            ctx.shared.lock().unwrap().sample = None;
            set_error(&ctx.shared, err.to_string());
        }
    }
    true
}

fn set_error(shared: &Arc<StdMutex<Shared>>, message: String) {
    let mut locked = shared.lock().unwrap();
    locked.error = Some(message);
    locked.error_seq += 1;
    let seq = locked.error_seq;
    if let Some(timer) = locked.dismiss.take() {
        timer.abort();
    }

    let shared = Arc::clone(shared);
    locked.dismiss = Some(tokio::spawn(async move {
        sleep(ERROR_DISMISS_DELAY).await;
        let mut locked = shared.lock().unwrap();
        if locked.error_seq == seq {
            locked.error = None;
            locked.dismiss = None;
            debug!("error auto-dismissed");
        }
    }));
}

fn clear_error(shared: &Arc<StdMutex<Shared>>) {
    let mut locked = shared.lock().unwrap();
    locked.error = None;
    locked.error_seq += 1;
    if let Some(timer) = locked.dismiss.take() {
        timer.abort();
    }
}
