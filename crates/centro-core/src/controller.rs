// ── Controller ──
//
// Full lifecycle for one boiler installation: portal login, telemetry
// subscription, the periodic refresh cycle, and command routing. The
// merged state lives in the DataStore; points read it from there.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use centro_api::portal::ControlCommand;
use centro_api::{ParamMap, PortalClient, TelemetryHandle, TelemetryUpdate};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::points::PointSet;
use crate::store::{DataStore, Snapshot};
use crate::stream::SnapshotStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Result of one full refresh.
struct RefreshOutcome {
    snapshot: Arc<Snapshot>,
    /// The pull succeeded and carried at least one field.
    pulled_any: bool,
    live_empty: bool,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`; points keep a clone to
/// route their writes.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    portal: Mutex<Option<Arc<PortalClient>>>,
    telemetry: Mutex<Option<Arc<TelemetryHandle>>>,
    refresh_lock: Mutex<()>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to log in and start background tasks.
    pub fn new(config: ControllerConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(DataStore::new()),
                connection_state,
                cancel: CancellationToken::new(),
                portal: Mutex::new(None),
                telemetry: Mutex::new(None),
                refresh_lock: Mutex::new(()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    /// The last published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.snapshot()
    }

    /// Subscribe to snapshot publications.
    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Every point of the installation, bound to this controller.
    pub fn points(&self) -> PointSet {
        PointSet::new(self)
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, start telemetry, run the first refresh and spawn the
    /// periodic refresh task.
    ///
    /// Fails with [`CoreError::AuthenticationFailed`] if the portal login
    /// fails, and with [`CoreError::NoData`] if the first refresh produced
    /// nothing from either path.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let config = &self.inner.config;
        let portal = PortalClient::new(
            config.portal_url.clone(),
            config.install_id.clone(),
            config.email.clone(),
            config.password.clone(),
            &config.transport(),
        )
        .inspect_err(|_| self.mark_failed())?;

        if let Err(e) = portal.login().await {
            self.mark_failed();
            let message = match e {
                centro_api::Error::Authentication { message } => message,
                other => other.to_string(),
            };
            return Err(CoreError::AuthenticationFailed { message });
        }

        *self.inner.portal.lock().await = Some(Arc::new(portal));

        if let Some(broker) = config.telemetry.clone() {
            let handle = Arc::new(TelemetryHandle::connect(
                broker,
                self.inner.cancel.child_token(),
            ));
            let live = Arc::clone(&handle);
            let task = tokio::spawn(forward_telemetry(
                Arc::clone(&self.inner.store),
                handle.subscribe(),
                move || live.live(),
                self.inner.cancel.clone(),
            ));
            self.inner.task_handles.lock().await.push(task);
            *self.inner.telemetry.lock().await = Some(handle);
        }

        let outcome = self.refresh_inner().await?;
        if !outcome.pulled_any && outcome.live_empty {
            warn!("no data from portal or telemetry on first refresh");
            self.teardown().await;
            self.mark_failed();
            return Err(CoreError::NoData);
        }

        let interval_secs = config.refresh_interval_secs;
        if interval_secs > 0 {
            let controller = self.clone();
            let task = tokio::spawn(run_periodic(
                Duration::from_secs(interval_secs),
                self.inner.cancel.clone(),
                move || {
                    let controller = controller.clone();
                    async move {
                        if let Err(e) = controller.refresh().await {
                            warn!(error = %e, "periodic refresh failed");
                        }
                    }
                },
            ));
            self.inner.task_handles.lock().await.push(task);
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(
            install_id = %config.install_id,
            fields = outcome.snapshot.len(),
            "connected to boiler"
        );
        Ok(())
    }

    /// Stop background tasks, release the telemetry connection and drop
    /// the portal session.
    pub async fn disconnect(&self) {
        self.teardown().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    async fn teardown(&self) {
        if let Some(telemetry) = self.inner.telemetry.lock().await.take() {
            telemetry.disconnect().await;
        }

        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        if let Some(portal) = self.inner.portal.lock().await.take() {
            portal.close();
        }
    }

    fn mark_failed(&self) {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Failed);
    }

    async fn portal(&self) -> Option<Arc<PortalClient>> {
        self.inner.portal.lock().await.clone()
    }

    async fn live_params(&self) -> Arc<ParamMap> {
        match self.inner.telemetry.lock().await.as_ref() {
            Some(telemetry) => telemetry.live(),
            None => Arc::new(ParamMap::new()),
        }
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one full refresh and return the published snapshot.
    ///
    /// Only fails when not connected; a failed pull degrades to merging
    /// live telemetry into the previous snapshot.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        Ok(self.refresh_inner().await?.snapshot)
    }

    /// Out-of-band refresh after a write. Failures are logged.
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "requested refresh failed");
        }
    }

    async fn refresh_inner(&self) -> Result<RefreshOutcome, CoreError> {
        let portal = self.portal().await.ok_or(CoreError::ControllerDisconnected)?;
        let _guard = self.inner.refresh_lock.lock().await;

        // Asks the boiler to publish; the pull below does not depend on it.
        portal.refresh_status().await;

        let pulled = match portal.try_fetch_status().await {
            Ok(params) => Some(params),
            Err(e) => {
                if e.invalidates_session() {
                    portal.close();
                }
                if e.is_transient() {
                    warn!(error = %e, "portal unreachable, keeping previous snapshot");
                } else {
                    warn!(error = %e, "status pull failed, keeping previous snapshot");
                }
                None
            }
        };

        let live = self.live_params().await;
        let snapshot = self.inner.store.apply_refresh(&live, pulled.as_ref());
        debug!(
            fields = snapshot.len(),
            live = live.len(),
            pulled = pulled.as_ref().map(ParamMap::len),
            "refresh complete"
        );

        Ok(RefreshOutcome {
            snapshot,
            pulled_any: pulled.as_ref().is_some_and(|p| !p.is_empty()),
            live_empty: live.is_empty(),
        })
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Send a control command; `true` if the portal accepted it.
    pub async fn send_command(&self, command: &ControlCommand) -> bool {
        let Some(portal) = self.portal().await else {
            warn!(%command, "command dropped: controller not connected");
            return false;
        };
        portal.send_command(command).await
    }

    /// Send a control command, reporting why it failed.
    pub async fn try_send_command(&self, command: &ControlCommand) -> Result<(), CoreError> {
        let portal = self.portal().await.ok_or(CoreError::ControllerDisconnected)?;
        portal.try_send_command(command).await.map_err(|e| {
            if e.invalidates_session() {
                portal.close();
            }
            CoreError::from(e)
        })
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the periodic refresh since only one request-response
    /// cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run `tick` once per `period` until cancelled. The first tick fires one
/// full period after the start.
async fn run_periodic<F, Fut>(period: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => tick().await,
        }
    }
}

/// Apply every telemetry frame to the store as it arrives.
///
/// `live` yields the cumulative map of every frame received so far.
async fn forward_telemetry<L>(
    store: Arc<DataStore>,
    mut rx: broadcast::Receiver<Arc<TelemetryUpdate>>,
    live: L,
    cancel: CancellationToken,
) where
    L: Fn() -> Arc<ParamMap>,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            update = rx.recv() => match update {
                Ok(update) => {
                    store.apply_telemetry(&update.fields);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // The live map already holds every skipped frame.
                    warn!(skipped, "telemetry forwarder lagged, applying live map");
                    store.apply_telemetry(&live());
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use centro_api::FieldValue;
    use chrono::Utc;

    use super::*;
    use crate::store::SnapshotSource;

    fn frame(entries: &[(&str, f64)]) -> ParamMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), FieldValue::Number(*v)))
            .collect()
    }

    fn update(entries: &[(&str, f64)]) -> Arc<TelemetryUpdate> {
        Arc::new(TelemetryUpdate {
            topic: "cm/inst/biotec/AD53C83A".into(),
            fields: frame(entries),
            received_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn forwarded_frames_reach_the_store() {
        let store = Arc::new(DataStore::new());
        let (tx, rx) = broadcast::channel(16);
        let task = tokio::spawn(forward_telemetry(
            Arc::clone(&store),
            rx,
            || Arc::new(ParamMap::new()),
            CancellationToken::new(),
        ));

        tx.send(update(&[("B_Tk1", 62.5)])).unwrap();
        tx.send(update(&[("B_Tptv1", 45.0)])).unwrap();
        drop(tx);
        task.await.unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.get_f64("B_Tk1"), Some(62.5));
        assert_eq!(snap.get_f64("B_Tptv1"), Some(45.0));
        assert_eq!(snap.source, SnapshotSource::Telemetry);
    }

    #[tokio::test]
    async fn lagged_forwarder_applies_live_map_and_continues() {
        let store = Arc::new(DataStore::new());
        let (tx, rx) = broadcast::channel(1);

        // Capacity 1: the first two frames are overwritten before the
        // forwarder ever polls.
        tx.send(update(&[("B_Tk1", 60.0)])).unwrap();
        tx.send(update(&[("B_Tptv1", 45.0)])).unwrap();
        tx.send(update(&[("B_Tk1", 63.0)])).unwrap();

        let live = Arc::new(frame(&[("B_Tk1", 63.0), ("B_Tptv1", 45.0)]));
        let task = tokio::spawn(forward_telemetry(
            Arc::clone(&store),
            rx,
            move || Arc::clone(&live),
            CancellationToken::new(),
        ));

        tokio::task::yield_now().await;
        tx.send(update(&[("B_fan", 1200.0)])).unwrap();
        drop(tx);
        task.await.unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.get_f64("B_Tptv1"), Some(45.0));
        assert_eq!(snap.get_f64("B_Tk1"), Some(63.0));
        assert_eq!(snap.get_f64("B_fan"), Some(1200.0));
    }

    #[tokio::test]
    async fn cancelled_forwarder_stops() {
        let store = Arc::new(DataStore::new());
        let (_tx, rx) = broadcast::channel::<Arc<TelemetryUpdate>>(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(forward_telemetry(
            store,
            rx,
            || Arc::new(ParamMap::new()),
            cancel.clone(),
        ));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_ticks_once_per_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let counter = Arc::clone(&ticks);
        let task = tokio::spawn(run_periodic(
            Duration::from_secs(60),
            cancel.clone(),
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            },
        ));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }
}
