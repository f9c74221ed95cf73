// ── Controller abstraction ──
//
// Lifecycle of one printer connection: initial snapshot, background
// polling, reconciliation into the published model, intent fan-out with
// debounced rebuilds, and fire-and-forget commands.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lanesync_api::transport::{TlsMode, TransportConfig};
use lanesync_api::PrinterClient;

use crate::auxiliary::AuxResolver;
use crate::command::Command;
use crate::config::{ControllerConfig, TlsVerification};
use crate::convert::truthy;
use crate::debounce::RebuildScheduler;
use crate::error::CoreError;
use crate::intent::Intent;
use crate::model::AfcModel;
use crate::poll::PeriodicTask;
use crate::reconcile::Reconciler;
use crate::store::ModelStore;
use crate::summary::SystemSummary;

const INTENT_CHANNEL_SIZE: usize = 1024;

/// Prefix of every binary filament sensor object.
pub const SENSOR_PREFIX: &str = "filament_switch_sensor";
/// The sensor toggled to bypass the filament changer.
pub const VIRTUAL_BYPASS_SENSOR: &str = "filament_switch_sensor virtual_bypass";

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: ModelStore,
    connection_state: watch::Sender<ConnectionState>,
    intent_tx: broadcast::Sender<Intent>,
    client: Mutex<Option<PrinterClient>>,
    sync: Mutex<SyncState>,
    aux: Mutex<AuxResolver>,
    rebuilds: RebuildScheduler,
    cancel: CancellationToken,
    /// Child token for the current connection; replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    tasks: Mutex<Vec<PeriodicTask>>,
}

/// State only the polling paths touch.
#[derive(Default)]
struct SyncState {
    model: AfcModel,
    reconciler: Reconciler,
    sensors: Vec<String>,
    sensor_states: HashMap<String, bool>,
}

impl Controller {
    /// Create a controller. Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (intent_tx, _) = broadcast::channel(INTENT_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();
        let aux = AuxResolver::new(config.aux_cache_ttl);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: ModelStore::new(),
                connection_state,
                intent_tx,
                client: Mutex::new(None),
                sync: Mutex::new(SyncState::default()),
                aux: Mutex::new(aux),
                rebuilds: RebuildScheduler::new(),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Fetch the initial snapshot, register auxiliary objects and start
    /// the background polls.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        // A reconnect replaces the previous connection's polls.
        let child = {
            let mut guard = self.inner.cancel_child.lock().await;
            guard.cancel();
            *guard = self.inner.cancel.child_token();
            guard.clone()
        };
        let previous: Vec<PeriodicTask> = self.inner.tasks.lock().await.drain(..).collect();
        for task in previous {
            task.stop().await;
        }

        let config = &self.inner.config;
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
            api_key: config.api_key.clone(),
        };
        let client = match PrinterClient::new(config.url.clone(), &transport) {
            Ok(client) => client,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };

        let snapshot = match client.afc_status().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        let built = AfcModel::from_snapshot(&snapshot);
        if !built.diagnostics.is_empty() {
            debug!(skipped = built.diagnostics.len(), "initial snapshot had malformed entries");
        }

        let objects = match client.list_objects().await {
            Ok(objects) => objects,
            Err(e) => {
                warn!(error = %e, "object list unavailable, auxiliary values disabled");
                Vec::new()
            }
        };
        let sensors: Vec<String> = objects
            .iter()
            .filter(|name| name.starts_with(SENSOR_PREFIX))
            .cloned()
            .collect();
        self.inner.aux.lock().await.register_objects(&objects);

        {
            let mut sync = self.inner.sync.lock().await;
            sync.reconciler = Reconciler::new(&built.model);
            sync.model = built.model.clone();
            sync.sensors = sensors;
            sync.sensor_states.clear();
        }
        self.inner.store.publish(built.model);
        *self.inner.client.lock().await = Some(client);

        let mut tasks = self.inner.tasks.lock().await;
        if !config.refresh_interval.is_zero() {
            let ctrl = self.clone();
            tasks.push(PeriodicTask::start(
                "refresh",
                config.refresh_interval,
                &child,
                move || {
                    let ctrl = ctrl.clone();
                    async move {
                        if let Err(e) = ctrl.refresh().await {
                            warn!(error = %e, "refresh failed, keeping previous state");
                        }
                    }
                },
            ));
        }
        if !config.sensor_poll_interval.is_zero() {
            let ctrl = self.clone();
            tasks.push(PeriodicTask::start(
                "sensor_poll",
                config.sensor_poll_interval,
                &child,
                move || {
                    let ctrl = ctrl.clone();
                    async move {
                        if let Err(e) = ctrl.poll_sensors().await {
                            warn!(error = %e, "sensor poll failed");
                        }
                    }
                },
            ));
        }

        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(url = %config.url, "connected to printer");
        Ok(())
    }

    /// Stop polling, cancel pending rebuilds and drop the client.
    ///
    /// No fetch starts after this returns.
    pub async fn disconnect(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let tasks: Vec<PeriodicTask> = self.inner.tasks.lock().await.drain(..).collect();
        for task in tasks {
            task.stop().await;
        }
        self.inner.rebuilds.cancel_all();

        *self.inner.client.lock().await = None;
        self.inner.connection_state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// One-shot: connect without background polls, run `f`, disconnect.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval = std::time::Duration::ZERO;
        cfg.sensor_poll_interval = std::time::Duration::ZERO;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one reconciliation pass. Returns the number of intents emitted.
    ///
    /// On fetch failure the model is left as it was.
    pub async fn refresh(&self) -> Result<usize, CoreError> {
        let client = self.client().await?;
        let snapshot = client.afc_status().await?;

        let (model, reconciliation) = {
            let mut sync = self.inner.sync.lock().await;
            let SyncState {
                model, reconciler, ..
            } = &mut *sync;
            let reconciliation = reconciler.reconcile(model, &snapshot);
            (model.clone(), reconciliation)
        };

        if reconciliation.invalidate_aux {
            self.inner.aux.lock().await.invalidate();
        }
        if !reconciliation.stale_lanes.is_empty() || !reconciliation.diagnostics.is_empty() {
            debug!(
                stale = ?reconciliation.stale_lanes,
                skipped = reconciliation.diagnostics.len(),
                "partial snapshot this cycle"
            );
        }
        self.inner.store.publish(model);

        let count = reconciliation.intents.len();
        for intent in reconciliation.intents {
            self.dispatch(intent);
        }
        Ok(count)
    }

    /// Query every filament sensor and emit intents for those that changed.
    pub async fn poll_sensors(&self) -> Result<usize, CoreError> {
        let client = self.client().await?;
        let sensors = self.inner.sync.lock().await.sensors.clone();
        if sensors.is_empty() {
            return Ok(0);
        }
        let statuses = client.query_objects(&sensors).await?;

        let mut intents = Vec::new();
        {
            let mut sync = self.inner.sync.lock().await;
            for name in &sensors {
                let Some(status) = statuses.get(name).and_then(|s| s.as_object()) else {
                    continue;
                };
                let detected = status.get("filament_detected").is_some_and(truthy);
                if sync.sensor_states.insert(name.clone(), detected) == Some(detected) {
                    continue;
                }
                intents.push(Intent::UpdateSensor {
                    sensor: name.clone(),
                    detected,
                });
                if name == VIRTUAL_BYPASS_SENSOR {
                    intents.push(Intent::UpdateVirtualBypass { enabled: detected });
                }
            }
            let aggregator_lane = sync
                .model
                .current_lane()
                .is_some_and(|(unit, _)| unit.uses_aggregator());
            if aggregator_lane {
                intents.push(Intent::UpdateSystemSummary);
            }
        }

        let count = intents.len();
        for intent in intents {
            self.dispatch(intent);
        }
        Ok(count)
    }

    /// Send immediately, or after the debounce delay for rebuilds.
    fn dispatch(&self, intent: Intent) {
        if let Intent::RebuildLaneView { lane, .. } = &intent {
            let key = lane.clone();
            let tx = self.inner.intent_tx.clone();
            self.inner
                .rebuilds
                .schedule(key, self.inner.config.rebuild_debounce, move || {
                    let _ = tx.send(intent);
                });
        } else {
            let _ = self.inner.intent_tx.send(intent);
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate and send a directive.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }
        let script = command.script()?;
        if let Some(lane) = command.lane() {
            if self.inner.store.snapshot().lane(lane).is_none() {
                return Err(CoreError::LaneNotFound { name: lane.into() });
            }
        }
        let client = self.client().await?;
        info!(script = %script, "sending command");
        client.run_gcode(&script).await?;
        Ok(())
    }

    // ── Derived values ───────────────────────────────────────────

    /// Live auxiliary reading for `lane`, if its unit reports one.
    pub async fn lane_aux_value(&self, lane: &str) -> Result<Option<f64>, CoreError> {
        let model = self.inner.store.snapshot();
        let (unit, lane) = model
            .units
            .iter()
            .find_map(|u| u.lane(lane).map(|l| (u, l)))
            .ok_or_else(|| CoreError::LaneNotFound { name: lane.into() })?;
        let client = self.client().await?;
        Ok(self
            .inner
            .aux
            .lock()
            .await
            .lane_value(&client, unit, lane)
            .await)
    }

    /// The "currently loaded" summary for the published model.
    pub async fn system_summary(&self) -> SystemSummary {
        let model = self.inner.store.snapshot();
        let Some((unit, lane)) = model.current_lane() else {
            return SystemSummary::new(None, None);
        };
        let aux_value = match self.client().await {
            Ok(client) => {
                self.inner
                    .aux
                    .lock()
                    .await
                    .lane_value(&client, unit, lane)
                    .await
            }
            Err(_) => None,
        };
        SystemSummary::new(Some(lane), aux_value)
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to presentation intents, in emission order.
    pub fn intents(&self) -> broadcast::Receiver<Intent> {
        self.inner.intent_tx.subscribe()
    }

    /// Latest published model.
    pub fn model(&self) -> Arc<AfcModel> {
        self.inner.store.snapshot()
    }

    pub fn subscribe_model(&self) -> watch::Receiver<Arc<AfcModel>> {
        self.inner.store.subscribe()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    /// Known filament sensor objects.
    pub async fn sensors(&self) -> Vec<String> {
        self.inner.sync.lock().await.sensors.clone()
    }

    pub fn pending_rebuilds(&self) -> usize {
        self.inner.rebuilds.pending_count()
    }

    async fn client(&self) -> Result<PrinterClient, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::ControllerDisconnected)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
