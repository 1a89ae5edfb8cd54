//! ---
//! wd_section: "01-core-functionality"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Dashboard controller lifecycle and the refresh loop."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use wattdash_client::BackendClient;
use wattdash_common::config::DashboardConfig;

use crate::connection::ConnectionState;
use crate::metrics::{DashboardMetrics, SharedRegistry};
use crate::poller::{PollOutcome, SequenceGate};
use crate::state::DashboardState;

/// State shared between the poll loop (sole writer) and render surfaces.
pub type SharedState = Arc<RwLock<DashboardState>>;

/// Owns the refresh lifecycle: a fixed-interval telemetry poll loop and a
/// one-shot forecast load, both feeding one observable [`DashboardState`].
///
/// There is deliberately no ambient global here: construct, `start`, hold
/// the returned [`DashboardHandle`], `shutdown` when done.
#[derive(Debug)]
pub struct DashboardController {
    config: DashboardConfig,
    client: BackendClient,
    metrics: Option<DashboardMetrics>,
}

impl DashboardController {
    /// Build a controller from validated configuration. Passing a registry
    /// enables prometheus instrumentation of the refresh loop.
    pub fn new(config: DashboardConfig, registry: Option<SharedRegistry>) -> Result<Self> {
        config.validate()?;
        let client = BackendClient::from_config(&config.backend)?;
        Self::with_client(config, client, registry)
    }

    /// Build a controller around an existing client. Integration tests use
    /// this to point the controller at an in-process stub backend.
    pub fn with_client(
        config: DashboardConfig,
        client: BackendClient,
        registry: Option<SharedRegistry>,
    ) -> Result<Self> {
        let metrics = match registry {
            Some(registry) => Some(DashboardMetrics::new(registry)?),
            None => None,
        };
        Ok(Self {
            config,
            client,
            metrics,
        })
    }

    /// Start polling (first refresh fires immediately) and the one-shot
    /// forecast load; returns the lifecycle handle.
    pub async fn start(self) -> Result<DashboardHandle> {
        let (shutdown_tx, _) = broadcast::channel(4);
        let state: SharedState = Arc::new(RwLock::new(DashboardState::new()));

        if let Some(metrics) = &self.metrics {
            metrics.set_connection_state(ConnectionState::Initializing);
        }

        let poll_task = tokio::spawn(run_poll_loop(
            self.client.clone(),
            state.clone(),
            self.config.backend.poll_interval,
            self.metrics.clone(),
            shutdown_tx.subscribe(),
        ));
        let forecast_task = tokio::spawn(load_forecast(
            self.client.clone(),
            state.clone(),
            self.metrics.clone(),
            shutdown_tx.subscribe(),
        ));

        info!(
            backend = %self.client.base_url(),
            interval_ms = self.config.backend.poll_interval.as_millis() as u64,
            "dashboard controller started"
        );

        Ok(DashboardHandle {
            state,
            shutdown: shutdown_tx,
            poll_task,
            forecast_task,
        })
    }
}

/// Handle returned from controller startup, used by render surfaces.
#[derive(Debug)]
pub struct DashboardHandle {
    state: SharedState,
    shutdown: broadcast::Sender<()>,
    poll_task: JoinHandle<()>,
    forecast_task: JoinHandle<()>,
}

impl DashboardHandle {
    /// Clone the current state for rendering. Projections are pure reads of
    /// this snapshot, so render surfaces never hold the lock across a draw.
    pub fn snapshot(&self) -> DashboardState {
        self.state.read().clone()
    }

    /// Stop the refresh loop: no new requests are issued and any in-flight
    /// resolution lands in a closed channel instead of the state object.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        if let Err(err) = self.poll_task.await {
            error!(error = %err, "poll loop join error");
        }
        if let Err(err) = self.forecast_task.await {
            error!(error = %err, "forecast task join error");
        }
        info!("dashboard controller shutdown complete");
        Ok(())
    }
}

async fn run_poll_loop(
    client: BackendClient,
    state: SharedState,
    interval: Duration,
    metrics: Option<DashboardMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // a slow backend delays ticks rather than bursting them afterwards
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<PollOutcome>();
    let mut gate = SequenceGate::default();
    let mut last_connection = ConnectionState::Initializing;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("poll loop shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let seq = gate.issue();
                let client = client.clone();
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    let result = client.fetch_sample().await;
                    // the receiver is gone once the loop stops; a late
                    // resolution then goes nowhere
                    let _ = outcome_tx.send(PollOutcome { seq, result });
                });
            }
            Some(outcome) = outcome_rx.recv() => {
                if !gate.admit(outcome.seq) {
                    debug!(seq = outcome.seq, "discarding stale poll response");
                    if let Some(metrics) = &metrics {
                        metrics.record_stale_discard();
                    }
                    continue;
                }

                let connection = match outcome.result {
                    Ok(sample) => {
                        debug!(
                            seq = outcome.seq,
                            watts = sample.total_consumption,
                            anomaly = sample.anomaly.is_anomaly,
                            "sample applied"
                        );
                        if let Some(metrics) = &metrics {
                            metrics.record_poll_success();
                        }
                        let mut state = state.write();
                        state.apply_sample(sample);
                        state.connection
                    }
                    Err(err) => {
                        warn!(seq = outcome.seq, error = %err, "telemetry poll failed");
                        if let Some(metrics) = &metrics {
                            metrics.record_poll_failure();
                        }
                        let mut state = state.write();
                        state.apply_poll_failure(err.to_string());
                        state.connection
                    }
                };

                if connection != last_connection {
                    info!(from = %last_connection, to = %connection, "connection state transition");
                    last_connection = connection;
                }
                if let Some(metrics) = &metrics {
                    metrics.set_connection_state(connection);
                }
            }
        }
    }
}

async fn load_forecast(
    client: BackendClient,
    state: SharedState,
    metrics: Option<DashboardMetrics>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::select! {
        _ = shutdown.recv() => {
            debug!("forecast load cancelled by shutdown");
        }
        result = client.fetch_forecast() => match result {
            Ok(points) => {
                let count = points.len();
                if state.write().load_forecast(points) {
                    info!(points = count, "forecast horizon loaded");
                } else {
                    debug!("forecast already loaded; ignoring repeat resolution");
                }
            }
            Err(err) => {
                // non-critical: the dashboard runs without a forecast panel
                // and must not report Degraded for it
                warn!(error = %err, "forecast load failed");
                if let Some(metrics) = &metrics {
                    metrics.record_forecast_failure();
                }
            }
        }
    }
}
