//! ---
//! wd_section: "03-metrics-logging"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Prometheus instrumentation for the poll loop."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::Result;
use prometheus::{IntCounter, IntGaugeVec, Opts, Registry};

use crate::connection::ConnectionState;

/// Shared registry type used across workspace members.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Counters and gauges describing the health of the refresh loop.
///
/// Instrumentation is optional throughout the controller: constructing this
/// requires a registry, and `None` disables recording entirely.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    polls_total: IntCounter,
    poll_failures_total: IntCounter,
    stale_responses_total: IntCounter,
    forecast_load_failures_total: IntCounter,
    connection_state: IntGaugeVec,
}

impl DashboardMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let polls_total = IntCounter::with_opts(Opts::new(
            "wattdash_polls_total",
            "Telemetry poll resolutions applied to the dashboard state",
        ))?;
        let poll_failures_total = IntCounter::with_opts(Opts::new(
            "wattdash_poll_failures_total",
            "Telemetry polls that resolved with a transient fetch error",
        ))?;
        let stale_responses_total = IntCounter::with_opts(Opts::new(
            "wattdash_stale_responses_total",
            "Poll resolutions discarded by the sequence gate",
        ))?;
        let forecast_load_failures_total = IntCounter::with_opts(Opts::new(
            "wattdash_forecast_load_failures_total",
            "Failed attempts to load the one-shot forecast horizon",
        ))?;
        let connection_state = IntGaugeVec::new(
            Opts::new(
                "wattdash_connection_state",
                "Connection-health machine state (1 for the active state)",
            ),
            &["state"],
        )?;

        registry.register(Box::new(polls_total.clone()))?;
        registry.register(Box::new(poll_failures_total.clone()))?;
        registry.register(Box::new(stale_responses_total.clone()))?;
        registry.register(Box::new(forecast_load_failures_total.clone()))?;
        registry.register(Box::new(connection_state.clone()))?;

        Ok(Self {
            polls_total,
            poll_failures_total,
            stale_responses_total,
            forecast_load_failures_total,
            connection_state,
        })
    }

    pub fn record_poll_success(&self) {
        self.polls_total.inc();
    }

    pub fn record_poll_failure(&self) {
        self.polls_total.inc();
        self.poll_failures_total.inc();
    }

    pub fn record_stale_discard(&self) {
        self.stale_responses_total.inc();
    }

    pub fn record_forecast_failure(&self) {
        self.forecast_load_failures_total.inc();
    }

    pub fn set_connection_state(&self, current: ConnectionState) {
        for state in ConnectionState::ALL {
            self.connection_state
                .with_label_values(&[state.as_str()])
                .set(i64::from(state == current));
        }
    }
}
