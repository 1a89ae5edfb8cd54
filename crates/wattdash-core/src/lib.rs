//! ---
//! wd_section: "01-core-functionality"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Dashboard state synchronisation core."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
//! The data-synchronisation core of the WattDash client: the polling loop
//! and its ordering guarantee, the bounded history buffer, the one-shot
//! forecast snapshot, the connection-health machine, and the pure
//! projections that turn raw samples into chart- and panel-ready view data.
//!
//! Rendering surfaces consume [`DashboardHandle::snapshot`] plus the
//! [`projection`] functions and nothing else.

pub mod connection;
pub mod controller;
pub mod history;
pub mod metrics;
pub mod poller;
pub mod projection;
pub mod state;

pub use connection::ConnectionState;
pub use controller::{DashboardController, DashboardHandle, SharedState};
pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use metrics::{new_registry, DashboardMetrics, SharedRegistry};
pub use poller::SequenceGate;
pub use projection::{
    anomaly_panel, appliance_panel, axis_label, consumption_series, forecast_series, panel_view,
    AnomalyPanel, AnomalyStatus, AppliancePanel, ApplianceRow, PanelView, SeriesPoint,
    CHART_WINDOW, FORECAST_LABEL_STRIDE,
};
pub use state::{DashboardState, ForecastSnapshot};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use wattdash_telemetry::{AnomalyReading, Appliance, Sample};

    /// Deterministic sample `n` of a poll sequence: distinct increasing
    /// timestamps and a recognisable consumption value.
    pub fn sample(n: u32) -> Sample {
        let timestamp = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
            + Duration::seconds(i64::from(n) * 2);
        Sample {
            timestamp,
            total_consumption: 1_000.0 + f64::from(n),
            appliances: vec![
                Appliance {
                    name: "Refrigerator".to_owned(),
                    is_running: true,
                    power_draw: 150.0,
                },
                Appliance {
                    name: "EV Charger".to_owned(),
                    is_running: false,
                    power_draw: 0.0,
                },
            ],
            anomaly: AnomalyReading {
                timestamp,
                value: 1_000.0 + f64::from(n),
                is_anomaly: false,
                deviation: 0.1,
                message: "Normal".to_owned(),
            },
        }
    }
}
