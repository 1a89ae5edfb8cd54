//! ---
//! wd_section: "06-view-projections"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Pure projections from dashboard state to view models."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
//! Chart and panel view models derived from an immutable state snapshot.
//! Everything here is a pure read: no projection mutates its input, and
//! empty inputs yield empty view models rather than errors, so the
//! functions are unit-testable without a rendering environment.

use chrono::{DateTime, Local, Utc};
use wattdash_telemetry::{AnomalyReading, Sample};

use crate::history::HistoryBuffer;
use crate::state::ForecastSnapshot;

/// How many history entries the consumption chart shows.
pub const CHART_WINDOW: usize = 20;

/// Axis labels on the forecast chart are shown every Nth point. The data
/// series always carries every point; thinning is presentation only.
pub const FORECAST_LABEL_STRIDE: usize = 5;

/// One labelled chart value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// The live consumption series: the last [`CHART_WINDOW`] samples (or
/// fewer), oldest first, labelled with local wall-clock time.
pub fn consumption_series(history: &HistoryBuffer) -> Vec<SeriesPoint> {
    history
        .tail(CHART_WINDOW)
        .map(|sample| SeriesPoint {
            label: clock_label(&sample.timestamp),
            value: sample.total_consumption,
        })
        .collect()
}

/// The forecast series: every point of the horizon, in received order.
pub fn forecast_series(forecast: &ForecastSnapshot) -> Vec<SeriesPoint> {
    forecast
        .points()
        .iter()
        .map(|point| SeriesPoint {
            label: hour_label(&point.timestamp),
            value: point.predicted_consumption,
        })
        .collect()
}

/// Presentation helper for forecast axes: the label to draw at `index`, or
/// `None` when the slot is thinned out.
pub fn axis_label(index: usize, point: &SeriesPoint) -> Option<&str> {
    (index % FORECAST_LABEL_STRIDE == 0).then_some(point.label.as_str())
}

fn clock_label(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn hour_label(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// One appliance row of the breakdown panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceRow {
    pub name: String,
    pub running: bool,
    pub power_draw: f64,
}

/// Appliance breakdown with aggregate counts.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliancePanel {
    pub rows: Vec<ApplianceRow>,
    pub running_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyStatus {
    Alert,
    Safe,
}

impl AnomalyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyStatus::Alert => "ALERT",
            AnomalyStatus::Safe => "SAFE",
        }
    }
}

/// Anomaly panel view model.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyPanel {
    pub status: AnomalyStatus,
    pub message: String,
    /// Z-score deviation rendered with exactly two decimal places.
    pub deviation_display: String,
}

/// What the panels render: either an explicit "no data yet" splash or the
/// derived views of the current sample.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Waiting,
    Ready {
        appliances: AppliancePanel,
        anomaly: AnomalyPanel,
    },
}

pub fn panel_view(current: Option<&Sample>) -> PanelView {
    match current {
        None => PanelView::Waiting,
        Some(sample) => PanelView::Ready {
            appliances: appliance_panel(sample),
            anomaly: anomaly_panel(&sample.anomaly),
        },
    }
}

pub fn appliance_panel(sample: &Sample) -> AppliancePanel {
    let rows: Vec<ApplianceRow> = sample
        .appliances
        .iter()
        .map(|appliance| ApplianceRow {
            name: appliance.name.clone(),
            running: appliance.is_running,
            power_draw: appliance.power_draw,
        })
        .collect();
    let running_count = rows.iter().filter(|row| row.running).count();
    let total_count = rows.len();
    AppliancePanel {
        rows,
        running_count,
        total_count,
    }
}

pub fn anomaly_panel(reading: &AnomalyReading) -> AnomalyPanel {
    let status = if reading.is_anomaly {
        AnomalyStatus::Alert
    } else {
        AnomalyStatus::Safe
    };
    AnomalyPanel {
        status,
        message: reading.message.clone(),
        deviation_display: format!("{:.2}", reading.deviation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample;

    use chrono::{TimeZone, Utc};
    use wattdash_telemetry::ForecastPoint;

    #[test]
    fn empty_inputs_yield_empty_series() {
        assert!(consumption_series(&HistoryBuffer::new()).is_empty());
        assert!(forecast_series(&ForecastSnapshot::default()).is_empty());
    }

    #[test]
    fn consumption_series_shows_the_last_twenty_samples() {
        let mut history = HistoryBuffer::new();
        for n in 1..=25 {
            history = history.append(sample(n));
        }
        let series = consumption_series(&history);
        assert_eq!(series.len(), CHART_WINDOW);
        assert_eq!(series[0].value, 1_006.0);
        assert_eq!(series[19].value, 1_025.0);
        let expected_label = sample(6)
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();
        assert_eq!(series[0].label, expected_label);
    }

    #[test]
    fn forecast_series_keeps_every_point_and_thins_labels_only() {
        let points: Vec<ForecastPoint> = (0..24)
            .map(|hour| ForecastPoint {
                timestamp: Utc.with_ymd_and_hms(2026, 8, 8, hour, 0, 0).unwrap(),
                predicted_consumption: f64::from(hour) * 10.0,
            })
            .collect();
        let mut snapshot = ForecastSnapshot::default();
        assert!(snapshot.load(points));

        let series = forecast_series(&snapshot);
        assert_eq!(series.len(), 24);
        let drawn: Vec<usize> = series
            .iter()
            .enumerate()
            .filter_map(|(index, point)| axis_label(index, point).map(|_| index))
            .collect();
        assert_eq!(drawn, vec![0, 5, 10, 15, 20]);
    }

    #[test]
    fn panel_view_is_waiting_without_a_sample() {
        assert_eq!(panel_view(None), PanelView::Waiting);
    }

    #[test]
    fn appliance_panel_counts_running_rows() {
        let panel = appliance_panel(&sample(1));
        assert_eq!(panel.total_count, 2);
        assert_eq!(panel.running_count, 1);
        assert_eq!(panel.rows[0].name, "Refrigerator");
        assert!(panel.rows[0].running);
        assert!(!panel.rows[1].running);
    }

    #[test]
    fn alert_iff_the_reading_is_anomalous() {
        let mut reading = sample(1).anomaly;
        reading.is_anomaly = true;
        reading.deviation = 3.14159;
        reading.message = "Spike detected".to_owned();
        let panel = anomaly_panel(&reading);
        assert_eq!(panel.status, AnomalyStatus::Alert);
        assert_eq!(panel.message, "Spike detected");
        assert_eq!(panel.deviation_display, "3.14");

        reading.is_anomaly = false;
        assert_eq!(anomaly_panel(&reading).status, AnomalyStatus::Safe);
    }

    #[test]
    fn deviation_display_always_has_two_decimals() {
        let mut reading = sample(1).anomaly;
        for (deviation, expected) in [(0.0, "0.00"), (2.0, "2.00"), (-0.5, "-0.50"), (10.987, "10.99")]
        {
            reading.deviation = deviation;
            assert_eq!(anomaly_panel(&reading).deviation_display, expected);
        }
    }
}
