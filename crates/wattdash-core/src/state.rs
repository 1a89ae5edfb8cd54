//! ---
//! wd_section: "01-core-functionality"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Observable dashboard state and its poll-outcome reducers."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use wattdash_telemetry::{ForecastPoint, Sample};

use crate::connection::ConnectionState;
use crate::history::HistoryBuffer;

/// Forecast horizon, set at most once per controller lifetime.
///
/// `is_loaded` distinguishes "backend answered with an empty horizon" from
/// "never answered". Both render an empty series, but only the latter is a
/// diagnostic condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSnapshot {
    points: Vec<ForecastPoint>,
    loaded: bool,
}

impl ForecastSnapshot {
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Store the horizon. Returns `false` (and changes nothing) when a
    /// horizon was already stored.
    pub fn load(&mut self, points: Vec<ForecastPoint>) -> bool {
        if self.loaded {
            return false;
        }
        self.points = points;
        self.loaded = true;
        true
    }
}

/// The single observable state object owned by the controller.
///
/// `current` always holds the most recent *successfully* received sample;
/// a failed poll never overwrites it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub current: Option<Sample>,
    pub history: HistoryBuffer,
    pub forecast: ForecastSnapshot,
    pub last_error: Option<String>,
    pub connection: ConnectionState,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a successfully decoded sample: advance `current`, append to
    /// history, clear the error line, go Live.
    pub fn apply_sample(&mut self, sample: Sample) {
        self.history = self.history.append(sample.clone());
        self.current = Some(sample);
        self.last_error = None;
        self.connection = self.connection.on_poll_success();
    }

    /// Record a failed poll: `current` and `history` are untouched so the
    /// last-good view survives; staleness is surfaced via `connection`.
    pub fn apply_poll_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.connection = self.connection.on_poll_failure();
    }

    /// Store the forecast horizon; a repeat load is a no-op (see
    /// [`ForecastSnapshot::load`]). Forecast availability never touches
    /// `last_error` or `connection`.
    pub fn load_forecast(&mut self, points: Vec<ForecastPoint>) -> bool {
        self.forecast.load(points)
    }
}
