//! ---
//! wd_section: "02-telemetry-data-model"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Wire schema for the analytics backend endpoints."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
//! Typed representations of the two payloads the analytics backend serves:
//! the combined analysis sample (`POST /api/analyze`) and the 24-hour
//! forecast (`GET /api/forecast`). The backend is external; these types are
//! the client side of that contract and nothing more.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One combined telemetry reading returned by the analysis endpoint.
///
/// Immutable once received; every poll produces a fresh `Sample`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "wall_clock")]
    pub timestamp: DateTime<Utc>,
    /// Aggregate household draw in watts.
    pub total_consumption: f64,
    /// Per-appliance disaggregation, in backend order. Names are unique
    /// within a sample.
    #[serde(rename = "nilm")]
    pub appliances: Vec<Appliance>,
    pub anomaly: AnomalyReading,
}

/// A single disaggregated appliance estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appliance {
    pub name: String,
    pub is_running: bool,
    /// Estimated draw in watts; zero when the appliance is off.
    pub power_draw: f64,
}

/// Anomaly verdict attached to every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReading {
    #[serde(with = "wall_clock")]
    pub timestamp: DateTime<Utc>,
    /// The consumption value the verdict was computed for.
    pub value: f64,
    pub is_anomaly: bool,
    /// Z-score distance from the expected baseline.
    pub deviation: f64,
    pub message: String,
}

/// One predicted point in the 24-hour forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(with = "wall_clock")]
    pub timestamp: DateTime<Utc>,
    pub predicted_consumption: f64,
}

/// Envelope of the forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecast: Vec<ForecastPoint>,
}

/// Parse a backend wall-clock string into UTC.
///
/// The reference backend serialises naive local datetimes without an
/// offset, while deployments behind a gateway re-emit RFC 3339 with one.
/// Naive timestamps are interpreted as UTC; the dashboard only ever
/// formats them back into local clock labels.
pub fn parse_wall_clock(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
}

mod wall_clock {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_clock(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn decodes_analysis_payload_with_naive_timestamps() {
        let raw = r#"{
            "timestamp": "2026-08-07T18:30:12.482113",
            "total_consumption": 2650,
            "nilm": [
                {"name": "AC", "is_running": true, "power_draw": 2000},
                {"name": "Lights", "is_running": false, "power_draw": 0}
            ],
            "anomaly": {
                "timestamp": "2026-08-07T18:30:12.482201",
                "value": 2650,
                "is_anomaly": false,
                "deviation": 0.42,
                "message": "Normal"
            }
        }"#;
        let sample: Sample = serde_json::from_str(raw).unwrap();
        assert_eq!(sample.total_consumption, 2650.0);
        assert_eq!(sample.appliances.len(), 2);
        assert_eq!(sample.appliances[0].name, "AC");
        assert!(sample.appliances[0].is_running);
        assert!(!sample.anomaly.is_anomaly);
        assert_eq!(sample.timestamp.hour(), 18);
    }

    #[test]
    fn decodes_rfc3339_timestamps() {
        let ts = parse_wall_clock("2026-08-07T18:30:12.482113+02:00").unwrap();
        assert_eq!(ts.hour(), 16);
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        assert!(parse_wall_clock("yesterday-ish").is_err());
        let raw = r#"{"timestamp": "not-a-time", "predicted_consumption": 1.0}"#;
        assert!(serde_json::from_str::<ForecastPoint>(raw).is_err());
    }

    #[test]
    fn forecast_envelope_defaults_to_empty() {
        let decoded: ForecastResponse = serde_json::from_str(r#"{"forecast": []}"#).unwrap();
        assert!(decoded.forecast.is_empty());
        let missing: ForecastResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.forecast.is_empty());
    }
}
