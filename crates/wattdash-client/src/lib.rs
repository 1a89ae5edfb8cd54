//! ---
//! wd_section: "05-networking-backend-client"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "HTTP client for the analytics backend endpoints."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
//! The analytics backend exposes exactly two endpoints: a combined analysis
//! sample behind `POST /api/analyze` and a one-shot forecast behind
//! `GET /api/forecast`. Every failure here is transient by contract: the
//! poll loop retries forever and the caller decides what the user sees.

use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;
use url::Url;
use wattdash_common::config::BackendConfig;
use wattdash_telemetry::{ForecastPoint, ForecastResponse, Sample};

const ANALYZE_PATH: &str = "/api/analyze";
const FORECAST_PATH: &str = "/api/forecast";

/// Transient fetch failure on either endpoint.
///
/// The `Display` text doubles as the user-facing `last_error` message, so
/// variants read as sentences rather than debug dumps.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("backend connection failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned HTTP {status}")]
    Status { status: u16 },
    #[error("backend sent a malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for the two analytics endpoints.
///
/// Cheap to clone; every poll dispatch gets its own handle.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Build a client from backend configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to construct backend http client")?;
        Ok(Self { http, base_url })
    }

    /// The configured backend address.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request one combined analysis sample.
    pub async fn fetch_sample(&self) -> Result<Sample, FetchError> {
        let url = self.endpoint(ANALYZE_PATH);
        debug!(url = %url, "requesting analysis sample");
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        decode(response).await
    }

    /// Request the 24-hour forecast horizon.
    pub async fn fetch_forecast(&self) -> Result<Vec<ForecastPoint>, FetchError> {
        let url = self.endpoint(FORECAST_PATH);
        debug!(url = %url, "requesting forecast");
        let response = self.http.get(url).send().await?;
        let envelope: ForecastResponse = decode(response).await?;
        Ok(envelope.forecast)
    }

    fn endpoint(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .expect("endpoint paths are statically valid")
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }
    // Read the body first so a JSON mismatch surfaces as Decode, not as a
    // generic transport error.
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(base.parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_resolve_against_the_base_address() {
        let client = client("http://energy.example.net:8000");
        assert_eq!(
            client.endpoint(ANALYZE_PATH).as_str(),
            "http://energy.example.net:8000/api/analyze"
        );
        assert_eq!(
            client.endpoint(FORECAST_PATH).as_str(),
            "http://energy.example.net:8000/api/forecast"
        );
    }

    #[test]
    fn fetch_errors_read_as_sentences() {
        let status = FetchError::Status { status: 503 };
        assert_eq!(status.to_string(), "backend returned HTTP 503");

        let decode = FetchError::from(serde_json::from_str::<Sample>("{").unwrap_err());
        assert!(decode.to_string().starts_with("backend sent a malformed payload"));
    }
}
