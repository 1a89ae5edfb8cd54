//! ---
//! wd_section: "04-configuration"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Dashboard configuration loading and validation."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;

fn default_base_url() -> Url {
    "http://localhost:8000"
        .parse()
        .expect("valid default backend url")
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(2_000)
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(5_000)
}

fn default_ui_tick_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the dashboard client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`DashboardConfig`] was loaded from.
/// `source` is `None` when the built-in defaults were used.
#[derive(Debug, Clone)]
pub struct LoadedDashboardConfig {
    pub config: DashboardConfig,
    pub source: Option<PathBuf>,
}

impl DashboardConfig {
    pub const ENV_CONFIG_PATH: &'static str = "WATTDASH_CONFIG";

    /// Load configuration from disk, respecting the `WATTDASH_CONFIG`
    /// override. A dashboard client must come up unconfigured, so when no
    /// candidate exists the built-in defaults are returned rather than an
    /// error.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedDashboardConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedDashboardConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedDashboardConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found; using built-in defaults");
        Ok(LoadedDashboardConfig {
            config: Self::default(),
            source: None,
        })
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<DashboardConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.backend.validate()?;
        self.ui.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for DashboardConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: DashboardConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Backend endpoint settings. `base_url` is the single deployable knob: the
/// address everything else is resolved against.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "backend base_url must be http or https, got '{}'",
                    other
                ))
            }
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("backend poll_interval must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("backend request_timeout must be non-zero"));
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Terminal UI settings; redraw cadence only, never data cadence.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_ui_tick_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
}

impl UiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(anyhow!("ui tick_interval must be non-zero"));
        }
        Ok(())
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_ui_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = DashboardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.backend.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.backend.poll_interval, Duration::from_millis(2_000));
    }

    #[test]
    fn parses_interval_overrides_from_toml() {
        let config: DashboardConfig = r#"
            [backend]
            base_url = "https://energy.example.net"
            poll_interval = 500

            [ui]
            tick_interval = 100
        "#
        .parse()
        .unwrap();
        assert_eq!(config.backend.base_url.host_str(), Some("energy.example.net"));
        assert_eq!(config.backend.poll_interval, Duration::from_millis(500));
        assert_eq!(config.ui.tick_interval, Duration::from_millis(100));
        // untouched section keeps its defaults
        assert_eq!(config.backend.request_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let parsed = r#"
            [backend]
            base_url = "ftp://energy.example.net"
        "#
        .parse::<DashboardConfig>();
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let parsed = r#"
            [backend]
            poll_interval = 0
        "#
        .parse::<DashboardConfig>();
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_candidates_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("wattdash.toml");
        let loaded = DashboardConfig::load_with_source(&[missing]).unwrap();
        assert!(loaded.source.is_none());
        loaded.config.validate().unwrap();
    }
}
