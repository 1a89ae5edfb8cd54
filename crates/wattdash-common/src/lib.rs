//! ---
//! wd_section: "04-configuration"
//! wd_subsection: "module"
//! wd_type: "source"
//! wd_scope: "code"
//! wd_description: "Shared configuration and logging primitives."
//! wd_version: "v0.1.0"
//! wd_owner: "tbd"
//! ---
//! Shared primitives for the WattDash workspace: configuration loading with
//! environment overrides, and tracing initialisation for both the headless
//! and terminal-UI members.

pub mod config;
pub mod logging;

pub use config::{BackendConfig, DashboardConfig, LoggingConfig, UiConfig};
pub use logging::{init_file_tracing, init_tracing, LogFormat};
