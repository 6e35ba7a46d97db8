//! Runtime settings, read from an optional `config.toml` next to the binary and from the
//! environment.
//!
//! `DUTY_`-prefixed variables override the file (e.g. `DUTY_LOG_LEVEL=debug`), and
//! `DATABASE_URL` (also read from `.env`) overrides the database location.

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

/// Where the database lives when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "duty_roster.db";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Path of the SQLite database, or `:memory:`.
    pub database_url: String,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from `config.toml` (if present), the environment, and `.env`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("log_level", defaults.log_level)?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("DUTY"))
            .set_override_option("database_url", env::var("DATABASE_URL").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
