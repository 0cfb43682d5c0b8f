//! Application settings module for loading runtime configuration from environment variables.
//!
//! Every setting has a default so the server starts with no `.env` file at all. Values are
//! read once at start-up into an [`AppConfig`] that is passed to the pieces that need it.

use crate::errors::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Default `SQLite` database location, created on first start.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/coffee_orders.sqlite?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MENU_PATH: &str = "menu.toml";

/// Runtime settings for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database connection URL (`DATABASE_URL`)
    pub database_url: String,
    /// Interface to listen on (`BIND_ADDRESS`)
    pub bind_address: String,
    /// Port to listen on (`PORT`)
    pub port: u16,
    /// Menu seed file (`MENU_PATH`)
    pub menu_path: PathBuf,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if `PORT` is set but is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(port) => port.trim().parse().map_err(|e| Error::Config {
                message: format!("Invalid PORT '{port}': {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port,
            menu_path: get("MENU_PATH").map_or_else(|| PathBuf::from(DEFAULT_MENU_PATH), PathBuf::from),
        })
    }

    /// The `host:port` string the server binds to.
    #[must_use]
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Loads the application configuration and logs the effective settings.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config = AppConfig::from_env()?;
    info!(
        database_url = %config.database_url,
        address = %config.socket_address(),
        menu = %config.menu_path.display(),
        "Loaded application configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.socket_address(), "0.0.0.0:8000");
        assert_eq!(config.menu_path, PathBuf::from("menu.toml"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDRESS", "127.0.0.1"),
            ("PORT", "3000"),
            ("MENU_PATH", "/etc/coffee/menu.toml"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.socket_address(), "127.0.0.1:3000");
        assert_eq!(config.menu_path, PathBuf::from("/etc/coffee/menu.toml"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("PORT", ""), ("DATABASE_URL", " ")])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
