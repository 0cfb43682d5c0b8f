/// Application settings read from environment variables
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Menu seed configuration loading from menu.toml
pub mod menu;

pub use app::{AppConfig, load_app_configuration};
