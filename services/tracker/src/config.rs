//! Service configuration loaded from `TRACKER_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::session::SessionConfig;

const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Where users, categories and expenses live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL, configured through `DATABASE_*` variables
    Postgres,
    /// Process memory; everything is lost on restart
    Memory,
}

/// Tracker service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Secret used to sign session cookies
    pub secret_key: String,
    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,
    /// Send cookies with the `Secure` attribute
    pub secure_cookies: bool,
    pub storage: StorageBackend,
    /// TrueType font for chart labels
    pub chart_font_path: String,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TRACKER_BIND_ADDRESS`: listen address (default: "0.0.0.0:3000")
    /// - `TRACKER_SECRET_KEY`: cookie signing secret (required)
    /// - `TRACKER_SESSION_TTL_SECONDS`: session lifetime (default: 86400)
    /// - `TRACKER_SECURE_COOKIES`: mark cookies `Secure` (default: false)
    /// - `TRACKER_STORAGE`: `postgres` or `memory` (default: postgres)
    /// - `TRACKER_CHART_FONT_PATH`: font for chart labels (default: DejaVu Sans)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_seconds", 86_400_i64)?
            .set_default("secure_cookies", false)?
            .set_default("storage", "postgres")?
            .set_default("chart_font_path", DEFAULT_FONT_PATH)?
            .add_source(Environment::with_prefix("TRACKER"))
            .build()?
            .try_deserialize()?;

        if config.secret_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "TRACKER_SECRET_KEY must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            secret_key: self.secret_key.clone(),
            ttl_seconds: self.session_ttl_seconds,
            secure_cookies: self.secure_cookies,
        }
    }
}
