//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend
//! - `ZYPSO_BACKEND` - `firestore` (default) or `memory`
//! - `FIREBASE_PROJECT_ID`, `FIREBASE_API_KEY` - required for `firestore`
//! - `FIREBASE_POLL_INTERVAL_MS` - live query poll interval (default: 2000)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `SHOP_UTC_OFFSET_MINUTES` - Shop time zone offset (default: 330, IST)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE` - 0.0 to 1.0 (default: 1.0)
//!
//! The dashboard has no login of its own. Keep it on a private address.

use std::net::{IpAddr, SocketAddr};

use zypso_core::format::{DEFAULT_UTC_OFFSET_MINUTES, ShopClock};
use zypso_firebase::BackendConfig;
use zypso_firebase::config::{ConfigError, get_optional_env, parse_env_or_default};

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shop-local time zone for the date filter and order dates
    pub clock: ShopClock,
    /// Document store backend
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables are invalid or the Firebase
    /// settings fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("ADMIN_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ADMIN_PORT", "3001")?;
        let offset_minutes = parse_env_or_default::<i32>(
            "SHOP_UTC_OFFSET_MINUTES",
            &DEFAULT_UTC_OFFSET_MINUTES.to_string(),
        )?;

        if !host.is_loopback() {
            tracing::warn!(%host, "Admin bound to a non-loopback address; it has no login");
        }

        Ok(Self {
            host,
            port,
            clock: ShopClock::from_offset_minutes(offset_minutes),
            backend: BackendConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Configuration for a process-local store, used by tests and demos.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            clock: ShopClock::default(),
            backend: BackendConfig::Memory,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_binds_loopback() {
        let config = AdminConfig::memory();
        assert!(config.socket_addr().ip().is_loopback());
        assert_eq!(config.socket_addr().port(), 3001);
        assert_eq!(config.backend.name(), "memory");
    }
}
