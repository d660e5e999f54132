//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `ZYPSO_BACKEND` - `firestore` (default) or `memory`
//!
//! ## Required for `firestore`
//! - `FIREBASE_PROJECT_ID` - Firebase project ID
//! - `FIREBASE_API_KEY` - Web API key (placeholder and entropy checked)
//!
//! ## Optional
//! - `FIREBASE_POLL_INTERVAL_MS` - Live query poll interval (default: 2000)
//! - `FIRESTORE_EMULATOR_HOST` - `host:port` of a Firestore emulator
//! - `FIREBASE_AUTH_EMULATOR_HOST` - `host:port` of an Auth emulator

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::auth::AuthProvider;
use crate::firestore::{self, FirestoreClient, PollConfig};
use crate::identity::{self, IdentityClient};
use crate::memory::MemoryBackend;
use crate::store::DocumentStore;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Firebase project settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FirebaseConfig {
    /// Firebase project ID
    pub project_id: String,
    /// Web API key
    pub api_key: SecretString,
    /// Live query polling
    pub poll: PollConfig,
    /// `host:port` of a Firestore emulator
    pub firestore_emulator: Option<String>,
    /// `host:port` of an Auth emulator
    pub auth_emulator: Option<String>,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("poll", &self.poll)
            .field("firestore_emulator", &self.firestore_emulator)
            .field("auth_emulator", &self.auth_emulator)
            .finish()
    }
}

impl FirebaseConfig {
    /// Load the Firebase settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let firestore_emulator = get_optional_env("FIRESTORE_EMULATOR_HOST");
        let auth_emulator = get_optional_env("FIREBASE_AUTH_EMULATOR_HOST");

        let project_id = get_required_env("FIREBASE_PROJECT_ID")?;
        // Emulators accept any key.
        let api_key = if firestore_emulator.is_some() || auth_emulator.is_some() {
            SecretString::from(get_env_or_default("FIREBASE_API_KEY", "emulator"))
        } else {
            get_validated_secret("FIREBASE_API_KEY")?
        };

        let interval_ms = get_env_or_default("FIREBASE_POLL_INTERVAL_MS", "2000")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FIREBASE_POLL_INTERVAL_MS".to_string(), e.to_string())
            })?;
        if interval_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "FIREBASE_POLL_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            project_id,
            api_key,
            poll: PollConfig {
                interval: Duration::from_millis(interval_ms),
                ..PollConfig::default()
            },
            firestore_emulator,
            auth_emulator,
        })
    }

    /// Build the Firestore client.
    #[must_use]
    pub fn firestore(&self) -> FirestoreClient {
        let base_url = self.firestore_emulator.as_ref().map_or_else(
            || firestore::DEFAULT_BASE_URL.to_string(),
            |host| format!("http://{host}/v1"),
        );
        FirestoreClient::with_base_url(
            base_url,
            self.project_id.clone(),
            self.api_key.clone(),
            self.poll,
        )
    }

    /// Build the Identity Toolkit client.
    #[must_use]
    pub fn identity(&self) -> IdentityClient {
        match &self.auth_emulator {
            Some(host) => IdentityClient::with_urls(
                format!("http://{host}/identitytoolkit.googleapis.com/v1"),
                format!("http://{host}/securetoken.googleapis.com/v1"),
                self.api_key.clone(),
            ),
            None => IdentityClient::with_urls(
                identity::IDENTITY_TOOLKIT_URL,
                identity::SECURE_TOKEN_URL,
                self.api_key.clone(),
            ),
        }
    }
}

/// Which backend the binaries talk to.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Cloud Firestore and Identity Toolkit.
    Firestore(FirebaseConfig),
    /// Process-local store, for development and demos.
    Memory,
}

impl BackendConfig {
    /// Load from `ZYPSO_BACKEND` and, for Firestore, the `FIREBASE_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown backend name or invalid
    /// Firebase settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("ZYPSO_BACKEND", "firestore")
            .to_lowercase()
            .as_str()
        {
            "firestore" => Ok(Self::Firestore(FirebaseConfig::from_env()?)),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "ZYPSO_BACKEND".to_string(),
                format!("expected 'firestore' or 'memory', got '{other}'"),
            )),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "firestore",
            Self::Memory => "memory",
        }
    }

    /// Create the store and auth clients.
    #[must_use]
    pub fn connect(&self) -> Backend {
        match self {
            Self::Firestore(config) => Backend {
                store: Arc::new(config.firestore()),
                auth: Arc::new(config.identity()),
            },
            Self::Memory => Backend::memory(MemoryBackend::new()),
        }
    }
}

/// Connected store and auth clients.
#[derive(Debug, Clone)]
pub struct Backend {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    /// Use one memory backend for both seams.
    #[must_use]
    pub fn memory(backend: MemoryBackend) -> Self {
        Self {
            store: Arc::new(backend.clone()),
            auth: Arc::new(backend),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the variable is unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are random; low entropy means a hand-typed value.
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing or fails validation.
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
