//! Configuration management
//!
//! Values come from `.env`, then the environment, then command-line
//! overrides applied by the binary. [`Config::validate`] runs last.

use facegate_common::{FacegateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Gateway Configuration Constants
// ============================================================================

/// Default bind host (all interfaces).
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default ceiling on concurrently running sessions.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Default time allowed for in-flight sessions after a shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Default number of extra attempts for a failed audit write.
pub const DEFAULT_AUDIT_WRITE_RETRIES: u32 = 2;

/// Upper bound on `max_connections` (the permit limit of the connection semaphore).
pub const MAX_CONNECTIONS_LIMIT: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Default largest accepted image (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u32 = 16 * 1024 * 1024;

/// Default deadline for receiving and recognizing one image.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// Default recognizer program.
pub const DEFAULT_RECOGNIZER_PROGRAM: &str = "python3";

/// Default recognizer arguments; the image path is appended after them.
pub const DEFAULT_RECOGNIZER_ARGS: &[&str] = &["recognize.py"];

/// Default recognizer deadline.
pub const DEFAULT_RECOGNIZER_TIMEOUT_SECS: u64 = 30;

/// Default longest identity label kept, in characters.
pub const DEFAULT_MAX_LABEL_LEN: usize = 127;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub recognizer: RecognizerConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
    pub shutdown_timeout_secs: u64,
}

/// Audit log store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub write_retries: u32,
}

/// Per-session limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Largest length prefix accepted before reading the payload
    pub max_payload_bytes: u32,
    /// Deadline covering payload receipt and recognition
    pub session_timeout_secs: u64,
    /// Directory holding the per-session image files
    pub spool_dir: PathBuf,
}

/// External recognizer invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub max_label_len: usize,
}

impl SessionConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

impl RecognizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %value, "Ignoring malformed setting, using default");
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    ///
    /// Port and database path are left unset (`0` and empty); the binary
    /// fills them from its required arguments.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: std::env::var("FACEGATE_HOST").unwrap_or(defaults.server.host),
                port: defaults.server.port,
                max_connections: env_or("FACEGATE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
                shutdown_timeout_secs: env_or(
                    "FACEGATE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                path: defaults.database.path,
                write_retries: env_or("FACEGATE_AUDIT_WRITE_RETRIES", DEFAULT_AUDIT_WRITE_RETRIES),
            },
            session: SessionConfig {
                max_payload_bytes: env_or("FACEGATE_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES),
                session_timeout_secs: env_or(
                    "FACEGATE_SESSION_TIMEOUT",
                    DEFAULT_SESSION_TIMEOUT_SECS,
                ),
                spool_dir: std::env::var("FACEGATE_SPOOL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.spool_dir),
            },
            recognizer: RecognizerConfig {
                program: std::env::var("FACEGATE_RECOGNIZER_PROGRAM")
                    .unwrap_or(defaults.recognizer.program),
                args: std::env::var("FACEGATE_RECOGNIZER_ARGS")
                    .map(|s| s.split_whitespace().map(str::to_string).collect())
                    .unwrap_or(defaults.recognizer.args),
                timeout_secs: env_or("FACEGATE_RECOGNIZER_TIMEOUT", DEFAULT_RECOGNIZER_TIMEOUT_SECS),
                max_label_len: env_or("FACEGATE_MAX_LABEL_LEN", DEFAULT_MAX_LABEL_LEN),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FacegateError::config("Server port must be greater than 0"));
        }

        if self.server.max_connections == 0 {
            return Err(FacegateError::config("max_connections must be greater than 0"));
        }

        if self.server.max_connections > MAX_CONNECTIONS_LIMIT {
            return Err(FacegateError::config(format!(
                "max_connections must not exceed {MAX_CONNECTIONS_LIMIT}"
            )));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(FacegateError::config("Database path cannot be empty"));
        }

        if self.session.max_payload_bytes == 0 {
            return Err(FacegateError::config("max_payload_bytes must be greater than 0"));
        }

        if self.session.session_timeout_secs == 0 {
            return Err(FacegateError::config("Session timeout must be greater than 0"));
        }

        if self.recognizer.program.trim().is_empty() {
            return Err(FacegateError::config("Recognizer program cannot be empty"));
        }

        if self.recognizer.timeout_secs == 0 {
            return Err(FacegateError::config("Recognizer timeout must be greater than 0"));
        }

        if self.recognizer.max_label_len == 0 {
            return Err(FacegateError::config("max_label_len must be greater than 0"));
        }

        if self.session.session_timeout_secs <= self.recognizer.timeout_secs {
            tracing::warn!(
                session_timeout_secs = self.session.session_timeout_secs,
                recognizer_timeout_secs = self.recognizer.timeout_secs,
                "Session timeout does not exceed recognizer timeout; slow recognitions will abort sessions without an audit record"
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: 0,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                path: PathBuf::new(),
                write_retries: DEFAULT_AUDIT_WRITE_RETRIES,
            },
            session: SessionConfig {
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
                spool_dir: std::env::temp_dir(),
            },
            recognizer: RecognizerConfig {
                program: DEFAULT_RECOGNIZER_PROGRAM.to_string(),
                args: DEFAULT_RECOGNIZER_ARGS.iter().map(|s| s.to_string()).collect(),
                timeout_secs: DEFAULT_RECOGNIZER_TIMEOUT_SECS,
                max_label_len: DEFAULT_MAX_LABEL_LEN,
            },
        }
    }
}
