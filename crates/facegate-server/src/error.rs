//! Server-specific error types

use thiserror::Error;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors raised by the gateway outside of a single session's business flow
///
/// Recognition failures never appear here: they are a normal outcome that
/// the decision policy turns into a DENIED response.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit database error: {0}")]
    Audit(#[from] rusqlite::Error),

    #[error("Audit task failed: {0}")]
    AuditTask(String),

    #[error(transparent)]
    Common(#[from] facegate_common::FacegateError),
}

impl ServerError {
    /// Create an audit task error
    pub fn audit_task(msg: impl Into<String>) -> Self {
        Self::AuditTask(msg.into())
    }
}
