//! Error types shared across the facegate crates

use thiserror::Error;

/// Result type alias for facegate operations
pub type Result<T> = std::result::Result<T, FacegateError>;

/// Main error type for facegate
#[derive(Error, Debug)]
pub enum FacegateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recognizer error: {0}")]
    Recognizer(String),
}

impl FacegateError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a recognizer error
    pub fn recognizer(msg: impl Into<String>) -> Self {
        Self::Recognizer(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FacegateError::config("port must be > 0").to_string(),
            "Configuration error: port must be > 0"
        );
        assert_eq!(
            FacegateError::recognizer("exit status 1").to_string(),
            "Recognizer error: exit status 1"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "early eof");
        let err: FacegateError = io.into();
        assert!(matches!(err, FacegateError::Io(_)));
    }
}
