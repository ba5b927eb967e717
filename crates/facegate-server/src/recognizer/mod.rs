//! Recognizer seam
//!
//! The face recognition capability is an opaque collaborator: handed the
//! location of a stored image, it yields an identity label or a failure.
//! Every way it can go wrong collapses into [`RecognitionResult::Failure`].

pub mod command;

pub use command::{parse_label, CommandRecognizer};

use async_trait::async_trait;
use std::path::Path;

/// Result of one recognition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    Success { label: String },
    Failure { reason: String },
}

impl RecognitionResult {
    pub fn success(label: impl Into<String>) -> Self {
        Self::Success {
            label: label.into(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Trait for recognizers (dependency injection)
///
/// Implementations must bound their own running time; sessions call this
/// without holding any shared lock.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the face in the image stored at `image`
    async fn recognize(&self, image: &Path) -> RecognitionResult;

    /// Short name for logs
    fn name(&self) -> &str;
}
