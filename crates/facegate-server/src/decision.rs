//! Decision policy
//!
//! The only authorization gate: a recognized identity is let in, anything
//! else is turned away under the unknown-identity label.

pub use crate::recognizer::RecognitionResult;

/// Label reported and persisted when no identity was recognized
pub const UNKNOWN_LABEL: &str = "unknown";

/// Access decision status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Allowed,
    Denied,
}

impl AccessStatus {
    /// Wire and storage token
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Allowed => "ALLOWED",
            AccessStatus::Denied => "DENIED",
        }
    }
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AccessStatus {
    /// Parse a persisted status token
    ///
    /// Logs written by earlier gateway deployments use `PERMITIDO` and
    /// `NEGADO`; both read back as their current equivalents.
    pub fn from_stored(token: &str) -> Option<Self> {
        match token {
            "ALLOWED" | "PERMITIDO" => Some(AccessStatus::Allowed),
            "DENIED" | "NEGADO" => Some(AccessStatus::Denied),
            _ => None,
        }
    }
}

/// Outcome of one access attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub status: AccessStatus,
    pub label: String,
}

/// Map a recognition outcome to an access decision
pub fn decide(result: RecognitionResult) -> AccessDecision {
    match result {
        RecognitionResult::Success { label } => AccessDecision {
            status: AccessStatus::Allowed,
            label,
        },
        RecognitionResult::Failure { .. } => AccessDecision {
            status: AccessStatus::Denied,
            label: UNKNOWN_LABEL.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_allowed_with_label() {
        let decision = decide(RecognitionResult::success("alice"));
        assert_eq!(decision.status, AccessStatus::Allowed);
        assert_eq!(decision.label, "alice");
    }

    #[test]
    fn test_failure_is_denied_unknown() {
        for reason in ["exit status 1", "timed out after 30s", "empty output"] {
            let decision = decide(RecognitionResult::failure(reason));
            assert_eq!(decision.status, AccessStatus::Denied);
            assert_eq!(decision.label, UNKNOWN_LABEL);
        }
    }

    #[test]
    fn test_status_tokens_round_trip() {
        for status in [AccessStatus::Allowed, AccessStatus::Denied] {
            assert_eq!(AccessStatus::from_stored(status.as_str()), Some(status));
        }
        assert_eq!(AccessStatus::from_stored("PERMITIDO"), Some(AccessStatus::Allowed));
        assert_eq!(AccessStatus::from_stored("NEGADO"), Some(AccessStatus::Denied));
        assert_eq!(AccessStatus::from_stored("allowed"), None);
    }
}
