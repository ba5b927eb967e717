//! Access log record types

use crate::decision::{AccessDecision, AccessStatus};
use chrono::{DateTime, Local};
use std::net::IpAddr;

/// Persisted timestamp format (server local time, second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way it is stored
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// A record about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditRecord {
    pub timestamp: String,
    pub client_ip: String,
    pub user: String,
    pub status: AccessStatus,
}

impl NewAuditRecord {
    /// Build a record for a decision made now
    pub fn new(client_ip: IpAddr, decision: &AccessDecision) -> Self {
        Self::at(Local::now(), client_ip, decision)
    }

    pub fn at(at: DateTime<Local>, client_ip: IpAddr, decision: &AccessDecision) -> Self {
        Self {
            timestamp: format_timestamp(at),
            client_ip: client_ip.to_string(),
            user: decision.label.clone(),
            status: decision.status,
        }
    }
}

/// A stored access event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: String,
    pub client_ip: String,
    pub user: String,
    pub status: AccessStatus,
}
