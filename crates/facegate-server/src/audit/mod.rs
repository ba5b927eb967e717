//! Access audit trail
//!
//! Exactly one record per fully received image, written after the decision
//! is made. Records are never updated or deleted.

pub mod schema;
pub mod store;
pub mod types;

pub use store::{AuditStore, SqliteAuditStore};
pub use types::{AuditRecord, NewAuditRecord, TIMESTAMP_FORMAT};

use crate::error::ServerResult;
use std::time::Duration;
use tracing::warn;

/// Pause between attempts of a failed write
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Append a record, retrying a failed write up to `retries` more times
pub async fn append_with_retry(
    store: &dyn AuditStore,
    record: NewAuditRecord,
    retries: u32,
) -> ServerResult<i64> {
    let mut attempt = 0;
    loop {
        match store.append(record.clone()).await {
            Ok(id) => return Ok(id),
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!(error = %e, attempt, retries, "Audit write failed, retrying");
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}
