//! Audit log store trait and SQLite implementation

use crate::audit::schema;
use crate::audit::types::{AuditRecord, NewAuditRecord};
use crate::decision::AccessStatus;
use crate::error::{ServerError, ServerResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How long a write waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Append-only access log (dependency injection)
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one record, returning its id
    async fn append(&self, record: NewAuditRecord) -> ServerResult<i64>;

    /// Most recent records, newest first
    async fn recent(&self, limit: usize) -> ServerResult<Vec<AuditRecord>>;

    /// Number of stored records
    async fn count(&self) -> ServerResult<u64>;
}

/// SQLite-backed audit store
///
/// One connection serialized behind a mutex. Every statement runs on the
/// blocking pool and holds the lock only for its own duration.
#[derive(Clone)]
pub struct SqliteAuditStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
    /// Open (or create) the store at `path` and initialize the schema
    pub fn open(path: &Path) -> ServerResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::init_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Create an in-memory store
    pub fn open_in_memory() -> ServerResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<F, T>(&self, f: F) -> ServerResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| ServerError::audit_task(format!("Failed to acquire database lock: {e}")))?;
            f(&conn).map_err(ServerError::from)
        })
        .await
        .map_err(|e| ServerError::audit_task(format!("Audit task panicked: {e}")))?
    }
}

fn status_from_column(idx: usize, text: String) -> rusqlite::Result<AccessStatus> {
    AccessStatus::from_stored(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown access status '{text}'").into(),
        )
    })
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, record: NewAuditRecord) -> ServerResult<i64> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO logs (timestamp, client_ip, user, status) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.timestamp,
                    record.client_ip,
                    record.user,
                    record.status.as_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn recent(&self, limit: usize) -> ServerResult<Vec<AuditRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, timestamp, client_ip, user, status
                FROM logs
                ORDER BY id DESC
                LIMIT ?1
                "#,
            )?;

            let rows = stmt.query_map(params![limit], |row| {
                Ok(AuditRecord {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    client_ip: row.get(2)?,
                    user: row.get(3)?,
                    status: status_from_column(4, row.get(4)?)?,
                })
            })?;

            let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> ServerResult<u64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get::<_, i64>(0))
        })
        .await
        .map(|n| n.max(0) as u64)
    }
}
