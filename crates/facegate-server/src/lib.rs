//! Facegate Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! A TCP access-control gateway: a client sends one length-prefixed facial
//! image, an external recognizer names the person (or fails), the decision
//! is appended to a SQLite audit trail, and `ALLOWED;<label>` or
//! `DENIED;unknown` goes back before the connection closes.
//!
//! # Architecture
//!
//! - **Listener** ([`server`]): binds the port, runs one task per connection
//!   under a concurrency cap
//! - **Session Handler** ([`session`]): framing, recognition, decision,
//!   logging and response for a single connection
//! - **Recognizer** ([`recognizer`]): the external capability behind a trait
//! - **Decision Policy** ([`decision`]): recognition outcome to ALLOWED/DENIED
//! - **Audit Log Store** ([`audit`]): append-only SQLite `logs` table
//!
//! # Example
//!
//! ```no_run
//! use facegate_server::{audit::SqliteAuditStore, config::Config, server::Server, session::SessionContext};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::from_env();
//!     config.server.port = 8000;
//!     config.database.path = "access.db".into();
//!     config.validate()?;
//!
//!     let store = Arc::new(SqliteAuditStore::open(&config.database.path)?);
//!     let ctx = SessionContext::from_config(&config, store);
//!     Server::from_config(&config, ctx).await?.run(CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod protocol;
pub mod recognizer;
pub mod server;
pub mod session;
pub mod spool;

// Re-export commonly used types
pub use cli::Cli;
pub use error::{ServerError, ServerResult};
