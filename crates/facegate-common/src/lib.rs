//! Facegate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the facegate workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FacegateError`] and the [`Result`] alias
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`], the
//!   operator-facing channel every binary reports through
//!
//! # Example
//!
//! ```no_run
//! use facegate_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env_or(LogConfig::default())?;
//!     init_logging(&config)?;
//!     tracing::info!("gateway starting");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{FacegateError, Result};
