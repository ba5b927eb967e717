//! Command-line interface for the `facegate` binary

use crate::config::Config;
use crate::error::ServerResult;
use clap::Parser;
use std::path::PathBuf;

/// Facegate - face recognition access gateway
#[derive(Parser, Debug)]
#[command(name = "facegate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TCP port to listen on
    #[arg(env = "FACEGATE_PORT")]
    pub port: u16,

    /// SQLite access log path (created if absent)
    #[arg(env = "FACEGATE_DATABASE")]
    pub database: PathBuf,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Maximum concurrently served connections (1 = sequential)
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Largest accepted image in bytes
    #[arg(long)]
    pub max_payload_bytes: Option<u32>,

    /// Seconds allowed for receiving and recognizing one image
    #[arg(long, value_name = "SECS")]
    pub session_timeout: Option<u64>,

    /// Seconds allowed for one recognizer run
    #[arg(long, value_name = "SECS")]
    pub recognizer_timeout: Option<u64>,

    /// Recognizer program; replaces the default arguments too
    #[arg(long, value_name = "PROGRAM")]
    pub recognizer: Option<String>,

    /// Argument passed to the recognizer before the image path (repeatable)
    #[arg(long = "recognizer-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub recognizer_args: Vec<String>,

    /// Directory for per-session image files
    #[arg(long)]
    pub spool_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Environment configuration with these arguments applied, validated
    pub fn load_config(&self) -> ServerResult<Config> {
        let mut config = Config::from_env();
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line values on top of `config`
    pub fn apply(&self, config: &mut Config) {
        config.server.port = self.port;
        config.database.path = self.database.clone();

        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(max) = self.max_connections {
            config.server.max_connections = max;
        }
        if let Some(max) = self.max_payload_bytes {
            config.session.max_payload_bytes = max;
        }
        if let Some(secs) = self.session_timeout {
            config.session.session_timeout_secs = secs;
        }
        if let Some(secs) = self.recognizer_timeout {
            config.recognizer.timeout_secs = secs;
        }
        if let Some(ref program) = self.recognizer {
            config.recognizer.program = program.clone();
            config.recognizer.args = self.recognizer_args.clone();
        } else if !self.recognizer_args.is_empty() {
            config.recognizer.args = self.recognizer_args.clone();
        }
        if let Some(ref dir) = self.spool_dir {
            config.session.spool_dir = dir.clone();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ServerError;
    use facegate_common::FacegateError;
    use serial_test::serial;

    #[test]
    fn test_positionals_fill_port_and_database() {
        let cli = Cli::try_parse_from(["facegate", "8000", "database.db"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, PathBuf::from("database.db"));
        assert_eq!(config.recognizer.args, vec!["recognize.py".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recognizer_replaces_default_args() {
        let cli = Cli::try_parse_from([
            "facegate",
            "9000",
            "access.db",
            "--recognizer",
            "/opt/facerec/bin/identify",
            "--recognizer-arg",
            "--threshold=0.6",
            "--max-connections",
            "1",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.recognizer.program, "/opt/facerec/bin/identify");
        assert_eq!(config.recognizer.args, vec!["--threshold=0.6".to_string()]);
        assert_eq!(config.server.max_connections, 1);
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_invalid_values() {
        let cli = Cli::try_parse_from(["facegate", "0", "access.db"]).unwrap();
        let err = cli.load_config().unwrap_err();
        assert!(matches!(err, ServerError::Common(FacegateError::Config(_))));

        let cli = Cli::try_parse_from(["facegate", "8000", "access.db", "--max-connections", "0"])
            .unwrap();
        assert!(cli.load_config().is_err());

        let cli = Cli::try_parse_from(["facegate", "8000", "access.db"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_port_must_be_numeric() {
        assert!(Cli::try_parse_from(["facegate", "http", "access.db"]).is_err());
    }
}
