//! External-process recognizer
//!
//! Runs `<program> <args...> <image-path>` directly from an argument vector
//! (never through a shell) and reads the identity from the first line of
//! stdout.

use super::{RecognitionResult, Recognizer};
use crate::config::RecognizerConfig;
use async_trait::async_trait;
use facegate_common::{FacegateError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Recognizer backed by an external program
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    max_label_len: usize,
}

impl CommandRecognizer {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
        max_label_len: usize,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            max_label_len,
        }
    }

    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.timeout(),
            config.max_label_len,
        )
    }

    async fn run(&self, image: &Path) -> Result<String> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FacegateError::recognizer(format!("failed to start '{}': {}", self.program, e))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                FacegateError::recognizer(format!("timed out after {:?}", self.timeout))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = %output.status, stderr = %stderr.trim(), "Recognizer reported failure");
            return Err(FacegateError::recognizer(format!(
                "exited with {}",
                output.status
            )));
        }

        parse_label(&output.stdout, self.max_label_len)
    }
}

#[async_trait]
impl Recognizer for CommandRecognizer {
    async fn recognize(&self, image: &Path) -> RecognitionResult {
        match self.run(image).await {
            Ok(label) => RecognitionResult::success(label),
            Err(e) => {
                warn!(recognizer = %self.program, error = %e, "Recognition failed");
                RecognitionResult::failure(e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Extract the identity label from recognizer output
///
/// Takes the first line, trims surrounding whitespace and truncates to
/// `max_len` characters. Output that is not UTF-8, is blank, or carries
/// control characters is malformed.
pub fn parse_label(stdout: &[u8], max_len: usize) -> Result<String> {
    let text = std::str::from_utf8(stdout)
        .map_err(|_| FacegateError::recognizer("output is not valid UTF-8"))?;

    let line = text.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Err(FacegateError::recognizer("empty output"));
    }
    if line.chars().any(char::is_control) {
        return Err(FacegateError::recognizer("output contains control characters"));
    }

    Ok(line.chars().take(max_len).collect())
}
