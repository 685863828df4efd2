//! Result type for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of a command that ran to completion
///
/// `stdout` and `stderr` are empty when the matching stream was sent to a
/// sink other than [`OutputSink::Capture`](crate::stream::OutputSink::Capture).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success, -1 if none was reported)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Build a result with zero duration
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Split into `(stdout, stderr, status)`
    #[must_use]
    pub fn into_parts(self) -> (String, String, i32) {
        (self.stdout, self.stderr, self.status)
    }

    /// Combine stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}
