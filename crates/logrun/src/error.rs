//! Error types for logrun

use logrun_exec::ExecError;
use thiserror::Error;

/// Errors returned by runner construction and derived operations
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The status query failed for a reason other than a missing path
    #[error("could not access {path}: {output}")]
    Access {
        /// Queried path
        path: String,
        /// stdout of the status query
        output: String,
    },

    /// The path exists but is not a regular file
    #[error("{0} is not a regular file")]
    NotAFile(String),

    /// The path exists but is not a directory
    #[error("{0} is not a directory")]
    NotADirectory(String),

    /// A command succeeded but its output had an unexpected shape
    #[error("unexpected output from {command}: {output:?}")]
    Parse {
        /// Command whose output was parsed
        command: String,
        /// Offending output
        output: String,
    },

    /// The glob listing exited non-zero
    #[error("glob '{pattern}' failed: {stderr}")]
    Glob {
        /// Pattern passed to the shell
        pattern: String,
        /// stderr of the listing command
        stderr: String,
    },

    /// rsync exited non-zero
    #[error("rsync command failed: {0}")]
    Rsync(String),

    /// The executor could not be created or could not run a command
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Invalid settings
    #[error("invalid configuration: {0}")]
    Config(String),
}
