//! External commands used by the derived operations
//!
//! The defaults have been exercised on RHEL/CentOS 7 and Ubuntu 18.04 and
//! later. Each entry can be overridden in code or from a TOML table:
//!
//! ```toml
//! [rsync]
//! command = "/usr/local/bin/rsync"
//! options = ["--rsh", "ssh -q", "--recursive", "--links", "--times"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// `--rsh` value that disables host key verification
pub const INSECURE_RSYNC_RSH: &str = "ssh -q -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null -o GlobalKnownHostsFile=/dev/null";

/// A program plus the options placed before the operation's own arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Full path to the program
    pub command: String,
    /// Leading options
    #[serde(default)]
    pub options: Vec<String>,
}

impl CommandSpec {
    /// Create a spec from a program and its options
    pub fn new<I, S>(command: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Options followed by `extra`, as borrowed arguments
    pub fn args<'a>(&'a self, extra: &[&'a str]) -> Vec<&'a str> {
        self.options
            .iter()
            .map(String::as_str)
            .chain(extra.iter().copied())
            .collect()
    }

    /// `command options... extra...` joined with spaces
    #[must_use]
    pub fn line(&self, extra: &[&str]) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args(extra))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn stat() -> Self {
        Self::new("/usr/bin/stat", ["--dereference", "--format", "%n:%F"])
    }

    fn rsync(rsh: &str) -> Self {
        Self::new(
            "/usr/bin/rsync",
            ["--rsh", rsh, "--recursive", "--links", "--times"],
        )
    }
}

/// Commands behind `file_exists`, `dir_exists`, `glob` and `rsync`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Status query for `file_exists`; must print `<name>:<type>`
    pub file_stat: CommandSpec,
    /// Status query for `dir_exists`; must print `<name>:<type>`
    pub dir_stat: CommandSpec,
    /// One-path-per-line listing run through the shell for `glob`
    pub glob: CommandSpec,
    /// Synchronisation command for `rsync`
    pub rsync: CommandSpec,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            file_stat: CommandSpec::stat(),
            dir_stat: CommandSpec::stat(),
            glob: CommandSpec::new("/bin/ls", ["-1", "--directory"]),
            rsync: CommandSpec::rsync(INSECURE_RSYNC_RSH),
        }
    }
}

impl CommandSettings {
    /// Defaults, except rsync's ssh keeps host key verification on
    #[must_use]
    pub fn strict() -> Self {
        Self {
            rsync: CommandSpec::rsync("ssh -q"),
            ..Self::default()
        }
    }

    /// Parse settings from TOML; missing tables keep their defaults
    ///
    /// # Errors
    /// Returns `Error::Config` if the text is not valid TOML for these settings
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read settings from a TOML file
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read or parsed
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
