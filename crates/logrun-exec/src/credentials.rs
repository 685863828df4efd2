//! SSH credentials and their resolution into an authentication method

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use russh::keys::{PrivateKey, load_secret_key};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ExecError;

/// Port used when none is configured
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Host used when none is configured
pub const DEFAULT_HOSTNAME: &str = "localhost";

/// Credentials needed to open an SSH session
///
/// Empty / zero fields fall back to defaults: `localhost`, port 22, the
/// current user, and `~/.ssh/id_rsa`. A password takes precedence over a
/// private key when both are set.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Hostname or IP of the remote host
    #[serde(default)]
    pub hostname: String,
    /// SSH port (0 means 22)
    #[serde(default)]
    pub port: u16,
    /// Account used to authenticate
    #[serde(default)]
    pub username: String,
    /// Password, if using password authentication
    #[serde(default)]
    pub password: Option<String>,
    /// Private key file, if using public key authentication
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .finish()
    }
}

impl Credentials {
    /// Create credentials for `hostname` with everything else defaulted
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Set the login user
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Authenticate with a password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Authenticate with a private key file
    #[must_use]
    pub fn with_private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// Hostname after defaulting
    #[must_use]
    pub fn host(&self) -> &str {
        if self.hostname.is_empty() {
            DEFAULT_HOSTNAME
        } else {
            &self.hostname
        }
    }

    /// Port after defaulting
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_SSH_PORT
        } else {
            self.port
        }
    }

    /// Username after defaulting to the current user
    #[must_use]
    pub fn user(&self) -> String {
        if self.username.is_empty() {
            current_username()
        } else {
            self.username.clone()
        }
    }

    /// Resolve the authentication method, loading the private key if needed
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` if the key is missing, readable by
    /// group/other, or cannot be parsed, and `ExecError::ConfigError` if no
    /// home directory is available to locate the default key.
    pub(crate) fn resolve_auth(&self) -> Result<Auth, ExecError> {
        if let Some(password) = &self.password {
            return Ok(Auth::Password(password.clone()));
        }

        let path = match &self.private_key_path {
            Some(path) => path.clone(),
            None => default_key_path()?,
        };
        validate_key_permissions(&path)?;

        let key = load_secret_key(&path, None)
            .map_err(|e| ExecError::SshKeyError(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded SSH private key");

        Ok(Auth::Key(Arc::new(key)))
    }
}

/// How the remote host key is verified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Accept any host key (like `StrictHostKeyChecking=no`)
    #[default]
    AcceptAny,
    /// Require a matching entry in the user's `known_hosts`
    KnownHosts,
}

/// Resolved authentication method
#[derive(Clone)]
pub(crate) enum Auth {
    Password(String),
    Key(Arc<PrivateKey>),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Password(_) => f.write_str("Password(<redacted>)"),
            Auth::Key(_) => f.write_str("Key(<private key>)"),
        }
    }
}

fn current_username() -> String {
    env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

fn default_key_path() -> Result<PathBuf, ExecError> {
    dirs::home_dir()
        .map(|home| home.join(".ssh").join("id_rsa"))
        .ok_or_else(|| ExecError::ConfigError("cannot locate home directory".to_string()))
}

fn validate_key_permissions(path: &Path) -> Result<(), ExecError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| ExecError::SshKeyError(format!("{}: {e}", path.display())))?;

    // group and other bits must be clear
    if metadata.permissions().mode() & 0o077 != 0 {
        return Err(ExecError::SshKeyError(format!(
            "key file permissions too open: {} (should be 600)",
            path.display()
        )));
    }

    Ok(())
}
