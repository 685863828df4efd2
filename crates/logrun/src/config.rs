//! Runner construction settings

use std::fmt;
use std::path::PathBuf;

use logrun_exec::{Credentials, HostKeyPolicy, InputSource, OutputSink};

use crate::log::LogFn;
use crate::settings::CommandSettings;

/// Settings for [`Runner::local`](crate::Runner::local)
#[derive(Clone, Default)]
pub struct LocalConfig {
    /// Command logger; `None` discards
    pub log_fn: Option<LogFn>,
    /// Shell for `shell` calls; empty means `/bin/sh`
    pub shell: String,
    /// `KEY=VALUE` entries replacing the inherited environment when non-empty.
    /// The last value of a duplicated key wins.
    pub env: Vec<String>,
    /// Working directory; `None` uses the caller's
    pub dir: Option<PathBuf>,
    /// Standard input, the null device by default
    pub stdin: InputSource,
    /// Standard output, captured by default
    pub stdout: OutputSink,
    /// Standard error, captured by default
    pub stderr: OutputSink,
    /// Log commands without running them
    pub dryrun: bool,
    /// External commands used by derived operations
    pub commands: CommandSettings,
}

impl fmt::Debug for LocalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalConfig")
            .field("log_fn", &self.log_fn.as_ref().map(|_| "<fn>"))
            .field("shell", &self.shell)
            .field("env", &self.env)
            .field("dir", &self.dir)
            .field("stdin", &self.stdin)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("dryrun", &self.dryrun)
            .field("commands", &self.commands)
            .finish()
    }
}

/// Settings for [`Runner::remote`](crate::Runner::remote)
///
/// There is no environment or working directory: the remote login shell
/// decides both.
#[derive(Clone, Default)]
pub struct RemoteConfig {
    /// Command logger; `None` discards
    pub log_fn: Option<LogFn>,
    /// Remote shell for `shell` calls; empty means `/bin/sh`
    pub shell: String,
    /// Standard input, empty by default
    pub stdin: InputSource,
    /// Standard output, captured by default
    pub stdout: OutputSink,
    /// Standard error, captured by default
    pub stderr: OutputSink,
    /// Who to connect to and how to authenticate
    pub credentials: Credentials,
    /// Host key verification, accept-any by default
    pub host_key_policy: HostKeyPolicy,
    /// Log commands without running them
    pub dryrun: bool,
    /// External commands used by derived operations
    pub commands: CommandSettings,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("log_fn", &self.log_fn.as_ref().map(|_| "<fn>"))
            .field("shell", &self.shell)
            .field("stdin", &self.stdin)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("credentials", &self.credentials)
            .field("host_key_policy", &self.host_key_policy)
            .field("dryrun", &self.dryrun)
            .field("commands", &self.commands)
            .finish()
    }
}
