//! SSH command execution using russh crate

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use russh::keys::{PrivateKeyWithHashAlg, check_known_hosts, ssh_key};
use russh::{ChannelMsg, Disconnect, client};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::DEFAULT_SHELL;
use crate::credentials::{Auth, Credentials, HostKeyPolicy};
use crate::error::ExecError;
use crate::format;
use crate::result::CommandResult;
use crate::stream::{self, InputSource, OutputSink, StdStream};
use crate::traits::Executor;

/// SSH client handler for russh
#[derive(Debug)]
struct SshClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

impl client::Handler for SshClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::AcceptAny => Ok(true),
            HostKeyPolicy::KnownHosts => {
                let known = check_known_hosts(&self.host, self.port, server_public_key)
                    .unwrap_or_else(|e| {
                        warn!(host = %self.host, error = %e, "known_hosts check failed");
                        false
                    });
                Ok(known)
            }
        }
    }
}

/// SSH command executor
///
/// Authentication material is resolved when the executor is built; the
/// session itself is opened on first use and reused by later commands.
pub struct SshExecutor {
    credentials: Credentials,
    /// Login user after defaulting
    user: String,
    auth: Auth,
    host_key_policy: HostKeyPolicy,
    shell: String,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
    /// SSH session (initialized on first use)
    session: Mutex<Option<client::Handle<SshClientHandler>>>,
}

impl std::fmt::Debug for SshExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshExecutor")
            .field("credentials", &self.credentials)
            .field("user", &self.user)
            .field("auth", &self.auth)
            .field("host_key_policy", &self.host_key_policy)
            .field("shell", &self.shell)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl SshExecutor {
    /// Create a new SSH executor with default shell and streams
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` or `ExecError::ConfigError` if the
    /// credentials cannot be turned into an authentication method
    pub fn new(credentials: Credentials) -> Result<Self, ExecError> {
        SshExecutorBuilder::new(credentials).build()
    }

    /// Get credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether a session is currently cached
    pub fn is_connected(&self) -> bool {
        // a held lock means a command is in flight on an open session
        self.session
            .try_lock()
            .map(|s| s.is_some())
            .unwrap_or(true)
    }

    /// `ssh ... user@host` prefix shared by both formatters
    fn prefix(&self) -> String {
        // `-i` only when the configured key is what authenticates
        let key = match self.auth {
            Auth::Key(_) => self.credentials.private_key_path.as_deref(),
            Auth::Password(_) => None,
        };
        format::ssh_prefix(
            &self.user,
            self.credentials.host(),
            self.credentials.effective_port(),
            key,
        )
    }

    /// Open and authenticate a session unless one is cached
    #[instrument(skip(self, session_lock), fields(host = %self.credentials.host()))]
    async fn connect(
        &self,
        session_lock: &mut Option<client::Handle<SshClientHandler>>,
    ) -> Result<(), ExecError> {
        if session_lock.is_some() {
            return Ok(());
        }

        let host = self.credentials.host();
        let port = self.credentials.effective_port();

        info!(host = %host, port = port, user = %self.user, "connecting to SSH");

        let config = Arc::new(client::Config::default());
        let handler = SshClientHandler {
            host: host.to_string(),
            port,
            policy: self.host_key_policy,
        };

        let mut session = client::connect(config, (host, port), handler)
            .await
            .map_err(|e| match e {
                russh::Error::UnknownKey => ExecError::HostKeyRejected {
                    host: host.to_string(),
                    port,
                },
                e => ExecError::ConnectionFailed(e.to_string()),
            })?;

        let auth_res = match &self.auth {
            Auth::Password(password) => session
                .authenticate_password(&self.user, password)
                .await
                .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?,
            Auth::Key(key) => {
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .ok()
                    .flatten()
                    .flatten();
                session
                    .authenticate_publickey(
                        &self.user,
                        PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
                    )
                    .await
                    .map_err(|e| ExecError::AuthenticationFailed(e.to_string()))?
            }
        };

        if !auth_res.success() {
            return Err(ExecError::AuthenticationFailed(format!(
                "{}@{host} rejected the offered credentials",
                self.user
            )));
        }

        info!(host = %host, "SSH connected and authenticated");

        *session_lock = Some(session);
        Ok(())
    }

    /// Execute a command string on the remote host
    #[instrument(skip(self), fields(host = %self.credentials.host()))]
    async fn execute_remote(&self, remote_cmd: &str) -> Result<CommandResult, ExecError> {
        let mut session_lock = self.session.lock().await;
        self.connect(&mut session_lock).await?;

        let session = session_lock.as_mut().ok_or(ExecError::NotConnected)?;

        debug!(command = %remote_cmd, "executing remote command");

        let start = Instant::now();

        let mut channel = match session.channel_open_session().await {
            Ok(channel) => channel,
            Err(e) => {
                // stale session; reconnect on the next call
                *session_lock = None;
                return Err(ExecError::ConnectionFailed(e.to_string()));
            }
        };

        channel
            .exec(true, remote_cmd)
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        match &self.stdin {
            InputSource::Null => {}
            InputSource::Bytes(bytes) => channel
                .data(&bytes[..])
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?,
            InputSource::Reader(reader) => {
                let mut reader = reader.lock().await;
                channel
                    .data(&mut *reader)
                    .await
                    .map_err(|e| ExecError::IoError(e.to_string()))?;
            }
        }
        channel
            .eof()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        // drain until the channel closes; the exit status may follow EOF
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => {
                    stream::deliver(&self.stdout, StdStream::Stdout, &mut stdout, &data).await?;
                }
                ChannelMsg::ExtendedData { data, ext: 1 } => {
                    stream::deliver(&self.stderr, StdStream::Stderr, &mut stderr, &data).await?;
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    status = exit_status.cast_signed();
                }
                _ => {}
            }
        }
        stream::finish(&self.stdout, StdStream::Stdout).await?;
        stream::finish(&self.stderr, StdStream::Stderr).await?;

        let duration = start.elapsed();
        let stdout = stream::lossy(&stdout);
        let stderr = stream::lossy(&stderr);

        debug!(
            command = %remote_cmd,
            status = status,
            duration = ?duration,
            "remote command completed"
        );

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    /// Disconnect from remote host
    ///
    /// # Errors
    /// Returns `ExecError::IoError` if disconnection fails
    pub async fn disconnect(&self) -> Result<(), ExecError> {
        let mut session_lock = self.session.lock().await;

        if let Some(session) = session_lock.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ExecError::IoError(e.to_string()))?;
            info!(host = %self.credentials.host(), "SSH disconnected");
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for SshExecutor {
    #[instrument(skip(self, args), fields(host = %self.credentials.host()))]
    async fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        self.execute_remote(&format::command_line(cmd, args)).await
    }

    #[instrument(skip(self), fields(host = %self.credentials.host()))]
    async fn shell(&self, command_line: &str) -> Result<CommandResult, ExecError> {
        self.execute_remote(&format::remote_shell_line(&self.shell, command_line))
            .await
    }

    fn format_run(&self, cmd: &str, args: &[&str]) -> String {
        format!("{} {}", self.prefix(), format::command_line(cmd, args))
    }

    fn format_shell(&self, command_line: &str) -> String {
        format!(
            "{} {}",
            self.prefix(),
            format::remote_shell_line(&self.shell, command_line)
        )
    }

    fn executor_type(&self) -> &'static str {
        "ssh"
    }
}

/// Builder for `SshExecutor`
#[derive(Debug, Clone)]
pub struct SshExecutorBuilder {
    credentials: Credentials,
    host_key_policy: HostKeyPolicy,
    shell: Option<String>,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl SshExecutorBuilder {
    /// Create builder with required fields
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            host_key_policy: HostKeyPolicy::default(),
            shell: None,
            stdin: InputSource::default(),
            stdout: OutputSink::default(),
            stderr: OutputSink::default(),
        }
    }

    /// Set how the server's host key is verified
    #[must_use]
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Set the remote shell used for `shell` invocations (empty keeps `/bin/sh`)
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        let shell = shell.into();
        self.shell = (!shell.is_empty()).then_some(shell);
        self
    }

    /// Set the standard input source
    #[must_use]
    pub fn with_stdin(mut self, stdin: InputSource) -> Self {
        self.stdin = stdin;
        self
    }

    /// Set the standard output sink
    #[must_use]
    pub fn with_stdout(mut self, stdout: OutputSink) -> Self {
        self.stdout = stdout;
        self
    }

    /// Set the standard error sink
    #[must_use]
    pub fn with_stderr(mut self, stderr: OutputSink) -> Self {
        self.stderr = stderr;
        self
    }

    /// Build the executor
    ///
    /// # Errors
    /// Returns `ExecError::SshKeyError` if key resolution fails
    pub fn build(self) -> Result<SshExecutor, ExecError> {
        let auth = self.credentials.resolve_auth()?;
        let user = self.credentials.user();

        Ok(SshExecutor {
            credentials: self.credentials,
            user,
            auth,
            host_key_policy: self.host_key_policy,
            shell: self.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
            session: Mutex::new(None),
        })
    }
}
