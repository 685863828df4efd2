//! Local command execution using `tokio::process`

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use crate::DEFAULT_SHELL;
use crate::error::ExecError;
use crate::format;
use crate::result::CommandResult;
use crate::stream::{self, InputSource, OutputSink, StdStream};
use crate::traits::Executor;

/// Local command executor
///
/// Spawns programs on the local machine. `run` executes the program
/// directly; `shell` passes the line to `<shell> -c`.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    shell: String,
    /// `None` inherits the current environment
    env: Option<Vec<(String, String)>>,
    dir: Option<PathBuf>,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl LocalExecutor {
    /// Create a local executor with default settings
    #[must_use]
    pub fn new() -> Self {
        LocalExecutorBuilder::new().build()
    }

    /// Shell used by [`Executor::shell`]
    pub fn shell_path(&self) -> &str {
        &self.shell
    }

    /// Run `cmd` directly, failing with `ExecError::Timeout` past `timeout_duration`
    ///
    /// # Errors
    /// Returns `ExecError::Timeout` if the command does not finish in time,
    /// or any error [`Executor::run`] returns.
    #[instrument(skip(self, args), level = "debug")]
    pub async fn run_with_timeout(
        &self,
        cmd: &str,
        args: &[&str],
        timeout_duration: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!(command = %cmd, timeout = ?timeout_duration, "executing with timeout");

        let mut command = Command::new(cmd);
        command.args(args).kill_on_drop(true);

        match timeout(timeout_duration, self.execute(command, cmd)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    command = %cmd,
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "command timed out"
                );
                Err(ExecError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    /// Apply environment, directory and stdio settings, spawn and wait
    async fn execute(&self, mut command: Command, cmd_display: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        if let Some(env) = &self.env {
            command.env_clear();
            command.envs(env.iter().map(|(k, v)| (k, v)));
        }
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        command
            .stdin(input_stdio(&self.stdin))
            .stdout(output_stdio(&self.stdout))
            .stderr(output_stdio(&self.stderr));

        let mut child = command
            .spawn()
            .map_err(|e| ExecError::SpawnError(format!("{cmd_display}: {e}")))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let feed_stdin = async {
            match stdin {
                Some(pipe) => stream::feed(&self.stdin, pipe).await,
                None => Ok(()),
            }
        };
        let read_stdout = async {
            match stdout {
                Some(pipe) => stream::pump(pipe, &self.stdout, StdStream::Stdout).await,
                None => Ok(Vec::new()),
            }
        };
        let read_stderr = async {
            match stderr {
                Some(pipe) => stream::pump(pipe, &self.stderr, StdStream::Stderr).await,
                None => Ok(Vec::new()),
            }
        };

        let (fed, out, err, status) =
            tokio::join!(feed_stdin, read_stdout, read_stderr, child.wait());

        let status = status?;
        fed?;
        let stdout = stream::lossy(&out?);
        let stderr = stream::lossy(&err?);

        let duration = start.elapsed();
        // terminated by a signal
        let status = status.code().unwrap_or(-1);

        debug!(
            command = %cmd_display,
            status = status,
            duration = ?duration,
            "command completed"
        );

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    #[instrument(skip(self, args), level = "debug")]
    async fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let mut command = Command::new(cmd);
        command.args(args);
        self.execute(command, cmd).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn shell(&self, command_line: &str) -> Result<CommandResult, ExecError> {
        let mut command = Command::new(&self.shell);
        command.arg("-c").arg(command_line);
        self.execute(command, &self.shell).await
    }

    fn format_run(&self, cmd: &str, args: &[&str]) -> String {
        format::command_line(cmd, args)
    }

    fn format_shell(&self, command_line: &str) -> String {
        format::shell_line(&self.shell, command_line)
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}

/// Builder for `LocalExecutor`
#[derive(Debug, Clone, Default)]
pub struct LocalExecutorBuilder {
    shell: Option<String>,
    env: Vec<String>,
    dir: Option<PathBuf>,
    stdin: InputSource,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl LocalExecutorBuilder {
    /// Create builder with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shell used for `shell` invocations (empty keeps `/bin/sh`)
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        let shell = shell.into();
        self.shell = (!shell.is_empty()).then_some(shell);
        self
    }

    /// Replace the inherited environment with `KEY=VALUE` entries
    ///
    /// An empty list keeps the inherited environment. Later duplicates win.
    #[must_use]
    pub fn with_env<I, S>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env = env.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
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
    #[must_use]
    pub fn build(self) -> LocalExecutor {
        LocalExecutor {
            shell: self.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string()),
            env: parse_env(&self.env),
            dir: self.dir,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

/// Parse `KEY=VALUE` entries, keeping the last value of duplicate keys
fn parse_env(entries: &[String]) -> Option<Vec<(String, String)>> {
    if entries.is_empty() {
        return None;
    }

    let mut vars: Vec<(String, String)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            warn!(entry = %entry, "ignoring environment entry without '='");
            continue;
        };
        match vars.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.to_string(),
            None => vars.push((key.to_string(), value.to_string())),
        }
    }
    Some(vars)
}

fn input_stdio(source: &InputSource) -> Stdio {
    if source.is_null() {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}

fn output_stdio(sink: &OutputSink) -> Stdio {
    match sink {
        OutputSink::Capture | OutputSink::Writer(_) => Stdio::piped(),
        OutputSink::Null => Stdio::null(),
        OutputSink::Inherit => Stdio::inherit(),
    }
}
