//! The logging runner

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use logrun_exec::{
    CommandResult, ExecError, Executor, LocalExecutorBuilder, SshExecutorBuilder,
};
use tracing::{debug, instrument};

use crate::config::{LocalConfig, RemoteConfig};
use crate::error::Error;
use crate::exit_code::{EXIT_ERROR_EXECUTE, EXIT_OK};
use crate::log::{LogFn, discard_log};
use crate::settings::CommandSettings;

/// Logs and runs commands through an [`Executor`]
///
/// Each call formats the command, passes the string to the log callback,
/// and then runs it unless dry-run is enabled. The callback and the dry-run
/// flag can be changed through a shared reference at any time; the executor
/// is fixed at construction.
pub struct Runner {
    executor: Arc<dyn Executor>,
    log_fn: RwLock<LogFn>,
    dryrun: AtomicBool,
    commands: CommandSettings,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("executor", &self.executor)
            .field("dryrun", &self.dryrun())
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Runner backed by any executor, with logging discarded and default
    /// external commands
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            log_fn: RwLock::new(discard_log()),
            dryrun: AtomicBool::new(false),
            commands: CommandSettings::default(),
        }
    }

    /// Runner that spawns processes on this machine
    #[must_use]
    pub fn local(config: LocalConfig) -> Self {
        let mut builder = LocalExecutorBuilder::new()
            .with_shell(config.shell)
            .with_env(config.env)
            .with_stdin(config.stdin)
            .with_stdout(config.stdout)
            .with_stderr(config.stderr);
        if let Some(dir) = config.dir {
            builder = builder.with_dir(dir);
        }

        Self::with_executor(Arc::new(builder.build()))
            .with_settings(config.log_fn, config.dryrun, config.commands)
    }

    /// Runner that executes commands over SSH
    ///
    /// # Errors
    /// Returns `Error::Exec` if the credentials cannot be resolved, for
    /// example an unreadable or malformed private key. No connection is
    /// attempted until the first command runs.
    pub fn remote(config: RemoteConfig) -> Result<Self, Error> {
        let executor = SshExecutorBuilder::new(config.credentials)
            .with_host_key_policy(config.host_key_policy)
            .with_shell(config.shell)
            .with_stdin(config.stdin)
            .with_stdout(config.stdout)
            .with_stderr(config.stderr)
            .build()?;

        Ok(Self::with_executor(Arc::new(executor))
            .with_settings(config.log_fn, config.dryrun, config.commands))
    }

    /// Replace the external commands used by derived operations
    #[must_use]
    pub fn with_commands(mut self, commands: CommandSettings) -> Self {
        self.commands = commands;
        self
    }

    fn with_settings(self, log_fn: Option<LogFn>, dryrun: bool, commands: CommandSettings) -> Self {
        if let Some(f) = log_fn {
            self.set_log_func(f);
        }
        self.set_dryrun(dryrun);
        self.with_commands(commands)
    }

    /// The underlying executor
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// External commands used by derived operations
    pub fn commands(&self) -> &CommandSettings {
        &self.commands
    }

    /// Set the command logging callback
    pub fn set_log_func(&self, f: LogFn) {
        *self.log_fn.write().unwrap_or_else(PoisonError::into_inner) = f;
    }

    /// Enable or disable dry-run. When enabled commands are only logged.
    pub fn set_dryrun(&self, dryrun: bool) {
        self.dryrun.store(dryrun, Ordering::SeqCst);
    }

    /// Whether dry-run is enabled
    pub fn dryrun(&self) -> bool {
        self.dryrun.load(Ordering::SeqCst)
    }

    /// Pass a formatted command to the log callback
    pub(crate) fn log(&self, message: &str) {
        // clone out so the callback may itself reconfigure the runner
        let f = Arc::clone(&self.log_fn.read().unwrap_or_else(PoisonError::into_inner));
        f(&[&message]);
    }

    /// Render what [`Runner::run`] executes
    pub fn format_run(&self, cmd: &str, args: &[&str]) -> String {
        self.executor.format_run(cmd, args)
    }

    /// Render what [`Runner::shell`] executes
    pub fn format_shell(&self, command_line: &str) -> String {
        self.executor.format_shell(command_line)
    }

    /// Log and run a command
    ///
    /// In dry-run mode nothing runs and the result is empty with
    /// [`EXIT_OK`]. If the command cannot be executed at all, the result
    /// has empty stdout, the error text as stderr and
    /// [`EXIT_ERROR_EXECUTE`]; use [`Runner::try_run`] to tell that apart
    /// from the program itself failing.
    pub async fn run(&self, cmd: &str, args: &[&str]) -> CommandResult {
        self.log(&self.format_run(cmd, args));
        if self.dryrun() {
            return dry_result();
        }
        self.execute_run(cmd, args).await
    }

    /// Log and run a command line through the shell
    ///
    /// Same contract as [`Runner::run`].
    pub async fn shell(&self, command_line: &str) -> CommandResult {
        self.log(&self.format_shell(command_line));
        if self.dryrun() {
            return dry_result();
        }
        self.execute_shell(command_line).await
    }

    /// Like [`Runner::run`], but an execution failure is returned as `Err`
    ///
    /// # Errors
    /// Returns the executor's error when the command could not be run
    pub async fn try_run(&self, cmd: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        self.log(&self.format_run(cmd, args));
        if self.dryrun() {
            return Ok(dry_result());
        }
        self.executor.run(cmd, args).await
    }

    /// Like [`Runner::shell`], but an execution failure is returned as `Err`
    ///
    /// # Errors
    /// Returns the executor's error when the shell could not be run
    pub async fn try_shell(&self, command_line: &str) -> Result<CommandResult, ExecError> {
        self.log(&self.format_shell(command_line));
        if self.dryrun() {
            return Ok(dry_result());
        }
        self.executor.shell(command_line).await
    }

    /// Run without logging, folding execution errors into the result
    #[instrument(skip(self, args), level = "debug")]
    pub(crate) async fn execute_run(&self, cmd: &str, args: &[&str]) -> CommandResult {
        fold_exec_error(self.executor.run(cmd, args).await)
    }

    /// Shell without logging, folding execution errors into the result
    #[instrument(skip(self), level = "debug")]
    pub(crate) async fn execute_shell(&self, command_line: &str) -> CommandResult {
        fold_exec_error(self.executor.shell(command_line).await)
    }
}

fn dry_result() -> CommandResult {
    CommandResult::new(EXIT_OK, "", "")
}

fn fold_exec_error(result: Result<CommandResult, ExecError>) -> CommandResult {
    match result {
        Ok(result) => result,
        Err(e) => {
            debug!(error = %e, "command could not be executed");
            CommandResult::new(EXIT_ERROR_EXECUTE, "", e.to_string())
        }
    }
}
