//! Executor trait

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// A facility able to run a program, either directly or through a shell.
///
/// `Ok` means the program ran, whatever its exit status. `Err` means it could
/// not be run at all (missing binary, permission denied, transport failure).
#[async_trait]
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `cmd` with `args` without a shell in between
    async fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandResult, ExecError>;

    /// Run `command_line` as `<shell> -c "<command_line>"`
    async fn shell(&self, command_line: &str) -> Result<CommandResult, ExecError>;

    /// Render what [`Executor::run`] executes for the same arguments
    fn format_run(&self, cmd: &str, args: &[&str]) -> String;

    /// Render what [`Executor::shell`] executes for the same command line
    fn format_shell(&self, command_line: &str) -> String;

    /// Short name of the backend, used in diagnostics
    fn executor_type(&self) -> &'static str;
}
