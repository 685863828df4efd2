//! Process-wide default runner
//!
//! A local runner built from [`LocalConfig::default`] the first time it is
//! touched. The free functions here forward to it, so changing its log
//! callback or dry-run flag affects every caller in the process. Prefer
//! constructing and passing a [`Runner`] explicitly where possible.

use std::sync::LazyLock;

use logrun_exec::CommandResult;

use crate::config::LocalConfig;
use crate::error::Error;
use crate::log::LogFn;
use crate::runner::Runner;

static STANDARD: LazyLock<Runner> = LazyLock::new(|| Runner::local(LocalConfig::default()));

/// The shared default runner
pub fn runner() -> &'static Runner {
    &STANDARD
}

/// See [`Runner::set_log_func`]
pub fn set_log_func(f: LogFn) {
    runner().set_log_func(f);
}

/// See [`Runner::set_dryrun`]
pub fn set_dryrun(dryrun: bool) {
    runner().set_dryrun(dryrun);
}

/// See [`Runner::run`]
pub async fn run(cmd: &str, args: &[&str]) -> CommandResult {
    runner().run(cmd, args).await
}

/// See [`Runner::format_run`]
pub fn format_run(cmd: &str, args: &[&str]) -> String {
    runner().format_run(cmd, args)
}

/// See [`Runner::shell`]
pub async fn shell(command_line: &str) -> CommandResult {
    runner().shell(command_line).await
}

/// See [`Runner::format_shell`]
pub fn format_shell(command_line: &str) -> String {
    runner().format_shell(command_line)
}

/// See [`Runner::file_exists`]
pub async fn file_exists(path: &str) -> Result<bool, Error> {
    runner().file_exists(path).await
}

/// See [`Runner::dir_exists`]
pub async fn dir_exists(path: &str) -> Result<bool, Error> {
    runner().dir_exists(path).await
}

/// See [`Runner::glob`]
pub async fn glob(pattern: &str) -> Result<Vec<String>, Error> {
    runner().glob(pattern).await
}

/// See [`Runner::rsync`]
pub async fn rsync(src: &str, dest: &str) -> Result<(), Error> {
    runner().rsync(src, dest).await
}
