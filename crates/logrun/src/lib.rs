//! logrun: Log and run commands locally or over SSH
//!
//! A [`Runner`] wraps an [`Executor`] with a logging callback and a dry-run
//! switch. Every command is rendered to a single line, handed to the
//! callback, and then (unless dry-run is on) executed. The same interface
//! works whether the executor spawns local processes or talks to a remote
//! host, so callers never branch on where a command runs.
//!
//! ```no_run
//! use logrun::{LocalConfig, Runner, log_fn};
//!
//! # async fn demo() {
//! let runner = Runner::local(LocalConfig {
//!     log_fn: Some(log_fn(|values| println!("{}", logrun::render(values)))),
//!     ..LocalConfig::default()
//! });
//! let result = runner.shell("seq 1 3 | grep 2").await;
//! assert_eq!(result.stdout, "2\n");
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exit_code;
pub mod log;
pub mod ops;
pub mod runner;
pub mod settings;
pub mod standard;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{LocalConfig, RemoteConfig};
pub use error::Error;
pub use log::{LogFn, discard_log, log_fn, render, tracing_log};
pub use runner::Runner;
pub use settings::{CommandSettings, CommandSpec};

pub use logrun_exec::{
    CommandResult, Credentials, ExecError, Executor, HostKeyPolicy, InputSource, OutputSink,
};
