//! logrun-exec: Command execution primitives
//!
//! Provides the [`Executor`] trait plus implementations that spawn commands
//! on the local machine or run them over SSH, together with the formatting
//! rules that render each invocation as a single printable command line.

pub mod credentials;
pub mod error;
pub mod format;
pub mod local;
pub mod result;
pub mod ssh;
pub mod stream;
pub mod traits;

pub use credentials::{Credentials, HostKeyPolicy};
pub use error::ExecError;
pub use local::{LocalExecutor, LocalExecutorBuilder};
pub use result::CommandResult;
pub use ssh::{SshExecutor, SshExecutorBuilder};
pub use stream::{InputSource, OutputSink, SharedReader, SharedWriter};
pub use traits::Executor;

/// Shell used for `shell` invocations when none is configured
pub const DEFAULT_SHELL: &str = "/bin/sh";
