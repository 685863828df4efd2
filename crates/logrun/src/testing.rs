//! Test doubles

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use logrun_exec::format::{command_line, shell_line};
use logrun_exec::{CommandResult, ExecError, Executor};

use crate::log::{LogFn, log_fn, render};

/// Executor that answers from a script keyed by formatted command line
///
/// Unscripted commands succeed with empty output. Its shell is `mock`.
#[derive(Debug, Default)]
pub(crate) struct MockExecutor {
    responses: HashMap<String, Result<CommandResult, ExecError>>,
    calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, line: &str, result: CommandResult) -> Self {
        self.responses.insert(line.to_string(), Ok(result));
        self
    }

    pub(crate) fn fail(mut self, line: &str, err: ExecError) -> Self {
        self.responses.insert(line.to_string(), Err(err));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, line: String) -> Result<CommandResult, ExecError> {
        let response = self
            .responses
            .get(&line)
            .cloned()
            .unwrap_or_else(|| Ok(CommandResult::default()));
        self.calls.lock().unwrap().push(line);
        response
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        self.answer(command_line(cmd, args))
    }

    async fn shell(&self, line: &str) -> Result<CommandResult, ExecError> {
        self.answer(shell_line("mock", line))
    }

    fn format_run(&self, cmd: &str, args: &[&str]) -> String {
        command_line(cmd, args)
    }

    fn format_shell(&self, line: &str) -> String {
        shell_line("mock", line)
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

/// Collects everything passed to its log callback
#[derive(Debug, Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub(crate) fn log_fn(&self) -> LogFn {
        let lines = Arc::clone(&self.0);
        log_fn(move |values| lines.lock().unwrap().push(render(values)))
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
