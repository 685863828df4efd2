//! Rendering of command invocations as single printable lines
//!
//! These strings are what gets logged, and for SSH they are also what gets
//! sent to the remote side, so they must stay byte-for-byte stable.

use std::path::Path;

/// `<cmd> <arg1> <arg2> ...`, with no quoting added
#[must_use]
pub fn command_line(cmd: &str, args: &[&str]) -> String {
    let mut line = String::from(cmd);
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// `<shell> -c "<command_line>"`, verbatim
#[must_use]
pub fn shell_line(shell: &str, command_line: &str) -> String {
    format!("{shell} -c \"{command_line}\"")
}

/// `<shell> -c "<command_line>"` for a remote login shell to parse
///
/// The characters still special inside double quotes (`$`, `` ` ``, `\` and
/// `"`) are backslash-escaped, so the login shell strips the quoting and the
/// inner shell receives `command_line` unchanged.
#[must_use]
pub fn remote_shell_line(shell: &str, command_line: &str) -> String {
    let mut escaped = String::with_capacity(command_line.len());
    for c in command_line.chars() {
        if matches!(c, '$' | '`' | '\\' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    shell_line(shell, &escaped)
}

/// `ssh [-i <key>] [-p <port>] <user>@<host>`
///
/// `key` is only given when the caller named one explicitly and `port` is
/// omitted when it is the standard port.
#[must_use]
pub fn ssh_prefix(user: &str, host: &str, port: u16, key: Option<&Path>) -> String {
    let mut prefix = String::from("ssh");
    if let Some(key) = key {
        prefix.push_str(&format!(" -i {}", key.display()));
    }
    if port != crate::credentials::DEFAULT_SSH_PORT {
        prefix.push_str(&format!(" -p {port}"));
    }
    prefix.push_str(&format!(" {user}@{host}"));
    prefix
}
