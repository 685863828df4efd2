//! Suggested exit codes
//!
//! Runners only ever produce [`EXIT_OK`] (dry-run) and
//! [`EXIT_ERROR_EXECUTE`] (the program could not be run); the rest are for
//! callers that want a consistent vocabulary for their own exits.

/// No unrecovered error occurred
pub const EXIT_OK: i32 = 0;

/// An internal error that only makes sense to the programmer
pub const EXIT_ERROR_INTERNAL: i32 = 1;

/// Command-line usage error, such as an invalid option
pub const EXIT_ERROR_USAGE: i32 = 2;

/// The program is being used incorrectly
pub const EXIT_ERROR_USER: i32 = 3;

/// I/O error, such as a truncated write
pub const EXIT_ERROR_IO: i32 = 4;

/// Permission error, such as needing super-user access
pub const EXIT_ERROR_PERM: i32 = 5;

/// Something was invalid, such as an incorrect parameter
pub const EXIT_ERROR_INVALID: i32 = 6;

/// Something already exists
pub const EXIT_ERROR_EXISTS: i32 = 7;

/// Something cannot be found
pub const EXIT_ERROR_NOT_FOUND: i32 = 8;

/// An untrapped or invalid signal was received
pub const EXIT_ERROR_SIGNAL: i32 = 9;

/// Catch-all run-time error
pub const EXIT_ERROR_RUNTIME: i32 = 10;

/// Reported by `Runner::run` / `Runner::shell` when the command could not be
/// executed at all (missing binary, permissions, bad credentials). The error
/// text is placed in stderr.
pub const EXIT_ERROR_EXECUTE: i32 = EXIT_ERROR_INTERNAL;
