//! Injectable process-level strategies
//!
//! Logging never returns errors to its caller; sink failures go to the error
//! hook instead. Fatal records end in the exit hook, which tests replace so
//! the test process survives.

use super::error::LoggerError;
use std::sync::Arc;

/// Receives sink failures.
pub type ErrorHook = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Terminates the process with the given status.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Exit status after a fatal record.
pub const FATAL_EXIT_CODE: i32 = 255;

/// Exit status after an `exit` record.
pub const EXIT_CODE: i32 = 1;

pub fn default_error_hook() -> ErrorHook {
    Arc::new(|err| eprintln!("[LOGGER ERROR] {}", err))
}

pub fn default_exit_hook() -> ExitHook {
    Arc::new(|code| std::process::exit(code))
}
