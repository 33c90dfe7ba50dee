//! Logging macros for ergonomic log message formatting.
//!
//! These macros take the logger as their first argument and format like
//! `format!`, but lazily: the arguments are only rendered when the line is
//! actually written. Lines are attributed to the macro's call site.
//!
//! # Examples
//!
//! ```
//! use rust_leveled_logger::prelude::*;
//! use rust_leveled_logger::{info, vlog};
//!
//! let logger = Logger::builder().to_stderr(true).build().unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Only formatted when V(2) is enabled for this file
//! vlog!(logger, 2, "peer table: {:?}", vec![1, 2, 3]);
//! ```

/// Log a message at the given severity.
///
/// # Examples
///
/// ```
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::builder().to_stderr(true).build().unwrap();
/// use rust_leveled_logger::log;
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {
        $logger.log($severity, format_args!($($arg)+))
    };
}

/// Log an info-level message.
///
/// ```
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::builder().to_stderr(true).build().unwrap();
/// use rust_leveled_logger::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a fatal message, dump the stack and exit with status 255.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Fatal, $($arg)+)
    };
}

/// Log a fatal message and exit with status 1, without a stack dump.
#[macro_export]
macro_rules! exit {
    ($logger:expr, $($arg:tt)+) => {
        $logger.exit(format_args!($($arg)+))
    };
}

/// Log at info if verbosity `level` is enabled for the calling file.
///
/// The arguments are not evaluated when the level is disabled.
///
/// ```
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::builder().to_stderr(true).build().unwrap();
/// use rust_leveled_logger::vlog;
/// vlog!(logger, 3, "cache miss for {}", "key");
/// ```
#[macro_export]
macro_rules! vlog {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let verbose = $logger.v($level);
        if verbose.enabled() {
            verbose.info(format_args!($($arg)+));
        }
    }};
}
