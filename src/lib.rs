//! # Rust Leveled Logger
//!
//! A leveled, rotating log-writing core for long-running server processes.
//!
//! ## Features
//!
//! - **Severities**: `INFO < WARNING < ERROR < FATAL`; a record is written to
//!   its own severity's sink and every lower one
//! - **Rotating files**: one file per severity, rotated on size and/or time
//! - **Verbosity**: a global `V` threshold plus per-file glob overrides
//! - **Fatal handling**: stack dump, flush and sync, then an injectable exit
//!
//! ```
//! use rust_leveled_logger::prelude::*;
//!
//! let logger = Logger::builder()
//!     .program_name("node")
//!     .vmodule("net/*=3")
//!     .build()
//!     .unwrap();
//! logger.info("listening");
//! logger.v(3).info("only when net/* or V>=3");
//! ```

pub mod appenders;
pub mod bridge;
pub mod core;
pub mod macros;

use std::sync::Arc;

pub mod prelude {
    pub use crate::appenders::{ConsoleSink, MemorySink};
    pub use crate::bridge::{copy_standard_log_to, StdLogBridge};
    pub use crate::core::{
        CallSite, Clock, ErrorHook, ExitHook, Level, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, OutputStats, Result, RotationConfig, RotationInterval, Severity, Sink,
    };
}

pub use appenders::{ConsoleSink, MemorySink, RotatingFileSink};
pub use bridge::{copy_standard_log_to, StdLogBridge};
pub use core::{
    extract_timestamp, CallSite, Clock, ErrorHook, ExitHook, Level, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, ModulePattern, OutputStats, Result, RotationConfig,
    RotationInterval, Severity, Sink, TraceLocation,
};

/// Build a logger from `config` and, if `std_log_target` is set, route the
/// `log` facade into it.
///
/// # Errors
///
/// Returns a configuration error (including an unknown `std_log_target`),
/// or an error if a `log` logger is already installed.
pub fn init(config: LoggerConfig) -> Result<Arc<Logger>> {
    let target = config.std_log_target.clone();
    let logger = Arc::new(Logger::from_config(config)?);
    if let Some(name) = target {
        copy_standard_log_to(Arc::clone(&logger), &name)?;
    }
    Ok(logger)
}
