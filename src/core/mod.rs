//! Core logger types and traits

pub mod config;
pub mod error;
pub mod file_name;
pub mod header;
pub mod hooks;
pub mod logger;
pub mod pattern;
pub mod rotation;
pub mod severity;
pub mod sink;
pub mod stats;
pub mod trace_location;
pub mod verbosity;

pub use config::{LoggerConfig, DEFAULT_FLUSH_INTERVAL_SECS};
pub use error::{LoggerError, Result};
pub use file_name::{extract_timestamp, parse_timestamp, FileNaming};
pub use header::{system_clock, CallSite, Clock, HeaderFormatter};
pub use hooks::{ErrorHook, ExitHook, EXIT_CODE, FATAL_EXIT_CODE};
pub use logger::{Logger, LoggerBuilder, Verbose};
pub use pattern::ModulePattern;
pub use rotation::{RotationConfig, RotationInterval, DEFAULT_MAX_SIZE};
pub use severity::{Severity, NUM_SEVERITY};
pub use sink::Sink;
pub use stats::{LogStats, OutputStats};
pub use trace_location::TraceLocation;
pub use verbosity::{Level, OverrideRule, VerbosityController};
