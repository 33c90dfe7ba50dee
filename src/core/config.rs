//! Logger configuration
//!
//! The runtime configuration surface. A CLI or config-file layer fills a
//! [`LoggerConfig`] (it deserializes from JSON) and hands it to
//! [`Logger::from_config`](super::Logger::from_config).

use super::error::{LoggerError, Result};
use super::rotation::{RotationConfig, RotationInterval, DEFAULT_MAX_SIZE};
use super::severity::Severity;
use super::trace_location::TraceLocation;
use super::verbosity::{parse_overrides, Level};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default period of the background flush.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Program name used in file names; defaults to the executable's stem.
    pub program_name: Option<String>,
    /// Candidate directories for log files, first usable one wins.
    /// Empty means the system temporary directory.
    pub log_dirs: Vec<PathBuf>,
    /// Write to the console only, never to files.
    pub to_stderr: bool,
    /// Mirror every severity to the console as well as files.
    pub also_to_stderr: bool,
    /// Severities at or above this are mirrored to the console.
    pub stderr_threshold: Option<Severity>,
    pub verbosity: Level,
    /// `pattern=N[,pattern=N...]`
    pub vmodule: String,
    /// `file.rs:N`, empty to disable.
    pub trace_location: String,
    pub min_size: u64,
    pub max_size: u64,
    pub rotation_interval: RotationInterval,
    pub colorize: bool,
    pub compress_rotated: bool,
    pub create_symlinks: bool,
    pub write_file_header: bool,
    /// Write to the console when a file sink fails.
    pub console_fallback: bool,
    /// 0 disables the background flush.
    pub flush_interval_secs: u64,
    /// Severity that receives records from the `log` crate facade.
    pub std_log_target: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            program_name: None,
            log_dirs: Vec::new(),
            to_stderr: false,
            also_to_stderr: false,
            stderr_threshold: Some(Severity::Error),
            verbosity: 0,
            vmodule: String::new(),
            trace_location: String::new(),
            min_size: 0,
            max_size: DEFAULT_MAX_SIZE,
            rotation_interval: RotationInterval::Never,
            colorize: true,
            compress_rotated: false,
            create_symlinks: true,
            write_file_header: true,
            console_fallback: true,
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            std_log_target: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every textual setting without applying anything.
    pub fn validate(&self) -> Result<()> {
        parse_overrides(&self.vmodule)?;
        TraceLocation::parse(&self.trace_location)?;
        if let Some(target) = &self.std_log_target {
            target.parse::<Severity>().map_err(|_| {
                LoggerError::config(
                    "std_log_target",
                    format!("unknown severity '{}'", target),
                )
            })?;
        }
        if self.max_size > 0 && self.min_size > self.max_size {
            return Err(LoggerError::config(
                "rotation",
                format!(
                    "min_size ({}) exceeds max_size ({})",
                    self.min_size, self.max_size
                ),
            ));
        }
        if let Some(program) = &self.program_name {
            if program.is_empty() || program.contains(['/', '\\']) {
                return Err(LoggerError::config(
                    "program_name",
                    format!("'{}' is not a valid file name component", program),
                ));
            }
        }
        Ok(())
    }

    pub fn rotation(&self) -> RotationConfig {
        RotationConfig {
            min_size: self.min_size,
            max_size: self.max_size,
            interval: self.rotation_interval,
        }
    }

    /// Whether `severity` is mirrored to the console.
    pub fn mirrors_to_console(&self, severity: Severity) -> bool {
        self.also_to_stderr
            || self
                .stderr_threshold
                .is_some_and(|threshold| severity >= threshold)
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        (self.flush_interval_secs > 0).then(|| Duration::from_secs(self.flush_interval_secs))
    }
}
