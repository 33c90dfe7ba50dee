//! Redirection of the `log` crate facade
//!
//! Libraries that log through `log::info!` and friends are re-emitted at a
//! single severity, attributed to the file and line the record carries. The
//! record's own level only decides whether it passes the bridge's filter
//! (`Info` and above unless changed with [`StdLogBridge::with_level`]).

use crate::core::{CallSite, Logger, LoggerError, Result, Severity};
use log::{LevelFilter, Log, Metadata, Record};
use std::sync::Arc;

/// Call site used when a record carries no static file name.
const UNKNOWN_FILE: &str = "???";

/// Default filter; `debug!` and `trace!` records are not formatted.
pub const DEFAULT_LEVEL_FILTER: LevelFilter = LevelFilter::Info;

pub struct StdLogBridge {
    logger: Arc<Logger>,
    severity: Severity,
    level: LevelFilter,
}

impl StdLogBridge {
    /// Bridge `log` records into `logger` at the severity called `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a severity name. A misspelt target would
    /// silently discard output, so it fails at startup instead.
    pub fn new(logger: Arc<Logger>, name: &str) -> Self {
        match Self::try_new(logger, name) {
            Ok(bridge) => bridge,
            Err(e) => panic!("{}", e),
        }
    }

    /// # Errors
    ///
    /// Returns a configuration error naming `name` if it is not a severity.
    pub fn try_new(logger: Arc<Logger>, name: &str) -> Result<Self> {
        let severity = name.parse::<Severity>().map_err(|_| {
            LoggerError::config(
                "std_log_target",
                format!("copy_standard_log_to({:?}): unrecognized severity name", name),
            )
        })?;
        Ok(Self {
            logger,
            severity,
            level: DEFAULT_LEVEL_FILTER,
        })
    }

    /// Accept `log` records up to `level`.
    #[must_use]
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Make this the process-wide `log` logger.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::BridgeAlreadyInstalled`] if any `log` logger
    /// was installed before.
    pub fn install(self) -> Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self)).map_err(|_| LoggerError::BridgeAlreadyInstalled)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for StdLogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let site = CallSite::new(
            record.file_static().unwrap_or(UNKNOWN_FILE),
            record.line().unwrap_or(0),
        );
        self.logger.log_at(self.severity, site, record.args());
    }

    fn flush(&self) {
        self.logger.flush();
    }
}

/// Route the `log` facade into `logger` at the severity called `name`.
///
/// # Panics
///
/// Panics if `name` is not a severity name.
///
/// # Errors
///
/// Returns an error if a `log` logger is already installed.
pub fn copy_standard_log_to(logger: Arc<Logger>, name: &str) -> Result<()> {
    StdLogBridge::new(logger, name).install()
}
