//! Console sink implementation

use crate::core::{LoggerError, Result, Sink};
use chrono::{DateTime, Local};
use std::io::Write;

/// Unbuffered console output, standard error by default.
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
}

impl ConsoleSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, bytes: &[u8], _now: DateTime<Local>) -> Result<()> {
        self.writer
            .write_all(bytes)
            .and_then(|_| self.writer.flush())
            .map_err(|e| LoggerError::io_operation("writing to console", "console write failed", e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
