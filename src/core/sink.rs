//! Sink trait for per-severity output destinations

use super::error::{LoggerError, Result};
use chrono::{DateTime, Local};

pub trait Sink: Send {
    /// Append one rendered record. `now` is the record's timestamp, used by
    /// sinks that rotate on time.
    fn write(&mut self, bytes: &[u8], now: DateTime<Local>) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Flush and commit to stable storage.
    fn sync(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;

    /// A non-fatal failure from the last write (the record itself was
    /// written), e.g. a rotation that could not open the next file.
    fn take_error(&mut self) -> Option<LoggerError> {
        None
    }
}
