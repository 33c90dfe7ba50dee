//! In-memory sink
//!
//! Clones share one buffer, so a test can hand a clone to the logger with
//! [`Logger::swap_sinks`](crate::Logger::swap_sinks) and read what was
//! written through the one it kept.

use crate::core::{Result, Sink};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemorySink {
    name: String,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// An `io::Write` handle onto the same buffer, e.g. for the console.
    pub fn writer(&self) -> MemoryWriter {
        MemoryWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl Sink for MemorySink {
    fn write(&mut self, bytes: &[u8], _now: DateTime<Local>) -> Result<()> {
        self.buffer.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct MemoryWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
