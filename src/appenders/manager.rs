//! Per-severity sink table
//!
//! One slot per severity, each behind its own lock. A write at severity `S`
//! goes to slot `S` and then to every lower slot, one lock at a time. File
//! sinks are created lazily on the first write to their slot.

use super::console::ConsoleSink;
use super::rotating_file::{FileSettings, RotatingFileSink};
use crate::core::hooks::{default_error_hook, ErrorHook};
use crate::core::{LogStats, LoggerError, RotationConfig, Severity, Sink, NUM_SEVERITY};
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type SinkSlot = Option<Box<dyn Sink>>;

pub struct SinkManager {
    slots: [Mutex<SinkSlot>; NUM_SEVERITY],
    console: Mutex<Box<dyn Sink>>,
    console_mirror: [AtomicBool; NUM_SEVERITY],
    to_stderr: AtomicBool,
    console_fallback: bool,
    settings: Arc<FileSettings>,
    on_error: RwLock<ErrorHook>,
    stats: LogStats,
}

impl SinkManager {
    pub fn new(settings: FileSettings) -> Self {
        Self {
            slots: Default::default(),
            console: Mutex::new(Box::new(ConsoleSink::stderr())),
            console_mirror: Default::default(),
            to_stderr: AtomicBool::new(false),
            console_fallback: true,
            settings: Arc::new(settings),
            on_error: RwLock::new(default_error_hook()),
            stats: LogStats::new(),
        }
    }

    #[must_use]
    pub fn with_console(self, console: Box<dyn Sink>) -> Self {
        *self.console.lock() = console;
        self
    }

    #[must_use]
    pub fn with_console_fallback(mut self, enabled: bool) -> Self {
        self.console_fallback = enabled;
        self
    }

    pub fn set_console_mirror(&self, severity: Severity, enabled: bool) {
        self.console_mirror[severity.index()].store(enabled, Ordering::Relaxed);
    }

    pub fn console_mirror(&self, severity: Severity) -> bool {
        self.console_mirror[severity.index()].load(Ordering::Relaxed)
    }

    /// Route everything to the console and nothing to files.
    pub fn set_to_stderr(&self, enabled: bool) {
        self.to_stderr.store(enabled, Ordering::Relaxed);
    }

    pub fn to_stderr(&self) -> bool {
        self.to_stderr.load(Ordering::Relaxed)
    }

    pub fn set_error_hook(&self, hook: ErrorHook) {
        *self.on_error.write() = hook;
    }

    pub fn set_rotation(&self, rotation: RotationConfig) {
        *self.settings.rotation.write() = rotation;
    }

    pub fn rotation(&self) -> RotationConfig {
        *self.settings.rotation.read()
    }

    pub fn stats(&self) -> &LogStats {
        &self.stats
    }

    /// Report a failure through the error hook.
    pub fn report(&self, err: &LoggerError) {
        let hook = Arc::clone(&*self.on_error.read());
        hook(err);
    }

    /// Write one rendered record at `severity`, cascading to lower slots.
    ///
    /// Returns whether the record reached at least one destination.
    pub fn write(&self, severity: Severity, bytes: &[u8], now: DateTime<Local>) -> bool {
        if self.to_stderr() {
            let written = self.write_console(bytes, now);
            if written {
                self.stats.severity(severity).record(bytes.len());
            } else {
                self.stats.record_dropped();
            }
            return written;
        }

        let mut on_console = self.console_mirror(severity) && self.write_console(bytes, now);
        let mut failed = false;
        let mut any_file = false;
        for target in severity.cascade() {
            if self.write_slot(target, bytes, now) {
                any_file = true;
            } else {
                failed = true;
            }
        }

        if failed && !on_console && self.console_fallback {
            on_console = self.write_console(bytes, now);
        }

        if any_file || on_console {
            self.stats.severity(severity).record(bytes.len());
        }
        if failed && !on_console {
            self.stats.record_dropped();
        }
        any_file || on_console
    }

    /// Write `bytes` to the console and to every slot, without cascading
    /// bookkeeping. Used for stack traces appended to fatal records.
    pub fn write_all_slots(&self, bytes: &[u8], now: DateTime<Local>) {
        self.write_console(bytes, now);
        if self.to_stderr() {
            return;
        }
        for target in Severity::Fatal.cascade() {
            self.write_slot(target, bytes, now);
        }
    }

    fn write_slot(&self, target: Severity, bytes: &[u8], now: DateTime<Local>) -> bool {
        let outcome = {
            let mut slot = self.slots[target.index()].lock();
            if slot.is_none() {
                match RotatingFileSink::create(target, Arc::clone(&self.settings), now) {
                    Ok(sink) => *slot = Some(Box::new(sink)),
                    Err(e) => {
                        drop(slot);
                        self.report(&e);
                        return false;
                    }
                }
            }
            match slot.as_mut() {
                Some(sink) => sink.write(bytes, now).map(|_| sink.take_error()),
                None => Ok(None),
            }
        };

        match outcome {
            Ok(deferred) => {
                if let Some(e) = deferred {
                    self.report(&e);
                }
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    fn write_console(&self, bytes: &[u8], now: DateTime<Local>) -> bool {
        let result = self.console.lock().write(bytes, now);
        match result {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Flush every sink, one lock at a time; with `sync` also commit files to
    /// stable storage.
    pub fn flush_all(&self, sync: bool) {
        for severity in Severity::Fatal.cascade() {
            let result = {
                let mut slot = self.slots[severity.index()].lock();
                match slot.as_mut() {
                    Some(sink) if sync => sink.sync(),
                    Some(sink) => sink.flush(),
                    None => Ok(()),
                }
            };
            if let Err(e) = result {
                self.report(&e);
            }
        }
        let result = self.console.lock().flush();
        if let Err(e) = result {
            self.report(&e);
        }
    }

    /// Replace the whole sink table, returning the previous one.
    pub fn swap(&self, sinks: [SinkSlot; NUM_SEVERITY]) -> [SinkSlot; NUM_SEVERITY] {
        let mut previous: [SinkSlot; NUM_SEVERITY] = Default::default();
        for (index, sink) in sinks.into_iter().enumerate() {
            previous[index] = std::mem::replace(&mut *self.slots[index].lock(), sink);
        }
        previous
    }

    /// Run `f` against the sink currently in `severity`'s slot.
    pub fn with_sink<R>(&self, severity: Severity, f: impl FnOnce(Option<&mut dyn Sink>) -> R) -> R {
        let mut slot = self.slots[severity.index()].lock();
        match slot.as_mut() {
            Some(sink) => f(Some(sink.as_mut())),
            None => f(None),
        }
    }
}
