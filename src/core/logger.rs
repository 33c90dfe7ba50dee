//! Main logger implementation
//!
//! A [`Logger`] is an explicitly constructed logging context: it owns the
//! per-severity sinks, the verbosity controller, the trace-at-location
//! target, the header formatter with its clock, and the exit hook. Share it
//! with `Arc` rather than through a global.

use super::{
    config::LoggerConfig,
    error::Result,
    file_name::FileNaming,
    header::{CallSite, Clock, HeaderFormatter},
    hooks::{default_exit_hook, ErrorHook, ExitHook, EXIT_CODE, FATAL_EXIT_CODE},
    rotation::RotationConfig,
    severity::{Severity, NUM_SEVERITY},
    sink::Sink,
    stats::OutputStats,
    trace_location::TraceLocation,
    verbosity::{Level, VerbosityController},
};
use crate::appenders::manager::{SinkManager, SinkSlot};
use crate::appenders::rotating_file::FileSettings;
use crate::appenders::ConsoleSink;
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::backtrace::Backtrace;
use std::fmt::{self, Display, Write as _};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Background thread that flushes every sink on a fixed period.
struct FlushDaemon {
    shutdown: Sender<()>,
    handle: thread::JoinHandle<()>,
}

impl FlushDaemon {
    fn spawn(sinks: Arc<SinkManager>, interval: Duration) -> Result<Self> {
        let (shutdown, receiver) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("log-flush".to_string())
            .spawn(move || loop {
                match receiver.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sinks.flush_all(false),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self { shutdown, handle })
    }

    fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.join() {
            eprintln!("[LOGGER ERROR] Flush thread panicked during shutdown: {:?}", e);
        }
    }
}

pub struct Logger {
    sinks: Arc<SinkManager>,
    verbosity: VerbosityController,
    trace_location: RwLock<Option<TraceLocation>>,
    formatter: RwLock<HeaderFormatter>,
    on_exit: RwLock<ExitHook>,
    flusher: Mutex<Option<FlushDaemon>>,
}

impl Logger {
    /// A logger with default settings: files in the system temporary
    /// directory, errors mirrored to stderr, verbosity 0.
    #[must_use]
    pub fn new() -> Self {
        Self::assemble(&LoggerConfig::default(), LoggerBuilder::new())
    }

    /// Build a logger from a configuration, validating it first.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any textual setting is malformed;
    /// nothing is started in that case.
    pub fn from_config(config: LoggerConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_leveled_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .verbosity(2)
    ///     .vmodule("net/*=4")
    ///     .build()
    ///     .unwrap();
    /// assert!(logger.verbosity() == 2);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn assemble(config: &LoggerConfig, parts: LoggerBuilder) -> Self {
        let mut naming = parts.naming.unwrap_or_else(FileNaming::current);
        if let Some(program) = &config.program_name {
            naming.program = program.clone();
        }
        let mut settings = FileSettings::new(naming);
        settings.log_dirs = config.log_dirs.clone();
        settings.rotation = RwLock::new(config.rotation());
        settings.compress = config.compress_rotated;
        settings.symlinks = config.create_symlinks;
        settings.file_header = config.write_file_header;

        let console = parts
            .console
            .unwrap_or_else(|| Box::new(ConsoleSink::stderr()));
        let sinks = SinkManager::new(settings)
            .with_console(console)
            .with_console_fallback(config.console_fallback);
        sinks.set_to_stderr(config.to_stderr);
        for severity in Severity::ALL {
            sinks.set_console_mirror(severity, config.mirrors_to_console(severity));
        }
        if let Some(hook) = parts.error_hook {
            sinks.set_error_hook(hook);
        }
        let sinks = Arc::new(sinks);

        let mut formatter = HeaderFormatter::new().with_colors(config.colorize);
        if let Some(clock) = parts.clock {
            formatter = formatter.with_clock(clock);
        }
        if let Some(pid) = parts.pid {
            formatter = formatter.with_pid(pid);
        }

        let flusher = config.flush_interval().and_then(|interval| {
            match FlushDaemon::spawn(Arc::clone(&sinks), interval) {
                Ok(daemon) => Some(daemon),
                Err(e) => {
                    sinks.report(&e);
                    None
                }
            }
        });

        Self {
            sinks,
            verbosity: VerbosityController::new(config.verbosity),
            trace_location: RwLock::new(None),
            formatter: RwLock::new(formatter),
            on_exit: RwLock::new(parts.exit_hook.unwrap_or_else(default_exit_hook)),
            flusher: Mutex::new(flusher),
        }
    }

    /// Write `message` at `severity`, attributed to the caller.
    #[track_caller]
    pub fn log(&self, severity: Severity, message: impl Display) {
        self.log_at(severity, CallSite::caller(), message);
    }

    /// Write `message` at `severity`, attributed to `site`.
    ///
    /// This is the entry point for wrappers that log on behalf of their own
    /// caller. A fatal record terminates the process through the exit hook.
    pub fn log_at(&self, severity: Severity, site: CallSite, message: impl Display) {
        let now = self.emit(severity, &site, message);
        if severity == Severity::Fatal {
            self.terminate(now, FATAL_EXIT_CODE, true);
        }
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, message: impl Display) {
        self.log_at(Severity::Info, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn warning(&self, message: impl Display) {
        self.log_at(Severity::Warning, CallSite::caller(), message);
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, message: impl Display) {
        self.log_at(Severity::Error, CallSite::caller(), message);
    }

    /// Write at `Fatal`, dump the current thread's stack to every sink,
    /// flush and sync everything, then exit with status 255.
    #[track_caller]
    #[inline]
    pub fn fatal(&self, message: impl Display) {
        self.log_at(Severity::Fatal, CallSite::caller(), message);
    }

    /// Like [`fatal`](Self::fatal) but without the stack dump, exiting with
    /// status 1.
    #[track_caller]
    pub fn exit(&self, message: impl Display) {
        self.exit_at(CallSite::caller(), message);
    }

    pub fn info_at(&self, site: CallSite, message: impl Display) {
        self.log_at(Severity::Info, site, message);
    }

    pub fn warning_at(&self, site: CallSite, message: impl Display) {
        self.log_at(Severity::Warning, site, message);
    }

    pub fn error_at(&self, site: CallSite, message: impl Display) {
        self.log_at(Severity::Error, site, message);
    }

    pub fn fatal_at(&self, site: CallSite, message: impl Display) {
        self.log_at(Severity::Fatal, site, message);
    }

    pub fn exit_at(&self, site: CallSite, message: impl Display) {
        let now = self.emit(Severity::Fatal, &site, message);
        self.terminate(now, EXIT_CODE, false);
    }

    /// Level-gated logging for the caller's source file.
    ///
    /// ```
    /// # use rust_leveled_logger::prelude::*;
    /// # let logger = Logger::builder().to_stderr(true).build().unwrap();
    /// let v = logger.v(2);
    /// if v.enabled() {
    ///     v.info("expensive detail");
    /// }
    /// ```
    #[track_caller]
    pub fn v(&self, level: Level) -> Verbose<'_> {
        Verbose {
            logger: self,
            enabled: self.v_enabled_at(level, &CallSite::caller()),
        }
    }

    /// Whether a `v(level)` call attributed to `site` would write.
    pub fn v_enabled_at(&self, level: Level, site: &CallSite) -> bool {
        self.verbosity.is_enabled(level, site.file)
    }

    /// Render and write one record, returning its timestamp.
    fn emit(&self, severity: Severity, site: &CallSite, message: impl Display) -> DateTime<Local> {
        let formatter = self.formatter.read().clone();
        let now = formatter.now();
        let mut line = formatter.format(severity, site, &now, message);

        let traced = self
            .trace_location
            .read()
            .as_ref()
            .is_some_and(|target| target.matches(site));
        if traced {
            line.push_str(&stack_trace());
        }

        self.sinks.write(severity, line.as_bytes(), now);
        now
    }

    fn terminate(&self, now: DateTime<Local>, status: i32, with_trace: bool) {
        if with_trace {
            self.sinks.write_all_slots(stack_trace().as_bytes(), now);
        }
        self.sinks.flush_all(true);
        let hook = Arc::clone(&*self.on_exit.read());
        hook(status);
    }

    /// Flush every sink's buffer to the operating system.
    pub fn flush(&self) {
        self.sinks.flush_all(false);
    }

    /// Flush every sink and commit files to stable storage.
    pub fn sync(&self) {
        self.sinks.flush_all(true);
    }

    /// Stop the background flush and sync every sink.
    ///
    /// Logging keeps working afterwards; only the periodic flush is gone.
    pub fn shutdown(&self) {
        if let Some(daemon) = self.flusher.lock().take() {
            daemon.stop();
        }
        self.sinks.flush_all(true);
    }

    pub fn verbosity(&self) -> Level {
        self.verbosity.threshold()
    }

    pub fn set_verbosity(&self, level: Level) {
        self.verbosity.set_threshold(level);
    }

    /// The active override spec, as last set.
    pub fn vmodule(&self) -> String {
        self.verbosity.overrides()
    }

    /// Replace the per-file verbosity overrides.
    ///
    /// # Errors
    ///
    /// Returns a pattern or configuration error; the active overrides are
    /// unchanged in that case.
    pub fn set_vmodule(&self, spec: &str) -> Result<()> {
        self.verbosity.set_overrides(spec)
    }

    pub fn trace_location(&self) -> Option<TraceLocation> {
        self.trace_location.read().clone()
    }

    /// Set the `file.rs:N` target whose records get a stack trace; an empty
    /// string disables it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on malformed input, leaving the active
    /// target unchanged.
    pub fn set_trace_location(&self, value: &str) -> Result<()> {
        let location = TraceLocation::parse(value)?;
        *self.trace_location.write() = location;
        Ok(())
    }

    pub fn set_clock(&self, clock: Clock) {
        let mut formatter = self.formatter.write();
        *formatter = formatter.clone().with_clock(clock);
    }

    pub fn set_pid(&self, pid: u32) {
        let mut formatter = self.formatter.write();
        *formatter = formatter.clone().with_pid(pid);
    }

    pub fn set_colors(&self, colorize: bool) {
        let mut formatter = self.formatter.write();
        *formatter = formatter.clone().with_colors(colorize);
    }

    pub fn set_exit_hook(&self, hook: ExitHook) {
        *self.on_exit.write() = hook;
    }

    pub fn set_error_hook(&self, hook: ErrorHook) {
        self.sinks.set_error_hook(hook);
    }

    pub fn rotation(&self) -> RotationConfig {
        self.sinks.rotation()
    }

    /// Applies to every file sink from its next write on.
    pub fn set_rotation(&self, rotation: RotationConfig) {
        self.sinks.set_rotation(rotation);
    }

    pub fn set_console_mirror(&self, severity: Severity, enabled: bool) {
        self.sinks.set_console_mirror(severity, enabled);
    }

    pub fn set_to_stderr(&self, enabled: bool) {
        self.sinks.set_to_stderr(enabled);
    }

    /// Lines and bytes written for records that originated at `severity`.
    pub fn stats(&self, severity: Severity) -> &OutputStats {
        self.sinks.stats().severity(severity)
    }

    /// Records that reached no destination at all.
    pub fn dropped_count(&self) -> u64 {
        self.sinks.stats().dropped_count()
    }

    /// Replace the whole sink table and return the previous one.
    ///
    /// Empty slots are filled with rotating files on their next write.
    pub fn swap_sinks(&self, sinks: [SinkSlot; NUM_SEVERITY]) -> [SinkSlot; NUM_SEVERITY] {
        self.sinks.swap(sinks)
    }

    /// Install the same kind of sink in every slot, e.g. clones of one
    /// [`MemorySink`](crate::appenders::MemorySink) per severity.
    pub fn swap_sinks_with<S, F>(&self, mut make: F) -> [SinkSlot; NUM_SEVERITY]
    where
        S: Sink + 'static,
        F: FnMut(Severity) -> S,
    {
        let table = Severity::ALL.map(|severity| Some(Box::new(make(severity)) as Box<dyn Sink>));
        self.swap_sinks(table)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity.threshold())
            .field("vmodule", &self.verbosity.overrides())
            .field("trace_location", &*self.trace_location.read())
            .finish_non_exhaustive()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Some(daemon) = self.flusher.get_mut().take() {
            daemon.stop();
        }
        self.sinks.flush_all(false);
    }
}

/// Result of [`Logger::v`].
pub struct Verbose<'a> {
    logger: &'a Logger,
    enabled: bool,
}

impl Verbose<'_> {
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Write at `Info` if enabled; `message` is not formatted otherwise.
    #[track_caller]
    pub fn info(&self, message: impl Display) {
        if self.enabled {
            self.logger.log_at(Severity::Info, CallSite::caller(), message);
        }
    }

    pub fn info_at(&self, site: CallSite, message: impl Display) {
        if self.enabled {
            self.logger.log_at(Severity::Info, site, message);
        }
    }
}

/// Stack of the calling thread, framed for appending to a record.
fn stack_trace() -> String {
    let thread = thread::current();
    let mut trace = String::with_capacity(1024);
    let _ = writeln!(
        trace,
        "stack trace of thread {} ({:?}):",
        thread.name().unwrap_or("<unnamed>"),
        thread.id()
    );
    let _ = writeln!(trace, "{}", Backtrace::force_capture());
    trace
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_leveled_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .program_name("node")
///     .log_dir(std::env::temp_dir())
///     .rotation(RotationConfig::new().with_interval(RotationInterval::Daily))
///     .error_hook(Arc::new(|err| eprintln!("logging failed: {}", err)))
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    naming: Option<FileNaming>,
    clock: Option<Clock>,
    pid: Option<u32>,
    console: Option<Box<dyn Sink>>,
    exit_hook: Option<ExitHook>,
    error_hook: Option<ErrorHook>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            naming: None,
            clock: None,
            pid: None,
            console: None,
            exit_hook: None,
            error_hook: None,
        }
    }

    /// Start from a whole configuration; later calls refine it.
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.config.program_name = Some(name.into());
        self
    }

    /// Add a candidate log directory; the first usable one wins.
    #[must_use = "builder methods return a new value"]
    pub fn log_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.log_dirs.push(dir.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn verbosity(mut self, level: Level) -> Self {
        self.config.verbosity = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn vmodule(mut self, spec: impl Into<String>) -> Self {
        self.config.vmodule = spec.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn trace_location(mut self, value: impl Into<String>) -> Self {
        self.config.trace_location = value.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn rotation(mut self, rotation: RotationConfig) -> Self {
        self.config.min_size = rotation.min_size;
        self.config.max_size = rotation.max_size;
        self.config.rotation_interval = rotation.interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn to_stderr(mut self, enabled: bool) -> Self {
        self.config.to_stderr = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn also_to_stderr(mut self, enabled: bool) -> Self {
        self.config.also_to_stderr = enabled;
        self
    }

    /// Severities at or above `threshold` are mirrored to the console;
    /// `None` mirrors nothing.
    #[must_use = "builder methods return a new value"]
    pub fn stderr_threshold(mut self, threshold: Option<Severity>) -> Self {
        self.config.stderr_threshold = threshold;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, colorize: bool) -> Self {
        self.config.colorize = colorize;
        self
    }

    /// Period of the background flush; zero disables it.
    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_secs = interval.as_secs();
        self
    }

    /// Identity used in file names instead of the running process's.
    #[must_use = "builder methods return a new value"]
    pub fn file_naming(mut self, naming: FileNaming) -> Self {
        self.naming = Some(naming);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Destination for console output instead of standard error.
    #[must_use = "builder methods return a new value"]
    pub fn console<S: Sink + 'static>(mut self, console: S) -> Self {
        self.console = Some(Box::new(console));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn exit_hook(mut self, hook: ExitHook) -> Self {
        self.exit_hook = Some(hook);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_hook(mut self, hook: ErrorHook) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the assembled configuration does not
    /// validate.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;
        let config = self.config.clone();
        let logger = Logger::assemble(&config, self);
        logger.set_vmodule(&config.vmodule)?;
        logger.set_trace_location(&config.trace_location)?;
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
