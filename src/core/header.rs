//! Log line header rendering
//!
//! Every line starts with a fixed-width header:
//!
//! ```text
//! Lmmdd hh:mm:ss.uuuuuu ppppppp file:line] msg
//! ```
//!
//! where `L` is the severity character (optionally wrapped in ANSI color),
//! `ppppppp` the process id right-aligned in seven columns and `file` the base
//! name of the call site's source file.

use super::severity::{Severity, COLOR_RESET};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fmt::{self, Write as _};
use std::panic::Location;
use std::sync::Arc;

/// Pluggable time source.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Local::now)
}

/// Source position a log line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// The call site of the nearest caller not marked `#[track_caller]`.
    ///
    /// Wrapper functions that log on behalf of their caller should be marked
    /// `#[track_caller]` themselves, or capture this and pass it to one of the
    /// `*_at` entry points.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// Last path component of `file`.
    pub fn short_file(&self) -> &'static str {
        short_file_name(self.file)
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// Base name of a source path, accepting either separator.
pub fn short_file_name(file: &str) -> &str {
    match file.rfind(['/', '\\']) {
        Some(idx) => &file[idx + 1..],
        None => file,
    }
}

#[derive(Clone)]
pub struct HeaderFormatter {
    clock: Clock,
    pid: u32,
    colorize: bool,
}

impl HeaderFormatter {
    pub fn new() -> Self {
        Self {
            clock: system_clock(),
            pid: std::process::id(),
            colorize: true,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn now(&self) -> DateTime<Local> {
        (self.clock)()
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    /// Render the header for a line written at `now`.
    pub fn header(&self, severity: Severity, site: &CallSite, now: &DateTime<Local>) -> String {
        let mut buf = String::with_capacity(64);
        if self.colorize {
            buf.push_str(&severity.color_start());
            buf.push(severity.to_char());
            buf.push_str(COLOR_RESET);
        } else {
            buf.push(severity.to_char());
        }
        // Writing into a String cannot fail.
        let _ = write!(
            buf,
            "{:02}{:02} {:02}:{:02}:{:02}.{:06} {:>7} {}:{}] ",
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            now.nanosecond() % 1_000_000_000 / 1_000,
            self.pid,
            site.short_file(),
            site.line
        );
        buf
    }

    /// Render a complete line: header, message and a trailing newline if the
    /// message lacks one.
    pub fn format(
        &self,
        severity: Severity,
        site: &CallSite,
        now: &DateTime<Local>,
        message: impl fmt::Display,
    ) -> String {
        let mut line = self.header(severity, site, now);
        let _ = write!(line, "{}", message);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        line
    }
}

impl Default for HeaderFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeaderFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderFormatter")
            .field("pid", &self.pid)
            .field("colorize", &self.colorize)
            .finish_non_exhaustive()
    }
}
