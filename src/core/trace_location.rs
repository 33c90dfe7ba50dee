//! Trace-at-location target
//!
//! A `file.rs:N` position; log calls attributed to it get a stack trace
//! appended to their line.

use super::error::{LoggerError, Result};
use super::header::CallSite;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLocation {
    file: String,
    line: u32,
}

impl TraceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Parse a `file:line` target; the empty string means "disabled".
    pub fn parse(value: &str) -> Result<Option<Self>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn matches(&self, site: &CallSite) -> bool {
        self.line == site.line && self.file == site.short_file()
    }
}

impl FromStr for TraceLocation {
    type Err = LoggerError;

    fn from_str(value: &str) -> Result<Self> {
        let syntax = || {
            LoggerError::config(
                "trace_location",
                format!("syntax error in '{}': expect file.rs:234", value),
            )
        };
        let (file, line) = value.split_once(':').ok_or_else(syntax)?;
        if line.contains(':') || !file.contains('.') {
            return Err(syntax());
        }
        let line: i64 = line.trim().parse().map_err(|_| syntax())?;
        if line <= 0 {
            return Err(LoggerError::config(
                "trace_location",
                format!("negative or zero line number in '{}'", value),
            ));
        }
        let line = u32::try_from(line).map_err(|_| syntax())?;
        let file = super::header::short_file_name(file.trim());
        Ok(Self::new(file, line))
    }
}

impl fmt::Display for TraceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
