//! Log file naming
//!
//! Files are named `<program>.<host>.<user>.log.<SEVERITY>.<YYYYMMDD-HHMMSS>.<pid>`.
//! Retention tooling recovers the creation time with [`extract_timestamp`].

use super::severity::Severity;
use chrono::{DateTime, Local, NaiveDateTime};
use std::path::Path;

/// strftime layout of the timestamp embedded in file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Length of a rendered [`FILE_TIMESTAMP_FORMAT`] token.
pub const FILE_TIMESTAMP_LEN: usize = 15;

/// Identity embedded in every log file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub program: String,
    pub host: String,
    pub user: String,
    pub pid: u32,
}

impl FileNaming {
    /// Identity of the running process.
    pub fn current() -> Self {
        Self {
            program: program_name(),
            host: short_hostname(&hostname()),
            user: user_name(),
            pid: std::process::id(),
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// `<program>.<host>.<user>.log.`
    pub fn prefix(&self) -> String {
        format!("{}.{}.{}.log.", self.program, self.host, self.user)
    }

    pub fn file_name(&self, severity: Severity, created_at: &DateTime<Local>) -> String {
        format!(
            "{}{}.{}.{}",
            self.prefix(),
            severity.to_str(),
            created_at.format(FILE_TIMESTAMP_FORMAT),
            self.pid
        )
    }

    /// Name of the symlink that tracks the newest file of a severity.
    pub fn link_name(&self, severity: Severity) -> String {
        format!("{}.{}", self.program, severity.to_str())
    }
}

/// Base name of the running executable.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg| Path::new(arg).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknownprogram".to_string())
}

/// Host name with any domain part removed.
pub fn short_hostname(hostname: &str) -> String {
    match hostname.find('.') {
        Some(idx) => hostname[..idx].to_string(),
        None => hostname.to_string(),
    }
}

pub fn hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        "unknownhost".to_string()
    } else {
        name
    }
}

/// Login name, with `\` (Windows domain separator) replaced by `_`.
pub fn user_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .map(|user| user.replace('\\', "_"))
        .unwrap_or_else(|| "unknownuser".to_string())
}

/// Extract the creation timestamp token from a log file name.
///
/// The remainder after `prefix` must look like
/// `SEVERITY.YYYYMMDD-HHMMSS.pid`, optionally followed by further suffixes
/// such as `.gz` or `.gz.bak`. Returns an empty string if the prefix does not
/// match or the token is missing or malformed.
pub fn extract_timestamp(file_name: &str, prefix: &str) -> String {
    let Some(rest) = file_name.strip_prefix(prefix) else {
        return String::new();
    };
    let mut fields = rest.split('.');
    let _severity = fields.next();
    match fields.next() {
        Some(token)
            if token.len() == FILE_TIMESTAMP_LEN
                && NaiveDateTime::parse_from_str(token, FILE_TIMESTAMP_FORMAT).is_ok() =>
        {
            token.to_string()
        }
        _ => String::new(),
    }
}

/// Like [`extract_timestamp`] but parsed.
pub fn parse_timestamp(file_name: &str, prefix: &str) -> Option<NaiveDateTime> {
    let token = extract_timestamp(file_name, prefix);
    NaiveDateTime::parse_from_str(&token, FILE_TIMESTAMP_FORMAT).ok()
}
