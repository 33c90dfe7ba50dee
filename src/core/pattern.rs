//! Glob patterns for per-file verbosity overrides
//!
//! A pattern names source files by a path suffix. It is compiled once into an
//! anchored regular expression:
//!
//! - `foo/bar/x.rs` matches only paths ending in `/foo/bar/x.rs`
//! - `foo/*/x.rs` matches `/foo/x.rs` and `/foo/<any dirs>/x.rs`
//! - `foo/*` matches any `.rs` file below a `foo` directory
//! - `foo` (no extension) matches `/foo.rs` and any `.rs` file below `foo/`
//!
//! `*` inside a segment matches any run of non-separator characters and `\`
//! escapes the following character.

use super::error::{LoggerError, Result};
use regex::Regex;
use std::fmt;

/// Extension appended when the final segment carries none.
pub const DEFAULT_SOURCE_EXTENSION: &str = "rs";

#[derive(Clone)]
pub struct ModulePattern {
    source: String,
    regex: Regex,
}

impl ModulePattern {
    /// Compile a glob using the default `.rs` source extension.
    pub fn compile(glob: &str) -> Result<Self> {
        Self::compile_with_extension(glob, DEFAULT_SOURCE_EXTENSION)
    }

    pub fn compile_with_extension(glob: &str, extension: &str) -> Result<Self> {
        let expression = render(glob, extension)?;
        let regex = Regex::new(&expression)
            .map_err(|e| LoggerError::pattern(glob, e.to_string()))?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    /// The glob this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled regular expression.
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `path` (a call site's source path) belongs to this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        if normalized.starts_with('/') {
            self.regex.is_match(&normalized)
        } else {
            self.regex.is_match(&format!("/{}", normalized))
        }
    }
}

impl fmt::Debug for ModulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModulePattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn render(glob: &str, extension: &str) -> Result<String> {
    let trimmed = glob.trim();
    if trimmed.is_empty() {
        return Err(LoggerError::pattern(glob, "empty pattern"));
    }
    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let segments: Vec<&str> = body.split('/').collect();
    let ext = format!("\\.{}", regex::escape(extension));

    let mut out = String::from(".*");
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(LoggerError::pattern(glob, "empty path segment"));
        }
        let is_last = i + 1 == segments.len();
        if *segment == "*" {
            out.push_str("(/.*)?");
            if is_last {
                out.push_str("/[^/]+");
                out.push_str(&ext);
            }
            continue;
        }

        let (rendered, has_extension) = render_segment(glob, segment)?;
        out.push('/');
        out.push_str(&rendered);
        if is_last && !has_extension {
            out.push_str("((/.*)?/[^/]+)?");
            out.push_str(&ext);
        }
    }
    out.push('$');
    Ok(out)
}

/// Renders one segment, reporting whether it contains an unescaped `.`.
fn render_segment(glob: &str, segment: &str) -> Result<(String, bool)> {
    let mut out = String::new();
    let mut has_extension = false;
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| LoggerError::pattern(glob, "trailing escape character"))?;
                out.push_str(&regex::escape(escaped.encode_utf8(&mut [0u8; 4])));
            }
            '*' => out.push_str("[^/]*"),
            '.' => {
                has_extension = true;
                out.push_str("\\.");
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    Ok((out, has_extension))
}
