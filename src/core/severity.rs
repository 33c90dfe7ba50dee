//! Severity definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of severities; sink tables are indexed by `Severity as usize`.
pub const NUM_SEVERITY: usize = 4;

/// ANSI sequence that ends a colored severity character.
pub const COLOR_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info = 0,
    Warning = 1,
    Error = 2,
    Fatal = 3,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; NUM_SEVERITY] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Single character that starts every header line.
    pub fn to_char(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Severity::Info => Green,
            Severity::Warning => Yellow,
            Severity::Error => Red,
            Severity::Fatal => BrightRed,
        }
    }

    /// ANSI sequence that starts a colored severity character.
    pub fn color_start(&self) -> String {
        format!("\x1b[{}m", self.color_code().to_fg_str())
    }

    /// This severity and every lower one, highest first.
    ///
    /// This is the order a cascaded write visits the sinks.
    pub fn cascade(self) -> impl Iterator<Item = Severity> {
        Self::ALL.into_iter().rev().filter(move |s| *s <= self)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "FATAL" => Ok(Severity::Fatal),
            _ => Err(format!("Invalid severity: '{}'", s)),
        }
    }
}
