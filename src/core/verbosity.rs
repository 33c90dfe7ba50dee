//! Runtime verbosity control
//!
//! A global threshold plus an ordered set of per-file override rules. The
//! first rule whose pattern matches a call site's file decides that file's
//! effective level; otherwise the threshold applies.

use super::error::{LoggerError, Result};
use super::pattern::ModulePattern;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Verbosity level; higher is more verbose.
pub type Level = u32;

/// A per-file exception to the global threshold.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub pattern: ModulePattern,
    pub level: Level,
}

impl OverrideRule {
    pub fn new(pattern: ModulePattern, level: Level) -> Self {
        Self { pattern, level }
    }
}

/// Parse `pattern=level[,pattern=level...]` into compiled rules.
///
/// Empty entries are skipped, so the empty string yields no rules.
pub fn parse_overrides(spec: &str) -> Result<Vec<OverrideRule>> {
    let mut rules = Vec::new();
    for entry in spec.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (pattern, level) = entry.split_once('=').ok_or_else(|| {
            LoggerError::config(
                "vmodule",
                format!("expected pattern=N, got '{}'", entry),
            )
        })?;
        let (pattern, level) = (pattern.trim(), level.trim());
        if pattern.is_empty() || level.is_empty() {
            return Err(LoggerError::config(
                "vmodule",
                format!("expected pattern=N, got '{}'", entry),
            ));
        }
        let level: Level = level.parse().map_err(|_| {
            LoggerError::config(
                "vmodule",
                format!("level for '{}' is not a non-negative integer: '{}'", pattern, level),
            )
        })?;
        rules.push(OverrideRule::new(ModulePattern::compile(pattern)?, level));
    }
    Ok(rules)
}

struct VerbosityState {
    threshold: Level,
    rules: Arc<Vec<OverrideRule>>,
    spec: String,
    /// Resolved rule level per file; `None` means no rule matched.
    cache: HashMap<String, Option<Level>>,
}

pub struct VerbosityController {
    state: Mutex<VerbosityState>,
}

impl VerbosityController {
    pub fn new(threshold: Level) -> Self {
        Self {
            state: Mutex::new(VerbosityState {
                threshold,
                rules: Arc::new(Vec::new()),
                spec: String::new(),
                cache: HashMap::new(),
            }),
        }
    }

    pub fn threshold(&self) -> Level {
        self.state.lock().threshold
    }

    pub fn set_threshold(&self, level: Level) {
        self.state.lock().threshold = level;
    }

    /// The spec string of the active override set.
    pub fn overrides(&self) -> String {
        self.state.lock().spec.clone()
    }

    /// A snapshot of the active override rules in registration order.
    pub fn rules(&self) -> Arc<Vec<OverrideRule>> {
        Arc::clone(&self.state.lock().rules)
    }

    /// Replace the whole override set.
    ///
    /// Patterns are compiled before the lock is taken; on error the active
    /// set is left untouched.
    pub fn set_overrides(&self, spec: &str) -> Result<()> {
        let rules = Arc::new(parse_overrides(spec)?);
        let mut state = self.state.lock();
        state.rules = rules;
        state.spec = spec.trim().to_string();
        state.cache.clear();
        Ok(())
    }

    pub fn is_enabled(&self, level: Level, file: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.rules.is_empty() {
            return level <= state.threshold;
        }

        let resolved = match state.cache.get(file).copied() {
            Some(resolved) => resolved,
            None => {
                let resolved = state
                    .rules
                    .iter()
                    .find(|rule| rule.pattern.matches(file))
                    .map(|rule| rule.level);
                state.cache.insert(file.to_string(), resolved);
                resolved
            }
        };

        match resolved {
            Some(rule_level) => level <= rule_level,
            None => level <= state.threshold,
        }
    }
}

impl Default for VerbosityController {
    fn default() -> Self {
        Self::new(0)
    }
}
