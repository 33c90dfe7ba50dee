//! Rotation policy for per-severity log files
//!
//! Decides, before each write, whether the active file must be replaced.
//! Size and interval triggers are independent; either one is sufficient.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default size ceiling (1800 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024 * 1800;

/// Calendar-interval rotation.
///
/// `Monthly` is a fixed 30-day window, not a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationInterval {
    #[default]
    Never,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl RotationInterval {
    /// Length of one interval, `None` for `Never`.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        const HOUR: u64 = 60 * 60;
        match self {
            RotationInterval::Never => None,
            RotationInterval::Hourly => Some(Duration::from_secs(HOUR)),
            RotationInterval::Daily => Some(Duration::from_secs(24 * HOUR)),
            RotationInterval::Weekly => Some(Duration::from_secs(7 * 24 * HOUR)),
            RotationInterval::Monthly => Some(Duration::from_secs(30 * 24 * HOUR)),
        }
    }
}

impl std::str::FromStr for RotationInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" | "" => Ok(RotationInterval::Never),
            "hourly" => Ok(RotationInterval::Hourly),
            "daily" => Ok(RotationInterval::Daily),
            "weekly" => Ok(RotationInterval::Weekly),
            "monthly" => Ok(RotationInterval::Monthly),
            _ => Err(format!("Invalid rotation interval: '{}'", s)),
        }
    }
}

/// Rotation thresholds
///
/// # Examples
///
/// ```
/// use rust_leveled_logger::core::{RotationConfig, RotationInterval};
///
/// // Rotate daily, or early once the file passes 64 MiB
/// // (but never a file still below 1 MiB).
/// let config = RotationConfig::new()
///     .with_min_size(1024 * 1024)
///     .with_max_size(64 * 1024 * 1024)
///     .with_interval(RotationInterval::Daily);
/// assert_eq!(config.interval, RotationInterval::Daily);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Files smaller than this never rotate on size grounds.
    pub min_size: u64,
    /// Files that would grow past this rotate; 0 disables the size trigger.
    pub max_size: u64,
    pub interval: RotationInterval,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: DEFAULT_MAX_SIZE,
            interval: RotationInterval::Never,
        }
    }
}

impl RotationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_interval(mut self, interval: RotationInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Whether a file holding `nbytes`, created at `created_at`, must be
    /// rotated before `pending_len` more bytes are written at `now`.
    #[must_use]
    pub fn should_rotate(
        &self,
        nbytes: u64,
        pending_len: usize,
        created_at: DateTime<Local>,
        now: DateTime<Local>,
    ) -> bool {
        if nbytes == 0 {
            return false;
        }

        let size_exceeded = self.max_size > 0
            && nbytes >= self.min_size
            && nbytes.saturating_add(pending_len as u64) > self.max_size;

        let interval_elapsed = match self.interval.duration() {
            Some(interval) => now
                .signed_duration_since(created_at)
                .to_std()
                .map(|elapsed| elapsed >= interval)
                .unwrap_or(false),
            None => false,
        };

        size_exceeded || interval_elapsed
    }
}
