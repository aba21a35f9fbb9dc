//! Run configuration built from the command line.

use std::time::Duration;
use thiserror::Error;

/// Default poll interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// What a run does with its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Sample once, print, exit.
    OneShot,
    /// Poll forever, printing every tick.
    Unbounded,
    /// Poll until corrected idle time reaches the given milliseconds.
    Target(u64),
}

impl RunMode {
    /// Build a polling mode from a target in milliseconds (0 means no target).
    pub fn from_target(target_ms: u64) -> Self {
        if target_ms == 0 {
            Self::Unbounded
        } else {
            Self::Target(target_ms)
        }
    }

    /// Get the target, if this mode has one.
    pub fn target_ms(self) -> Option<u64> {
        match self {
            Self::Target(ms) => Some(ms),
            Self::OneShot | Self::Unbounded => None,
        }
    }

    pub fn is_one_shot(self) -> bool {
        self == Self::OneShot
    }
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// One-shot, unbounded or target mode.
    pub mode: RunMode,

    /// Milliseconds to wait before each poll sample (always > 0).
    interval_ms: u64,

    /// Include a timestamp column in progress lines.
    pub verbose: bool,

    /// Suppress progress and "target reached" lines.
    pub quiet: bool,
}

impl RunConfig {
    /// Create a new run configuration.
    pub fn new(
        mode: RunMode,
        interval_ms: u64,
        verbose: bool,
        quiet: bool,
    ) -> Result<Self, ConfigError> {
        if interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(Self {
            mode,
            interval_ms,
            verbose,
            quiet,
        })
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Poll interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Unbounded,
            interval_ms: DEFAULT_INTERVAL_MS,
            verbose: false,
            quiet: false,
        }
    }
}

/// Errors in the run configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Poll interval must be a positive number of milliseconds")]
    ZeroInterval,
}
