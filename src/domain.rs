//! Domain types for idle sampling and DPMS power state.

use std::time::{SystemTime, UNIX_EPOCH};

/// DPMS power-management mode of the display.
///
/// See: <https://www.x.org/releases/X11R7.7/doc/xextproto/dpms.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerMode {
    #[default]
    On,
    Standby,
    Suspend,
    Off,
}

impl PowerMode {
    /// Get the mode as a lowercase string for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Standby => "standby",
            Self::Suspend => "suspend",
            Self::Off => "off",
        }
    }
}

/// Power-management configuration and current mode of a display session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerState {
    /// Current DPMS mode.
    pub mode: PowerMode,

    /// Whether DPMS is enabled on the server.
    pub enabled: bool,

    /// Seconds of inactivity before entering standby.
    pub standby_timeout_s: u16,

    /// Seconds spent in standby before entering suspend.
    pub suspend_timeout_s: u16,

    /// Seconds spent in suspend before switching off.
    pub off_timeout_s: u16,
}

impl PowerState {
    /// State used when the server has no usable DPMS support.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Milliseconds of idle time the server has already spent reaching the
    /// current power-saving mode.
    ///
    /// Returns `None` when power management is disabled or the display is on.
    pub fn elapsed_timeout_ms(&self) -> Option<u64> {
        if !self.enabled {
            return None;
        }

        let standby = u64::from(self.standby_timeout_s);
        let suspend = u64::from(self.suspend_timeout_s);
        let off = u64::from(self.off_timeout_s);

        let seconds = match self.mode {
            PowerMode::On => return None,
            PowerMode::Standby => standby,
            PowerMode::Suspend => suspend + standby,
            PowerMode::Off => off + suspend + standby,
        };

        Some(seconds * 1000)
    }
}

/// One raw idle-time reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSample {
    /// Milliseconds since last user input, as reported by the server.
    pub raw_idle_ms: u64,

    /// Unix time (seconds) at which the sample was taken.
    pub timestamp: u64,
}

impl IdleSample {
    pub fn new(raw_idle_ms: u64, timestamp: u64) -> Self {
        Self {
            raw_idle_ms,
            timestamp,
        }
    }
}

/// Current unix time in seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
