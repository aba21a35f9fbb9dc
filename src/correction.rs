//! Idle-time correction for DPMS-enabled X servers.
//!
//! Some X servers subtract the time already spent in a DPMS power-saving
//! state from the idle counter reported by MIT-SCREEN-SAVER. The counter
//! then restarts near zero whenever the display enters standby, suspend or
//! off. Adding back the configured timeouts restores the time since the
//! last real input.
//!
//! See: <https://bugs.freedesktop.org/show_bug.cgi?id=6439>

use crate::domain::PowerState;
use tracing::trace;

/// Correct a raw idle reading using the current power state.
///
/// The timeout is only added while the raw value is below it; once the
/// reported idle time exceeds the timeout it is already plausible.
pub fn correct(raw_idle_ms: u64, power: &PowerState) -> u64 {
    let Some(threshold) = power.elapsed_timeout_ms() else {
        return raw_idle_ms;
    };

    if raw_idle_ms < threshold {
        let corrected = raw_idle_ms + threshold;
        trace!(
            "DPMS {}: raw idle {}ms below {}ms, corrected to {}ms",
            power.mode.as_str(),
            raw_idle_ms,
            threshold,
            corrected
        );
        corrected
    } else {
        raw_idle_ms
    }
}
