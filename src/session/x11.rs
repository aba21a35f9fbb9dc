//! X11 display session backed by the MIT-SCREEN-SAVER and DPMS extensions.

use tracing::{debug, info};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::dpms::{self, ConnectionExt as _, DPMSMode};
use x11rb::protocol::screensaver::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::{IdleSource, PowerStateSource, SessionError};
use crate::domain::{PowerMode, PowerState};

/// Connection to an X server and the root window of its default screen.
pub struct X11Session {
    conn: RustConnection,
    root: Window,
}

impl X11Session {
    /// Connect to the given display, or `$DISPLAY` when `None`.
    pub fn connect(display_name: Option<&str>) -> Result<Self, SessionError> {
        let (conn, screen_num) =
            x11rb::connect(display_name).map_err(|e| SessionError::Connection(e.to_string()))?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| SessionError::Connection(format!("screen {screen_num} not found")))?;

        let name = display_name.unwrap_or("$DISPLAY");
        info!("Connected to X display {} (screen {})", name, screen_num);

        Ok(Self { conn, root })
    }

    /// Check whether the server advertises an extension.
    fn has_extension(&self, name: &'static str) -> Result<bool, SessionError> {
        let present = self
            .conn
            .extension_information(name)
            .map_err(|e| SessionError::query("extension list", e))?
            .is_some();

        if !present {
            debug!("X server has no {} extension", name);
        }

        Ok(present)
    }
}

impl IdleSource for X11Session {
    fn query_idle(&self) -> Result<u64, SessionError> {
        if !self.has_extension(screensaver::X11_EXTENSION_NAME)? {
            return Err(SessionError::ExtensionUnsupported(
                screensaver::X11_EXTENSION_NAME,
            ));
        }

        let reply = self
            .conn
            .screensaver_query_info(self.root)
            .map_err(|e| SessionError::query("screen saver info", e))?
            .reply()
            .map_err(|e| SessionError::query("screen saver info", e))?;

        Ok(u64::from(reply.ms_since_user_input))
    }
}

impl PowerStateSource for X11Session {
    /// Read the DPMS state.
    ///
    /// A server without DPMS, or one that is not DPMS-capable, reports
    /// power management as disabled.
    fn query_power_state(&self) -> Result<PowerState, SessionError> {
        if !self.has_extension(dpms::X11_EXTENSION_NAME)? {
            return Ok(PowerState::disabled());
        }

        let capable = self
            .conn
            .dpms_capable()
            .map_err(|e| SessionError::query("DPMS capability", e))?
            .reply()
            .map_err(|e| SessionError::query("DPMS capability", e))?
            .capable;

        if !capable {
            debug!("X server is not DPMS capable");
            return Ok(PowerState::disabled());
        }

        let timeouts = self
            .conn
            .dpms_get_timeouts()
            .map_err(|e| SessionError::query("DPMS timeouts", e))?
            .reply()
            .map_err(|e| SessionError::query("DPMS timeouts", e))?;

        let info = self
            .conn
            .dpms_info()
            .map_err(|e| SessionError::query("DPMS info", e))?
            .reply()
            .map_err(|e| SessionError::query("DPMS info", e))?;

        Ok(PowerState {
            mode: power_mode(info.power_level),
            enabled: info.state,
            standby_timeout_s: timeouts.standby_timeout,
            suspend_timeout_s: timeouts.suspend_timeout,
            off_timeout_s: timeouts.off_timeout,
        })
    }
}

/// Map a DPMS power level to a mode. Unknown levels count as on.
fn power_mode(level: DPMSMode) -> PowerMode {
    if level == DPMSMode::STANDBY {
        PowerMode::Standby
    } else if level == DPMSMode::SUSPEND {
        PowerMode::Suspend
    } else if level == DPMSMode::OFF {
        PowerMode::Off
    } else {
        PowerMode::On
    }
}
