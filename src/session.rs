//! Display session sources.
//!
//! This module abstracts the two queries the poll driver needs from a
//! display session (raw idle time and power state) and owns the session
//! for the lifetime of the process.

mod x11;

pub use x11::X11Session;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domain::PowerState;

/// Source of raw idle time.
pub trait IdleSource {
    /// Milliseconds since the last user input, uncorrected.
    fn query_idle(&self) -> Result<u64, SessionError>;
}

/// Source of the current power-management state.
pub trait PowerStateSource {
    fn query_power_state(&self) -> Result<PowerState, SessionError>;
}

/// Errors that can occur talking to the display session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Couldn't open display: {0}")]
    Connection(String),

    #[error("{0} extension not supported")]
    ExtensionUnsupported(&'static str),

    #[error("Couldn't query {what}: {reason}")]
    Query { what: &'static str, reason: String },

    #[error("Display session already released")]
    Released,
}

impl SessionError {
    pub(crate) fn query(what: &'static str, reason: impl ToString) -> Self {
        Self::Query {
            what,
            reason: reason.to_string(),
        }
    }
}

/// Exclusive owner of a display session.
///
/// The session is released exactly once: by `close`, or on drop if it was
/// never closed. Queries run on a blocking worker that borrows the session
/// through an `Arc`; a query still in flight at release time keeps the
/// connection until it returns.
#[derive(Debug)]
pub struct SessionHandle<S> {
    session: Option<Arc<S>>,
}

impl<S> SessionHandle<S> {
    /// Take ownership of an open session.
    pub fn new(session: S) -> Self {
        Self {
            session: Some(Arc::new(session)),
        }
    }

    /// Get a shared reference to the open session.
    pub fn session(&self) -> Result<Arc<S>, SessionError> {
        self.session.clone().ok_or(SessionError::Released)
    }

    /// Returns true until the session has been released.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Release the session. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Releasing display session");
            drop(session);
        }
    }
}

impl<S> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}
