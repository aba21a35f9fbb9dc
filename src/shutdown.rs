//! Termination handling.
//!
//! Races a poll run against a shutdown request and releases the display
//! session exactly once, however the run ends.

use std::future::Future;
use std::io::Write;

use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

use crate::poll::{PollDriver, PollError, RunOutcome};
use crate::session::{IdleSource, PowerStateSource, SessionHandle};

/// SIGTERM and SIGINT listeners.
pub struct ExitSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ExitSignals {
    /// Install the signal listeners. Must be called inside a tokio runtime.
    pub fn new() -> std::io::Result<Self> {
        let sigterm = signal(SignalKind::terminate())?;
        let sigint = signal(SignalKind::interrupt())?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the first termination request.
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {}
            _ = self.sigint.recv() => {}
        }
    }
}

/// Run the driver until it finishes or `shutdown` resolves, then release
/// the session.
///
/// `shutdown` wins even while an X query is in flight; that tick prints
/// nothing.
pub async fn run_until_shutdown<S, W, F>(
    driver: &PollDriver,
    handle: &mut SessionHandle<S>,
    out: &mut W,
    shutdown: F,
) -> Result<RunOutcome, PollError>
where
    S: IdleSource + PowerStateSource + Send + Sync + 'static,
    W: Write,
    F: Future<Output = ()>,
{
    let result = tokio::select! {
        result = driver.run(handle, out) => result,
        () = shutdown => {
            info!("Received shutdown signal, releasing display");
            Ok(RunOutcome::Terminated)
        }
    };

    handle.close();
    result
}
