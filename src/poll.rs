//! Poll driver state machine.
//!
//! Each tick waits one interval (except in one-shot mode), samples the
//! session, corrects the reading and decides whether to keep polling:
//! - One-shot: print once and stop
//! - Unbounded: print every tick, never stop on its own
//! - Target: print progress until corrected idle >= target, then report

use std::io::{self, Write};

use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, trace};

use crate::config::{RunConfig, RunMode};
use crate::correction::correct;
use crate::domain::{IdleSample, unix_timestamp};
use crate::session::{IdleSource, PowerStateSource, SessionError, SessionHandle};

/// Decision taken after each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Print the idle time and stop (one-shot).
    Report,
    /// Print progress and sample again.
    Continue,
    /// Target reached, print the final line and stop.
    TargetReached,
}

/// Decide what to do with a corrected idle time.
pub fn decide(mode: RunMode, idle_ms: u64) -> TickDecision {
    match mode {
        RunMode::OneShot => TickDecision::Report,
        RunMode::Unbounded => TickDecision::Continue,
        RunMode::Target(target) if idle_ms >= target => TickDecision::TargetReached,
        RunMode::Target(_) => TickDecision::Continue,
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// One-shot sample was printed.
    Printed { idle_ms: u64 },
    /// Corrected idle time reached the target.
    TargetReached { idle_ms: u64 },
    /// A termination request stopped the run.
    Terminated,
}

/// Errors that end a poll run.
#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to write idle time: {0}")]
    Output(#[from] io::Error),

    #[error("Display query worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Drives sampling, correction and output for one run.
#[derive(Debug)]
pub struct PollDriver {
    config: RunConfig,
    clock: fn() -> u64,
}

impl PollDriver {
    /// Create a driver that stamps samples with the system clock.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            clock: unix_timestamp,
        }
    }

    /// Replace the unix-seconds clock used for timestamps.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Poll until the run mode says to stop.
    ///
    /// Any query or write failure ends the run immediately. X round trips
    /// run on a blocking worker, so dropping this future mid-query writes
    /// nothing for that tick.
    pub async fn run<S, W>(
        &self,
        handle: &SessionHandle<S>,
        out: &mut W,
    ) -> Result<RunOutcome, PollError>
    where
        S: IdleSource + PowerStateSource + Send + Sync + 'static,
        W: Write,
    {
        let mode = self.config.mode;
        debug!(
            "Polling in {:?} mode every {}ms",
            mode,
            self.config.interval_ms()
        );

        loop {
            if !mode.is_one_shot() {
                tokio::time::sleep(self.config.interval()).await;
            }

            let (sample, idle_ms) = self.sample(handle).await?;

            match decide(mode, idle_ms) {
                TickDecision::Report => {
                    writeln!(out, "{idle_ms}")?;
                    out.flush()?;
                    return Ok(RunOutcome::Printed { idle_ms });
                }
                TickDecision::Continue => {
                    if !self.config.quiet {
                        self.write_progress(out, &sample, idle_ms)?;
                    }
                }
                TickDecision::TargetReached => {
                    debug!("Idle target reached at {}ms", idle_ms);
                    if !self.config.quiet {
                        writeln!(
                            out,
                            "Reached idle target: {idle_ms} | timestamp: {}",
                            sample.timestamp
                        )?;
                        out.flush()?;
                    }
                    return Ok(RunOutcome::TargetReached { idle_ms });
                }
            }
        }
    }

    /// Take one sample and return it with the corrected idle time.
    async fn sample<S>(&self, handle: &SessionHandle<S>) -> Result<(IdleSample, u64), PollError>
    where
        S: IdleSource + PowerStateSource + Send + Sync + 'static,
    {
        let session = handle.session()?;
        let clock = self.clock;

        let (sample, power) = tokio::task::spawn_blocking(move || {
            let raw_idle_ms = session.query_idle()?;
            let sample = IdleSample::new(raw_idle_ms, clock());
            let power = session.query_power_state()?;
            Ok::<_, SessionError>((sample, power))
        })
        .await??;

        let idle_ms = correct(sample.raw_idle_ms, &power);

        trace!(
            "Sample at {}: raw={}ms corrected={}ms",
            sample.timestamp, sample.raw_idle_ms, idle_ms
        );

        Ok((sample, idle_ms))
    }

    fn write_progress<W: Write>(
        &self,
        out: &mut W,
        sample: &IdleSample,
        idle_ms: u64,
    ) -> io::Result<()> {
        match (self.config.verbose, self.config.mode.target_ms()) {
            (false, _) => writeln!(out, "{idle_ms}")?,
            (true, None) => writeln!(out, "{} - {idle_ms}", sample.timestamp)?,
            (true, Some(target)) => {
                writeln!(out, "{} - {target} - {idle_ms}", sample.timestamp)?;
            }
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PowerMode, PowerState};
    use crate::session::testing::ScriptedSession;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::Instant;

    const NOW: u64 = 1_700_000_000;

    fn driver(mode: RunMode, verbose: bool, quiet: bool) -> PollDriver {
        let config = RunConfig::new(mode, 1000, verbose, quiet).unwrap();
        PollDriver::new(config).with_clock(|| NOW)
    }

    async fn run_to_string(
        driver: &PollDriver,
        session: ScriptedSession,
    ) -> (Result<RunOutcome, PollError>, String) {
        let handle = SessionHandle::new(session);
        let mut out = Vec::new();
        let result = driver.run(&handle, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(RunMode::OneShot, 0), TickDecision::Report);
        assert_eq!(decide(RunMode::Unbounded, u64::MAX), TickDecision::Continue);
        assert_eq!(decide(RunMode::Target(3000), 2999), TickDecision::Continue);
        assert_eq!(
            decide(RunMode::Target(3000), 3000),
            TickDecision::TargetReached
        );
        assert_eq!(
            decide(RunMode::Target(3000), 3500),
            TickDecision::TargetReached
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_prints_once_without_waiting() {
        let session = ScriptedSession::new([2500, 9999]);
        let queries = session.queries();
        let start = Instant::now();

        let (result, out) = run_to_string(&driver(RunMode::OneShot, false, false), session).await;

        assert_eq!(result.unwrap(), RunOutcome::Printed { idle_ms: 2500 });
        assert_eq!(out, "2500\n");
        assert_eq!(queries.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_is_corrected() {
        let standby = PowerState {
            mode: PowerMode::Standby,
            enabled: true,
            standby_timeout_s: 5,
            suspend_timeout_s: 0,
            off_timeout_s: 0,
        };
        let session = ScriptedSession::new([4000]).with_power(standby);

        let (result, out) = run_to_string(&driver(RunMode::OneShot, false, false), session).await;

        assert_eq!(result.unwrap(), RunOutcome::Printed { idle_ms: 9000 });
        assert_eq!(out, "9000\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_target() {
        let session = ScriptedSession::new([1000, 2000, 3500, 4000]);
        let queries = session.queries();
        let start = Instant::now();

        let (result, out) =
            run_to_string(&driver(RunMode::Target(3000), false, false), session).await;

        assert_eq!(result.unwrap(), RunOutcome::TargetReached { idle_ms: 3500 });
        assert_eq!(
            out,
            "1000\n2000\nReached idle target: 3500 | timestamp: 1700000000\n"
        );
        assert_eq!(queries.load(Ordering::SeqCst), 3);

        // One interval before every sample, including the first
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_compares_corrected_idle() {
        // Raw 1000ms in standby is really 6000ms idle
        let standby = PowerState {
            mode: PowerMode::Standby,
            enabled: true,
            standby_timeout_s: 5,
            suspend_timeout_s: 0,
            off_timeout_s: 0,
        };
        let session = ScriptedSession::new([1000]).with_power(standby);

        let (result, _) = run_to_string(&driver(RunMode::Target(3000), false, true), session).await;

        assert_eq!(result.unwrap(), RunOutcome::TargetReached { idle_ms: 6000 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_target_prints_nothing() {
        let session = ScriptedSession::new([1000, 2000, 3500]);

        let (result, out) =
            run_to_string(&driver(RunMode::Target(3000), false, true), session).await;

        assert_eq!(result.unwrap(), RunOutcome::TargetReached { idle_ms: 3500 });
        assert_eq!(out, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_verbose_with_target_echoes_target() {
        let session = ScriptedSession::new([1000, 3000]);

        let (result, out) =
            run_to_string(&driver(RunMode::Target(3000), true, false), session).await;

        assert!(result.is_ok());
        assert_eq!(
            out,
            "1700000000 - 3000 - 1000\nReached idle target: 3000 | timestamp: 1700000000\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_verbose_until_failure() {
        let session = ScriptedSession::new([10, 20]).then_fail();

        let (result, out) = run_to_string(&driver(RunMode::Unbounded, true, false), session).await;

        assert!(matches!(
            result,
            Err(PollError::Session(SessionError::Query { .. }))
        ));
        assert_eq!(out, "1700000000 - 10\n1700000000 - 20\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_stops_polling() {
        let session = ScriptedSession::new([1000]).then_fail();
        let queries = session.queries();

        let (result, out) =
            run_to_string(&driver(RunMode::Target(3000), false, false), session).await;

        assert!(result.is_err());
        assert_eq!(out, "1000\n");
        // The failing query is the last one attempted
        assert_eq!(queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_session_is_an_error() {
        let mut handle = SessionHandle::new(ScriptedSession::new([1000]));
        handle.close();
        let mut out = Vec::new();

        let result = driver(RunMode::OneShot, false, false)
            .run(&handle, &mut out)
            .await;

        assert!(matches!(
            result,
            Err(PollError::Session(SessionError::Released))
        ));
        assert!(out.is_empty());
    }
}
