//! xidletool - print the X11 user idle time.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use xidletool::cli::{Args, render_usage_error};
use xidletool::shutdown::{ExitSignals, run_until_shutdown};
use xidletool::{PollDriver, SessionHandle, X11Session};

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            // Nothing else can report a failed write to stderr
            io::stderr()
                .write_all(render_usage_error(&err).as_bytes())
                .ok();
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(&args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    // A query stuck on a hung X server must not hold up exit
    runtime.shutdown_background();
    code
}

/// Initialize logging with the specified level.
///
/// Logs go to stderr; stdout only carries idle times.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("xidletool={level}"))
        .or_else(|_| EnvFilter::try_new("warn"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Connect to the display and poll until done or terminated.
async fn run(args: &Args) -> Result<()> {
    let config = args.run_config()?;
    debug!("xidletool v{} starting: {:?}", env!("CARGO_PKG_VERSION"), config);

    let mut signals = ExitSignals::new().context("Failed to install signal handlers")?;
    let session = X11Session::connect(args.display.as_deref())?;
    let mut handle = SessionHandle::new(session);

    let driver = PollDriver::new(config);
    let mut stdout = io::stdout().lock();
    let outcome = run_until_shutdown(&driver, &mut handle, &mut stdout, signals.recv()).await?;

    debug!("Finished: {:?}", outcome);
    Ok(())
}
