//! Command-line arguments.

use clap::{CommandFactory, Parser};

use crate::config::{ConfigError, DEFAULT_INTERVAL_MS, RunConfig, RunMode};

/// Print the X11 user idle time.
///
/// By default runs indefinitely, printing the idle time in milliseconds
/// every interval. Idle time is corrected for X servers that reset it while
/// the display is in a DPMS power-saving mode.
#[derive(Parser, Debug)]
#[command(name = "xidletool")]
#[command(author, version, about, long_about = None)]
#[command(args_override_self = true)]
pub struct Args {
    /// Print the current idle time and exit.
    #[arg(short = 's', long, overrides_with = "target")]
    pub single: bool,

    /// Run until the session has been idle for this many milliseconds (0 runs forever).
    #[arg(short, long, value_name = "MS", overrides_with = "single")]
    pub target: Option<u64>,

    /// Check idle time every MS milliseconds.
    #[arg(
        short,
        long,
        value_name = "MS",
        default_value_t = DEFAULT_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Print a timestamp with each idle time.
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't print progress or the "target reached" line, just exit.
    #[arg(short, long)]
    pub quiet: bool,

    /// X display to connect to (defaults to $DISPLAY).
    #[arg(long, value_name = "NAME")]
    pub display: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Build the run configuration for these arguments.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mode = if self.single {
            RunMode::OneShot
        } else {
            RunMode::from_target(self.target.unwrap_or(0))
        };

        RunConfig::new(mode, self.interval, self.verbose, self.quiet)
    }
}

/// Render a command-line error for stderr.
///
/// Validation errors from clap carry no usage line, so one is appended.
pub fn render_usage_error(err: &clap::Error) -> String {
    let mut text = err.render().to_string();
    if !text.contains("Usage:") {
        text.push_str(&format!("\n{}\n", Args::command().render_usage()));
    }
    text
}
