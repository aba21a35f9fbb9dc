//! xidletool - print the X11 user idle time.
//!
//! Samples idle time from the MIT-SCREEN-SAVER extension, corrects it for
//! X servers that reset the counter in DPMS power-saving modes, and prints it
//! once, forever, or until an idle target is reached.

pub mod cli;
pub mod config;
pub mod correction;
pub mod domain;
pub mod poll;
pub mod session;
pub mod shutdown;

pub use config::RunConfig;
pub use config::RunMode;
pub use poll::PollDriver;
pub use poll::RunOutcome;
pub use session::SessionHandle;
pub use session::X11Session;
