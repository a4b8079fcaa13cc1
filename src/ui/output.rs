//! ui::output
//!
//! Output formatting, display, and the stderr log sink.
//!
//! # Design
//!
//! Results go to stdout and respect the quiet flag. Diagnostics from the
//! library arrive through the `log` facade and are written to stderr by the
//! `env_logger` sink that [`init_logging`] installs, filtered by the same
//! verbosity. `SEQGEN_LOG` accepts `env_logger` directives and overrides the
//! flags, e.g. `SEQGEN_LOG=seqgen::store=debug`.

use std::fmt::Display;
use std::io::Write;

use env_logger::{Env, Target};
use log::{LevelFilter, SetLoggerError};

/// Environment variable holding log filter directives.
pub const LOG_ENV: &str = "SEQGEN_LOG";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Most verbose log level shown at this verbosity.
    pub fn max_level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Warn,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a result value (always shown, even in quiet mode).
pub fn value(message: impl Display) {
    println!("{}", message);
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Render a log line the way the CLI prints it.
fn format_record(level: log::Level, message: impl Display) -> String {
    match level {
        log::Level::Error => format!("error: {}", message),
        log::Level::Warn => format!("warning: {}", message),
        log::Level::Info => message.to_string(),
        log::Level::Debug | log::Level::Trace => format!("[debug] {}", message),
    }
}

/// Route `log` records to stderr at the given verbosity.
///
/// # Errors
///
/// Returns an error if a logger has already been installed.
pub fn init_logging(verbosity: Verbosity) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(verbosity.max_level())
        .parse_env(Env::new().filter(LOG_ENV))
        .target(Target::Stderr)
        .format(|buf, record| writeln!(buf, "{}", format_record(record.level(), record.args())))
        .try_init()
}
