//! Leveled diagnostic logging for the `fitpool` workspace.
//!
//! The logger is a process-wide singleton holding a single atomic level.
//! Every macro captures the calling module's path and skips formatting
//! entirely when its level is filtered out, so disabled `trace!` calls in
//! the allocator hot path cost one relaxed load.
//!
//! # Example
//!
//! ```
//! use fitpool_log::{debug, info, Level};
//!
//! fitpool_log::set_level(Level::Debug);
//!
//! let capacity = 4096;
//! info!("pool ready: {} bytes", capacity);
//! debug!("free list: {:?}", [0, 64, 128]);
//! ```
//!
//! # Configuration
//!
//! The level can be set programmatically with [`set_level`] or
//! [`set_level_from_str`], or read from the `FITPOOL_LOG` environment
//! variable with [`init_from_env`].

use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted by [`init_from_env`].
pub const ENV_VAR: &str = "FITPOOL_LOG";

/// Severity of a log message.
///
/// Lower numeric values are more severe; a logger set to `Info` lets
/// `Error`, `Warn` and `Info` through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Unrecoverable failures.
    Error = 0,
    /// Caller mistakes and resource exhaustion.
    Warn = 1,
    /// Lifecycle events.
    Info = 2,
    /// Per-pool diagnostics.
    Debug = 3,
    /// Per-operation tracing (splits, merges, scans).
    Trace = 4,
}

impl Level {
    /// Every level, most severe first.
    pub const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the upper-case name of this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level: {:?}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case and surrounding whitespace.
    ///
    /// ```
    /// use fitpool_log::Level;
    ///
    /// assert_eq!("trace".parse(), Ok(Level::Trace));
    /// assert_eq!(" Warn ".parse(), Ok(Level::Warn));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLevelError { input: s.to_owned() })
    }
}

/// The global logger.
///
/// Obtained through [`get_logger`]; holds only the current level.
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Sets the most verbose level that will be emitted.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Returns `true` if a message at `level` would be emitted.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at `Level::Info` on first use.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Info))
}

/// Sets the global level.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the global level from its name.
///
/// # Errors
///
/// Returns [`ParseLevelError`] if `s` names no level; the level is left
/// unchanged.
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Sets the global level from the `FITPOOL_LOG` environment variable.
///
/// Returns the level in effect afterwards. An unset variable keeps the
/// current level; an unparsable one keeps it too and is reported once at
/// `Warn`.
pub fn init_from_env() -> Level {
    if let Ok(value) = std::env::var(ENV_VAR)
        && let Err(err) = set_level_from_str(&value)
    {
        __log_with_target(Level::Warn, module_path!(), format_args!("{ENV_VAR}: {err}"));
    }
    get_logger().level()
}

#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    const RESET: &str = "\x1b[0m";

    if !get_logger().enabled(level) {
        return;
    }

    let color = level.color_code();
    eprintln!("{color}[{level}]{RESET} {target}: {args}");
}

/// Logs at an explicit level.
///
/// ```
/// use fitpool_log::{log, Level};
///
/// log!(level: Level::Info, "reserved {} bytes", 128);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::get_logger().enabled(level) {
            $crate::__log_with_target(level, module_path!(), format_args!($($arg)*));
        }
    }};
}

/// Logs at `Error`.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at `Warn`.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at `Info`.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at `Debug`.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at `Trace`.
///
/// ```
/// use fitpool_log::trace;
///
/// # let offset = 64;
/// trace!("split at {:#x}", offset);
/// ```
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
