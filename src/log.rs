//! Ambient logging for the subsystem.
//!
//! The teacher this crate is built from (`rd`, a Rust port of `rr`) never
//! reaches for `log`/`tracing`; every diagnostic goes through its own
//! `log!(LogLevel, ...)` macro. We keep that shape: a small level enum, a
//! process-wide threshold read from an environment variable, and a macro
//! that every fatal-path and progress-reporting call site in this crate
//! uses instead of bare `println!`/`eprintln!`.

use std::env;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum LogLevel {
    LogDebug = 0,
    LogInfo = 1,
    LogWarn = 2,
    LogError = 3,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::LogDebug => "DEBUG",
            LogLevel::LogInfo => "INFO",
            LogLevel::LogWarn => "WARN",
            LogLevel::LogError => "ERROR",
        }
    }

    fn from_env_str(s: &str) -> Option<LogLevel> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Some(LogLevel::LogDebug),
            "INFO" => Some(LogLevel::LogInfo),
            "WARN" | "WARNING" => Some(LogLevel::LogWarn),
            "ERROR" => Some(LogLevel::LogError),
            _ => None,
        }
    }
}

static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::LogInfo as u8);

/// Reads `RR_LOG_LEVEL` once and latches the process-wide threshold.
/// Mirrors the teacher's `Flags::get()` pattern of a lazily-initialized,
/// process-wide configuration value.
pub fn init_from_env() {
    if let Ok(val) = env::var("RR_LOG_LEVEL") {
        if let Some(level) = LogLevel::from_env_str(&val) {
            THRESHOLD.store(level as u8, Ordering::Relaxed);
        }
    }
}

pub fn enabled(level: LogLevel) -> bool {
    level as u8 >= THRESHOLD.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn emit(level: LogLevel, args: std::fmt::Arguments) {
    if enabled(level) {
        eprintln!("[rr_log:{}] {}", level.as_str(), args);
    }
}

/// `log!(LogLevel::LogWarn, "divergence at {:?}", pp)`
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::emit($level, format_args!($($arg)*))
    };
}
