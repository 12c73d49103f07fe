//! Error handling split the way spec.md §7 partitions it: **fatal**
//! (abort the process after printing the program point and expected-vs-
//! actual entry kinds), **silent** (plain `None`/`Option` control flow, not
//! an error at all), and **recoverable-at-session-boundary** (a real
//! `Result`, the only case the teacher would ever surface as `io::Result`).
//!
//! The teacher has no `thiserror`/`anyhow` dependency anywhere in its own
//! manifest (nor do any of its sibling forks in the corpus), so this stays
//! a hand-rolled enum, the way `rd` itself would write one.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Recoverable only at a session boundary (spec.md §7).
#[derive(Debug)]
pub enum RrError {
    /// `begin_replay` couldn't find the paired VM snapshot.
    MissingSnapshot(PathBuf),
    /// `begin_record`/`begin_record_from` couldn't persist the VM snapshot;
    /// per spec.md §7 the session is simply never entered.
    SnapshotSaveFailed(PathBuf, String),
    /// Any other I/O failure opening, reading, or closing the log file.
    Io(PathBuf, io::Error),
    /// A control-surface command was issued while a session was already
    /// active, or `end_record`/`end_replay` was issued with no active
    /// session (spec.md §2 "Lifecycle": exactly one active log per
    /// process).
    SessionAlreadyActive,
    SessionNotActive,
}

impl fmt::Display for RrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RrError::MissingSnapshot(path) => {
                write!(f, "replay snapshot not found: {}", path.display())
            }
            RrError::SnapshotSaveFailed(path, reason) => {
                write!(f, "failed to save snapshot {}: {}", path.display(), reason)
            }
            RrError::Io(path, err) => write!(f, "I/O error on {}: {}", path.display(), err),
            RrError::SessionAlreadyActive => {
                write!(f, "a record/replay session is already active")
            }
            RrError::SessionNotActive => write!(f, "no record/replay session is active"),
        }
    }
}

impl std::error::Error for RrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RrError::Io(_, err) => Some(err),
            _ => None,
        }
    }
}

pub type RrResult<T> = Result<T, RrError>;

/// Everything a divergence report needs to print (spec.md §4.6, §7):
/// current program point, the queue head's program point (if any), and the
/// entry kinds involved.
#[derive(Debug)]
pub struct DivergenceContext {
    pub current_pp: crate::prog_point::ProgramPoint,
    pub expected_pp: Option<crate::prog_point::ProgramPoint>,
    pub expected_kind: Option<crate::entry::EntryKind>,
    pub actual_kind: Option<crate::entry::EntryKind>,
}

impl fmt::Display for DivergenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "current={}", self.current_pp)?;
        if let Some(pp) = self.expected_pp {
            write!(f, " expected_pp={}", pp)?;
        }
        if let Some(k) = self.expected_kind {
            write!(f, " expected_kind={}", k)?;
        }
        if let Some(k) = self.actual_kind {
            write!(f, " actual_kind={}", k)?;
        }
        Ok(())
    }
}

/// Logs a divergence context and aborts the process. This backs spec.md
/// §7's "fatal" class wherever a [`DivergenceContext`] is available —
/// overshoot/call-site mismatches in `replay/dispatch.rs`, and the
/// already-`None` arm of `replay_scalar`. Conditions with no PP/kind
/// context to report (unrecognized on-disk tags in `codec.rs`, short
/// reads/writes mid-entry) log and abort the same way but inline, without
/// this macro. Replay cannot be trusted to continue past any of these, so
/// there is no recovery path — matching the teacher's own
/// `abort()`-on-assertion-failure behavior.
#[macro_export]
macro_rules! rr_fatal {
    ($cx:expr, $($arg:tt)*) => {{
        $crate::log!($crate::log::LogLevel::LogError, $($arg)*);
        $crate::log!($crate::log::LogLevel::LogError, "{}", $cx);
        std::process::abort();
    }};
}

/// `rr_assert!(cond, cx, "fmt", args...)` — a condition-guarded wrapper
/// around `rr_fatal!`, for the spec.md §4.3 dispatch checks that are
/// naturally phrased as "this must hold, or abort" (overshoot detection,
/// call-site mismatch in `replay/dispatch.rs`) rather than as an
/// already-`None` branch with nothing left to assert. Named after the
/// teacher's own assertion convention (`ed_assert!`/`rr_assert` in the
/// original C).
#[macro_export]
macro_rules! rr_assert {
    ($cond:expr, $cx:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::rr_fatal!($cx, $($arg)*);
        }
    };
}
