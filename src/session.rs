//! Session lifecycle: OFF → RECORD → OFF, OFF → REPLAY → OFF (spec.md §2
//! "Lifecycle", §4.5). Grounded in `rr_do_begin_record`/
//! `rr_do_begin_replay`/`rr_do_end_record`/`rr_do_end_replay` and the
//! `D/B-rr-nondet.log` + `D/B-rr-snp` naming convention from
//! `rr_get_nondet_log_file_name`/`rr_get_snapshot_file_name`.
//!
//! `SessionController` only tracks which state the process is in; it does
//! not own the `Recorder`/`Replayer` file handles themselves, the same
//! division the original draws between `rr_record_in_progress`/
//! `rr_replay_in_progress` flags and the separate `rr_nondet_log` handle.

use crate::error::{RrError, RrResult};
use crate::flags::Flags;
use crate::recorder::Recorder;
use crate::replay::Replayer;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SessionState {
    Off,
    Record,
    Replay,
}

pub fn nondet_log_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}-rr-nondet.log", base))
}

pub fn snapshot_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}-rr-snp", base))
}

pub struct SessionController {
    state: SessionState,
    flags: Flags,
}

impl SessionController {
    pub fn new(flags: Flags) -> SessionController {
        SessionController {
            state: SessionState::Off,
            flags,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Starts a fresh recording: saves a new VM snapshot at `D/B-rr-snp`
    /// via `save_snapshot`, then opens `D/B-rr-nondet.log` for write
    /// (spec.md §4.5 "OFF→RECORD").
    pub fn begin_record(
        &mut self,
        dir: &Path,
        base: &str,
        save_snapshot: impl FnOnce(&Path) -> RrResult<()>,
    ) -> RrResult<Recorder> {
        if self.state != SessionState::Off {
            return Err(RrError::SessionAlreadyActive);
        }
        let snap = snapshot_path(dir, base);
        save_snapshot(&snap).map_err(|_| RrError::SnapshotSaveFailed(snap.clone(), "save_snapshot failed".into()))?;
        let recorder = Recorder::create(nondet_log_path(dir, base), self.flags.clone())?;
        self.state = SessionState::Record;
        Ok(recorder)
    }

    /// Starts a recording from an already-existing snapshot instead of
    /// creating a new one (spec.md §4.5 "begin_record_from"), restoring the
    /// VM state via `restore_snapshot` before opening the log for write.
    pub fn begin_record_from(
        &mut self,
        dir: &Path,
        base: &str,
        restore_snapshot: impl FnOnce(&Path) -> RrResult<()>,
    ) -> RrResult<Recorder> {
        if self.state != SessionState::Off {
            return Err(RrError::SessionAlreadyActive);
        }
        let snap = snapshot_path(dir, base);
        if !snap.exists() {
            return Err(RrError::MissingSnapshot(snap));
        }
        restore_snapshot(&snap)?;
        let recorder = Recorder::create(nondet_log_path(dir, base), self.flags.clone())?;
        self.state = SessionState::Record;
        Ok(recorder)
    }

    /// Begins replay: restores the paired VM snapshot, then opens the log
    /// for read and fills the prefetch queue (spec.md §4.5 "OFF→REPLAY").
    pub fn begin_replay(
        &mut self,
        dir: &Path,
        base: &str,
        restore_snapshot: impl FnOnce(&Path) -> RrResult<()>,
    ) -> RrResult<Replayer> {
        if self.state != SessionState::Off {
            return Err(RrError::SessionAlreadyActive);
        }
        let snap = snapshot_path(dir, base);
        if !snap.exists() {
            return Err(RrError::MissingSnapshot(snap));
        }
        restore_snapshot(&snap)?;
        let replayer = Replayer::open(
            nondet_log_path(dir, base),
            self.flags.max_queue_len,
            self.flags.history_len,
        )?;
        self.state = SessionState::Replay;
        Ok(replayer)
    }

    /// Ends a recording: writes the `LAST` entry, rewrites the header with
    /// the final program point, and returns to OFF (spec.md §4.5
    /// "RECORD→OFF", grounded in `rr_do_end_record`).
    pub fn end_record(&mut self, recorder: Recorder, final_pp: crate::prog_point::ProgramPoint) -> RrResult<()> {
        if self.state != SessionState::Record {
            return Err(RrError::SessionNotActive);
        }
        recorder.end_of_log(final_pp)?;
        self.state = SessionState::Off;
        Ok(())
    }

    /// Ends a replay and returns to OFF (spec.md §4.5 "REPLAY→OFF",
    /// grounded in `rr_do_end_replay`). The `Replayer` is simply dropped —
    /// unlike recording there is no header to rewrite on the read side.
    pub fn end_replay(&mut self, replayer: Replayer) -> RrResult<()> {
        if self.state != SessionState::Replay {
            return Err(RrError::SessionNotActive);
        }
        drop(replayer);
        self.state = SessionState::Off;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn filenames_follow_the_d_b_convention() {
        let dir = Path::new("/tmp/traces");
        assert_eq!(nondet_log_path(dir, "run1"), dir.join("run1-rr-nondet.log"));
        assert_eq!(snapshot_path(dir, "run1"), dir.join("run1-rr-snp"));
    }

    #[test]
    fn begin_record_requires_off_state() {
        let dir = tempdir().unwrap();
        let mut session = SessionController::new(Flags::default());

        let recorder = session
            .begin_record(dir.path(), "run1", |p| {
                std::fs::write(p, b"snapshot").map_err(|e| RrError::Io(p.to_path_buf(), e))
            })
            .unwrap();
        assert_eq!(session.state(), SessionState::Record);

        let err = session.begin_record(dir.path(), "run2", |_| Ok(())).unwrap_err();
        assert!(matches!(err, RrError::SessionAlreadyActive));

        session
            .end_record(recorder, crate::prog_point::ProgramPoint::ZERO)
            .unwrap();
        assert_eq!(session.state(), SessionState::Off);
    }

    #[test]
    fn begin_replay_without_snapshot_is_missing_snapshot() {
        let dir = tempdir().unwrap();
        let mut session = SessionController::new(Flags::default());
        let err = session.begin_replay(dir.path(), "run1", |_| Ok(())).unwrap_err();
        assert!(matches!(err, RrError::MissingSnapshot(_)));
    }
}
