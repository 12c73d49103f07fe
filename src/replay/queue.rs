//! The prefetch queue and recycle pool (spec.md §4.3, GLOSSARY "Prefetch
//! queue", "Recycle pool"). Grounded in the original's `queue_head`/
//! `recycle_list` pair: a bounded FIFO of not-yet-consumed entries read
//! ahead from the log, refilled up to a cutoff, plus a LIFO pool of spent
//! entry shells kept around so replay doesn't re-allocate a `LogEntry` for
//! every consumed item.

use crate::codec::LogReader;
use crate::entry::{EntryKind, LogEntry};
use crate::error::RrResult;
use std::collections::VecDeque;

/// Read-ahead queue with a bounded length and an early-stop policy at
/// boundary events, plus the shell recycle pool (spec.md §4.3:
/// "stop at ≤65,536 entries, or earlier at an INTERRUPT_REQUEST or
/// SKIPPED_CALL@MAIN_LOOP_WAIT entry").
pub struct PrefetchQueue {
    entries: VecDeque<(LogEntry, u64)>,
    recycle: Vec<LogEntry>,
    max_len: usize,
    log_exhausted: bool,
}

impl PrefetchQueue {
    pub fn new(max_len: usize) -> PrefetchQueue {
        PrefetchQueue {
            entries: VecDeque::new(),
            recycle: Vec::new(),
            max_len,
            log_exhausted: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn peek(&self) -> Option<&LogEntry> {
        self.entries.front().map(|(entry, _bytes)| entry)
    }

    /// Reads ahead from `reader` until the queue reaches `max_len`, the log
    /// is exhausted, or a cutoff entry (`INTERRUPT_REQUEST` or
    /// `SKIPPED_CALL@MAIN_LOOP_WAIT`) is appended — in which case that
    /// entry is kept (the cutoff is inclusive) and the fill stops early.
    /// Returns the number of entries read. Each entry's on-disk byte count
    /// travels alongside it so [`PrefetchQueue::consume`] can hand it back
    /// to the caller for [`crate::stats::Statistics::record_consumed`]
    /// (spec.md §2 item 7 "per-kind count and byte totals").
    pub fn fill(&mut self, reader: &mut LogReader) -> RrResult<usize> {
        let mut read = 0;
        while self.entries.len() < self.max_len && !reader.is_empty() {
            let (entry, bytes) = reader.read_item()?;
            let is_cutoff = matches!(entry.kind(), EntryKind::InterruptRequest)
                || (entry.kind() == EntryKind::SkippedCall
                    && entry.callsite == crate::callsite::CallSite::MainLoopWait);
            self.entries.push_back((entry, bytes));
            read += 1;
            if is_cutoff {
                break;
            }
        }
        self.log_exhausted = reader.is_empty();
        Ok(read)
    }

    pub fn log_exhausted(&self) -> bool {
        self.log_exhausted
    }

    /// Pops the head and hands it, along with its on-disk byte count, to
    /// the caller. The caller is expected to pass the entry to
    /// [`PrefetchQueue::recycle`] once done, mirroring the original's
    /// separate alloc/use/free steps rather than recycling before the
    /// caller has read the payload.
    pub fn consume(&mut self) -> Option<(LogEntry, u64)> {
        self.entries.pop_front()
    }

    /// Releases an entry's tail allocations and parks the shell on the
    /// recycle pool, ready for [`PrefetchQueue::take_shell`] to reuse.
    pub fn recycle(&mut self, mut entry: LogEntry) {
        entry.release_tail();
        self.recycle.push(entry);
    }

    /// Takes a shell off the recycle pool if one is available, falling
    /// back to a fresh allocation (spec.md GLOSSARY "Recycle pool": reuse
    /// is an optimization, not a correctness requirement).
    pub fn take_shell(&mut self) -> LogEntry {
        self.recycle.pop().unwrap_or_else(LogEntry::empty_shell)
    }

    /// Number of shells currently parked in the recycle pool, for tests
    /// asserting the pool actually gets used instead of growing unbounded.
    pub fn recycled_len(&self) -> usize {
        self.recycle.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callsite::CallSite;
    use crate::entry::EntryPayload;
    use crate::prog_point::ProgramPoint;
    use tempfile::tempdir;

    fn write_log(path: std::path::PathBuf, entries: &[LogEntry]) {
        let mut writer = crate::codec::LogWriter::create(path).unwrap();
        for e in entries {
            writer.write_item(e).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn fill_stops_at_max_len() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q-rr-nondet.log");
        let entries: Vec<_> = (0..10)
            .map(|i| {
                LogEntry::new(
                    ProgramPoint::new(i, 0, 0),
                    CallSite::IoPortRead,
                    EntryPayload::Input1(i as u8),
                )
            })
            .collect();
        write_log(path.clone(), &entries);

        let mut reader = LogReader::open(path).unwrap();
        let mut queue = PrefetchQueue::new(3);
        let read = queue.fill(&mut reader).unwrap();
        assert_eq!(read, 3);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn fill_stops_inclusively_at_interrupt_request() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q2-rr-nondet.log");
        let entries = vec![
            LogEntry::new(
                ProgramPoint::new(1, 0, 0),
                CallSite::IoPortRead,
                EntryPayload::Input1(1),
            ),
            LogEntry::new(
                ProgramPoint::new(2, 0, 0),
                CallSite::InterruptCheck,
                EntryPayload::InterruptRequest(5),
            ),
            LogEntry::new(
                ProgramPoint::new(3, 0, 0),
                CallSite::IoPortRead,
                EntryPayload::Input1(3),
            ),
        ];
        write_log(path.clone(), &entries);

        let mut reader = LogReader::open(path).unwrap();
        let mut queue = PrefetchQueue::new(65_536);
        let read = queue.fill(&mut reader).unwrap();
        assert_eq!(read, 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn consume_recycles_the_shell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q3-rr-nondet.log");
        let entries = vec![LogEntry::new(
            ProgramPoint::new(1, 0, 0),
            CallSite::IoPortRead,
            EntryPayload::Input1(1),
        )];
        write_log(path.clone(), &entries);

        let mut reader = LogReader::open(path).unwrap();
        let mut queue = PrefetchQueue::new(8);
        queue.fill(&mut reader).unwrap();
        let (entry, _bytes) = queue.consume().unwrap();
        queue.recycle(entry);
        assert_eq!(queue.recycled_len(), 1);
    }
}
