//! Replay statistics and progress reporting (spec.md §4.6).
//!
//! Grounded in the original `rr_log.c`'s `replay_progress`/`next_progress`
//! pair: a monotonic "last percent we printed" ratchet so progress lines are
//! only ever emitted when the integer percentage actually advances, not once
//! per entry. The per-kind counters and consumed-entry history are new
//! surface area this subsystem needs that the original didn't expose
//! directly, shaped after the teacher's `trace_info_command.rs` JSON summary
//! (`serde`/`serde_json`, used the same way here).

use crate::entry::{EntryKind, ENTRY_KIND_COUNT};
use serde::Serialize;
use std::collections::VecDeque;
use std::convert::TryFrom;

/// Per-kind counters plus a bounded consumption history, read out by the
/// `dump` command and by `tests/scenarios.rs` assertions.
#[derive(Debug)]
pub struct Statistics {
    counts: [u64; ENTRY_KIND_COUNT],
    /// Per-kind byte totals (spec.md §2 item 7: "per-kind count and byte
    /// totals"), the on-disk size of every entry folded into that kind —
    /// the same `consumed` value [`crate::codec::LogReader::read_item`]
    /// hands back alongside the decoded entry.
    bytes: [u64; ENTRY_KIND_COUNT],
    history: VecDeque<EntryKind>,
    history_len: usize,
    /// Last integer percentage reported by `progress_line`; `None` until
    /// the first call. Mirrors the original's `next_progress` ratchet.
    next_progress: Option<u32>,
}

impl Statistics {
    pub fn new(history_len: usize) -> Statistics {
        Statistics {
            counts: [0; ENTRY_KIND_COUNT],
            bytes: [0; ENTRY_KIND_COUNT],
            history: VecDeque::with_capacity(history_len),
            history_len,
            next_progress: None,
        }
    }

    /// Folds in one consumed entry: bumps its counter and byte total, and
    /// pushes it onto the bounded history, evicting the oldest if full
    /// (spec.md §4.2, §4.6). `bytes` is the entry's on-disk size, from
    /// [`crate::codec::LogReader::read_item`]'s `consumed` return value.
    pub fn record_consumed(&mut self, kind: EntryKind, bytes: u64) {
        self.counts[kind as usize] += 1;
        self.bytes[kind as usize] += bytes;
        if self.history.len() == self.history_len && self.history_len > 0 {
            self.history.pop_front();
        }
        if self.history_len > 0 {
            self.history.push_back(kind);
        }
    }

    pub fn count(&self, kind: EntryKind) -> u64 {
        self.counts[kind as usize]
    }

    pub fn bytes(&self, kind: EntryKind) -> u64 {
        self.bytes[kind as usize]
    }

    pub fn history(&self) -> impl Iterator<Item = &EntryKind> {
        self.history.iter()
    }

    /// Returns a progress line only when the integer percentage of
    /// `bytes_read / total_bytes` has advanced since the last call; `None`
    /// otherwise. This is the ratchet: a replay that reads one byte at a
    /// time must not print a hundred lines for a hundred bytes when the log
    /// is a gigabyte. `bytes_read` is the decoder's own file position
    /// (`LogReader::bytes_read`), not a value this struct tracks itself.
    pub fn progress_line(&mut self, bytes_read: u64, total_bytes: u64) -> Option<String> {
        if total_bytes == 0 {
            return None;
        }
        let pct = ((bytes_read as u128 * 100) / total_bytes as u128) as u32;
        let advanced = match self.next_progress {
            None => true,
            Some(prev) => pct > prev,
        };
        if advanced {
            self.next_progress = Some(pct);
            Some(format!("replay progress: {}%", pct))
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let mut by_kind = Vec::with_capacity(ENTRY_KIND_COUNT);
        for raw in 0..ENTRY_KIND_COUNT as u32 {
            if let Ok(kind) = EntryKind::try_from(raw) {
                by_kind.push(KindCount {
                    kind: format!("{}", kind),
                    count: self.counts[raw as usize],
                    bytes: self.bytes[raw as usize],
                });
            }
        }
        StatisticsSnapshot {
            by_kind,
            history: self.history.iter().map(|k| format!("{}", k)).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct KindCount {
    pub kind: String,
    pub count: u64,
    pub bytes: u64,
}

/// A serializable view of [`Statistics`], for the `dump` command's JSON
/// output (spec.md §4.6, modeled on the teacher's `trace_info_command.rs`).
#[derive(Serialize)]
pub struct StatisticsSnapshot {
    pub by_kind: Vec<KindCount>,
    pub history: Vec<String>,
}
