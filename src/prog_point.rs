//! The program point: the ordering key for every entry in the log.
//!
//! See spec.md §3. `instr` is the authoritative clock; `pc` and `secondary`
//! only disambiguate events sharing an instruction boundary.

use crate::entry::EntryKind;
use std::cmp::Ordering;

#[derive(Copy, Clone, Eq, PartialEq, Default, Debug, Hash)]
pub struct ProgramPoint {
    pub instr: u64,
    pub pc: u64,
    pub secondary: u64,
}

impl ProgramPoint {
    pub const ZERO: ProgramPoint = ProgramPoint {
        instr: 0,
        pc: 0,
        secondary: 0,
    };

    pub fn new(instr: u64, pc: u64, secondary: u64) -> ProgramPoint {
        ProgramPoint {
            instr,
            pc,
            secondary,
        }
    }
}

impl Ord for ProgramPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instr
            .cmp(&other.instr)
            .then(self.pc.cmp(&other.pc))
            .then(self.secondary.cmp(&other.secondary))
    }
}

impl PartialOrd for ProgramPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(instr={}, pc={:#x}, sec={})", self.instr, self.pc, self.secondary)
    }
}

/// Kind-aware comparison used by the replay dispatcher (spec.md §4.3).
///
/// For `INTERRUPT_REQUEST` and `SKIPPED_CALL` the emulator can't precisely
/// attribute `pc`/`secondary`, so only `instr` is compared. For every other
/// kind (the `INPUT_*` family and `EXIT_REQUEST`) all three fields
/// participate, matching spec.md's "for INPUT_* all three fields must
/// match".
///
/// Returns `Ordering::Equal` when `current` is due to consume `head`,
/// `Ordering::Less` when `current` is behind (caller should return "no
/// event yet"), and `Ordering::Greater` when `current` has overshot the log
/// (always a divergence at the call site, per spec.md §3's invariant that
/// replay never consumes an entry with `PP` strictly greater than current).
pub fn prog_point_compare(current: ProgramPoint, head: ProgramPoint, kind: EntryKind) -> Ordering {
    let relaxed = matches!(kind, EntryKind::InterruptRequest | EntryKind::SkippedCall);
    if relaxed {
        current.instr.cmp(&head.instr)
    } else {
        current.cmp(&head)
    }
}
