//! The log entry data model: a tagged record with a common header plus one
//! of eight payload variants, one of which (`SKIPPED_CALL`) is itself a sum
//! over six sub-kinds. See spec.md §3 and §6.

use crate::callsite::CallSite;
use crate::prog_point::ProgramPoint;
use std::convert::TryFrom;
use std::fmt;

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum EntryKind {
    Input1 = 0,
    Input2 = 1,
    Input4 = 2,
    Input8 = 3,
    InterruptRequest = 4,
    ExitRequest = 5,
    SkippedCall = 6,
    Debug = 7,
    Last = 8,
}

pub const ENTRY_KIND_COUNT: usize = 9;

// Keeps `ENTRY_KIND_COUNT` (used to size `Statistics`'s per-kind arrays)
// honest against the enum's actual last discriminant at compile time.
static_assertions::const_assert_eq!(EntryKind::Last as u32 + 1, ENTRY_KIND_COUNT as u32);

impl TryFrom<u32> for EntryKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => EntryKind::Input1,
            1 => EntryKind::Input2,
            2 => EntryKind::Input4,
            3 => EntryKind::Input8,
            4 => EntryKind::InterruptRequest,
            5 => EntryKind::ExitRequest,
            6 => EntryKind::SkippedCall,
            7 => EntryKind::Debug,
            8 => EntryKind::Last,
            other => return Err(other),
        })
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SkippedCallKind {
    CpuMemRw = 0,
    CpuMemUnmap = 1,
    MemRegionChange = 2,
    HdTransfer = 3,
    NetTransfer = 4,
    HandlePacket = 5,
}

impl TryFrom<u32> for SkippedCallKind {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => SkippedCallKind::CpuMemRw,
            1 => SkippedCallKind::CpuMemUnmap,
            2 => SkippedCallKind::MemRegionChange,
            3 => SkippedCallKind::HdTransfer,
            4 => SkippedCallKind::NetTransfer,
            5 => SkippedCallKind::HandlePacket,
            other => return Err(other),
        })
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum MemType {
    Ram = 0,
    Io = 1,
}

impl TryFrom<u32> for MemType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => MemType::Ram,
            1 => MemType::Io,
            other => return Err(other),
        })
    }
}

/// Bookkeeping-only transfer record shared by `HD_TRANSFER` and
/// `NET_TRANSFER` (spec.md §3/§6: "same shape" for both, no payload bytes).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct TransferRecord {
    pub transfer_type: u32,
    pub src: u64,
    pub dst: u64,
    pub num_bytes: u32,
}

/// A `SKIPPED_CALL` entry's sub-kind and payload (spec.md §3/§6).
#[derive(Clone, Debug)]
pub enum SkippedCall {
    CpuMemRw { addr: u64, bytes: Vec<u8> },
    CpuMemUnmap { addr: u64, bytes: Vec<u8> },
    MemRegionChange {
        start: u64,
        size: u64,
        mtype: MemType,
        added: bool,
        name: String,
    },
    HdTransfer(TransferRecord),
    NetTransfer(TransferRecord),
    /// `old_buf_addr` from the original format is dropped: spec.md §9 flags
    /// it as meaningless across runs and safe to omit from new formats.
    HandlePacket { direction: u8, bytes: Vec<u8> },
}

impl SkippedCall {
    pub fn kind(&self) -> SkippedCallKind {
        match self {
            SkippedCall::CpuMemRw { .. } => SkippedCallKind::CpuMemRw,
            SkippedCall::CpuMemUnmap { .. } => SkippedCallKind::CpuMemUnmap,
            SkippedCall::MemRegionChange { .. } => SkippedCallKind::MemRegionChange,
            SkippedCall::HdTransfer(_) => SkippedCallKind::HdTransfer,
            SkippedCall::NetTransfer(_) => SkippedCallKind::NetTransfer,
            SkippedCall::HandlePacket { .. } => SkippedCallKind::HandlePacket,
        }
    }

    /// Releases owned tail buffers before the shell is returned to the
    /// recycle pool (spec.md §3 "Lifecycle": tails are released at the
    /// moment of recycle, before the shell is pooled).
    fn release_tail(&mut self) {
        match self {
            SkippedCall::CpuMemRw { bytes, .. } => *bytes = Vec::new(),
            SkippedCall::CpuMemUnmap { bytes, .. } => *bytes = Vec::new(),
            SkippedCall::MemRegionChange { name, .. } => *name = String::new(),
            SkippedCall::HandlePacket { bytes, .. } => *bytes = Vec::new(),
            SkippedCall::HdTransfer(_) | SkippedCall::NetTransfer(_) => {}
        }
    }
}

/// The eight-variant sum type for an entry's payload (spec.md §3: "Entry
/// kinds (tag)"). `SkippedCall` nests the six-variant sub-sum.
#[derive(Clone, Debug)]
pub enum EntryPayload {
    Input1(u8),
    Input2(u16),
    Input4(u32),
    Input8(u64),
    InterruptRequest(u32),
    ExitRequest(u32),
    SkippedCall(SkippedCall),
    Debug,
    Last,
}

impl EntryPayload {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryPayload::Input1(_) => EntryKind::Input1,
            EntryPayload::Input2(_) => EntryKind::Input2,
            EntryPayload::Input4(_) => EntryKind::Input4,
            EntryPayload::Input8(_) => EntryKind::Input8,
            EntryPayload::InterruptRequest(_) => EntryKind::InterruptRequest,
            EntryPayload::ExitRequest(_) => EntryKind::ExitRequest,
            EntryPayload::SkippedCall(_) => EntryKind::SkippedCall,
            EntryPayload::Debug => EntryKind::Debug,
            EntryPayload::Last => EntryKind::Last,
        }
    }

    fn release_tail(&mut self) {
        if let EntryPayload::SkippedCall(sc) = self {
            sc.release_tail();
        }
    }
}

/// A fully decoded (or about-to-be-encoded) log entry: header plus payload.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub pp: ProgramPoint,
    pub callsite: CallSite,
    pub payload: EntryPayload,
}

impl LogEntry {
    pub fn new(pp: ProgramPoint, callsite: CallSite, payload: EntryPayload) -> LogEntry {
        LogEntry {
            pp,
            callsite,
            payload,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.payload.kind()
    }

    /// A header-only placeholder used to seed the recycle pool and as the
    /// "just-allocated, not yet filled" shell (mirrors the original's
    /// `alloc_new_entry` zero-filled shell).
    pub fn empty_shell() -> LogEntry {
        LogEntry {
            pp: ProgramPoint::ZERO,
            callsite: CallSite::MainLoopWait,
            payload: EntryPayload::Debug,
        }
    }

    /// Drops owned tail buffers in place, ahead of pooling the shell.
    pub fn release_tail(&mut self) {
        self.payload.release_tail();
    }
}
