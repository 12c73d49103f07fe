//! Call-site ids: a closed enumeration naming the emulator location that
//! produced a record/replay call, used by the replay dispatcher as a sanity
//! check (spec.md GLOSSARY, §4.4, §9 "Callsite-id drift").
//!
//! The set here covers the natural call sites of a full-system emulator's
//! device and CPU model: the main loop's wait point (the only two ids named
//! explicitly in the original implementation this spec was distilled from),
//! plus the I/O, interrupt, and DMA call sites spec.md's entry kinds are
//! delivered from. Closed and `#[repr(u32)]` so the decoder can validate an
//! on-disk value and every `match` over it is a compile-time obligation, per
//! spec.md §9 "Tagged variants".

use std::convert::TryFrom;
use std::fmt;

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum CallSite {
    /// The main CPU-loop wait point. Boundary entries (INTERRUPT_REQUEST,
    /// SKIPPED_CALL@MAIN_LOOP_WAIT) are dispatched here; this is the one
    /// call site `replay_skipped_calls` treats specially (spec.md §4.4).
    MainLoopWait = 0,
    /// A device register read delivering CPU input (INPUT_1/2/4/8).
    IoPortRead = 1,
    /// A memory-mapped I/O register read.
    MmioRead = 2,
    /// The interrupt-pending-word check inside the CPU execution loop.
    InterruptCheck = 3,
    /// The CPU-loop-exit request check.
    ExitCheck = 4,
    /// A DMA engine flushing tracked regions (coalesced CPU_MEM_RW).
    DmaFlush = 5,
    /// A device's map/unmap cycle around a bulk transfer.
    DeviceMemUnmap = 6,
    /// A device model registering or unregistering a memory region.
    MemRegionChange = 7,
    /// A storage controller's transfer bookkeeping (HD_TRANSFER).
    StorageTransfer = 8,
    /// A NIC's transfer bookkeeping (NET_TRANSFER).
    NetworkTransfer = 9,
    /// A NIC handing a packet to/from the host (HANDLE_PACKET).
    PacketHandoff = 10,
    /// The terminating `LAST` entry's call site.
    Last = 11,
}

pub const CALLSITE_COUNT: u32 = 12;

// Keeps `CALLSITE_COUNT` honest against the enum's actual last
// discriminant at compile time.
static_assertions::const_assert_eq!(CallSite::Last as u32 + 1, CALLSITE_COUNT);

impl TryFrom<u32> for CallSite {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => CallSite::MainLoopWait,
            1 => CallSite::IoPortRead,
            2 => CallSite::MmioRead,
            3 => CallSite::InterruptCheck,
            4 => CallSite::ExitCheck,
            5 => CallSite::DmaFlush,
            6 => CallSite::DeviceMemUnmap,
            7 => CallSite::MemRegionChange,
            8 => CallSite::StorageTransfer,
            9 => CallSite::NetworkTransfer,
            10 => CallSite::PacketHandoff,
            11 => CallSite::Last,
            other => return Err(other),
        })
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
