//! Applying `SKIPPED_CALL` entries back against a live host (spec.md §4.4).
//! Grounded in the original's `rr_skipped_calls_replay`: a loop that keeps
//! consuming skipped calls queued at the current call site until none are
//! due, applying each one to the emulated machine through whichever
//! collaborator trait its sub-kind needs.
//!
//! `MAIN_LOOP_WAIT` is the one call site where the loop can run long enough
//! to need a mid-loop queue refill — it is also a prefetch-queue cutoff
//! point (spec.md §4.3), so the queue is never more than one `fill` away
//! from having the next entry ready.

use crate::callsite::CallSite;
use crate::collaborators::{MemoryRegionHost, PhysicalMemory};
use crate::entry::{EntryPayload, SkippedCall};
use crate::error::RrResult;
use crate::prog_point::ProgramPoint;
use crate::replay::dispatch::Replayer;

/// Applies every `SKIPPED_CALL` entry due at `callsite` given the current
/// program point, in order, until the queue has nothing left for this call
/// site. Returns the count applied. `CpuControl` is a separate collaborator
/// (spec.md §2) used by `replay_exit_request`/`replay_interrupt_request`
/// instead — no `SKIPPED_CALL` sub-kind drives the CPU directly.
pub fn replay_skipped_calls(
    replayer: &mut Replayer,
    current: ProgramPoint,
    callsite: CallSite,
    mem_regions: &impl MemoryRegionHost,
    phys_mem: &impl PhysicalMemory,
) -> RrResult<usize> {
    let mut applied = 0;
    while let Some(entry) = replayer.replay_skipped_call(current, callsite)? {
        let call = match &entry.payload {
            EntryPayload::SkippedCall(call) => call.clone(),
            _ => unreachable!("replay_skipped_call guarantees SKIPPED_CALL payload"),
        };

        apply_skipped_call(&call, mem_regions, phys_mem);
        replayer.recycle_entry(entry);
        applied += 1;
    }
    Ok(applied)
}

fn apply_skipped_call(call: &SkippedCall, mem_regions: &impl MemoryRegionHost, phys_mem: &impl PhysicalMemory) {
    match call {
        SkippedCall::CpuMemRw { addr, bytes } => {
            phys_mem.write_physical(*addr, bytes);
        }
        SkippedCall::CpuMemUnmap { addr, bytes } => {
            phys_mem.write_physical(*addr, bytes);
        }
        SkippedCall::MemRegionChange {
            start,
            size,
            mtype,
            added,
            name,
        } => {
            if *added {
                mem_regions.add_subregion(*start, *size, *mtype, name);
            } else {
                mem_regions.remove_subregion_by_name(name);
            }
        }
        SkippedCall::HdTransfer(_) | SkippedCall::NetTransfer(_) => {
            // bookkeeping-only: spec.md §3/§6 carries no payload bytes to
            // apply, the transfer itself already happened on the record side.
        }
        SkippedCall::HandlePacket { .. } => {
            // replay doesn't re-inject guest-bound packets into any live
            // network stack; the CPU_MEM_RW entries describing buffer
            // contents are what downstream code reads back.
        }
    }
}
