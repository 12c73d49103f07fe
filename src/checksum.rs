//! Checksum helpers (spec.md §2 item 8, §4.1 DMA coalescing).
//!
//! Grounded in `crc32fast`, the checksum crate the `rd` fork family reaches
//! for (see `simonsan-rd`'s manifest, a sibling fork of this crate's
//! teacher, which lists `crc32fast = "1.2"` for this exact purpose).

use crate::flags::Checksum;
use crate::prog_point::ProgramPoint;
use crc32fast::Hasher;

pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Decides whether a checksum sentinel is due at a given program point,
/// under the configured [`Checksum`] cadence (spec.md §2 item 8). Grounded
/// on the original's `rr_checksum_memory`/`rr_checksum_regs` being called
/// on demand at a handful of checkpoints rather than unconditionally on
/// every instruction; `Checksum` just names which checkpoints count.
pub struct ChecksumCadence {
    policy: Checksum,
}

impl ChecksumCadence {
    pub fn new(policy: Checksum) -> ChecksumCadence {
        ChecksumCadence { policy }
    }

    /// `on_flush` is true when the caller is itself a tracked-region flush
    /// point (spec.md §4.1), the one checkpoint `Checksum::OnFlush` cares
    /// about.
    pub fn is_due(&self, pp: ProgramPoint, on_flush: bool) -> bool {
        match self.policy {
            Checksum::None => false,
            Checksum::OnFlush => on_flush,
            Checksum::EveryInstr => true,
            Checksum::At(at) => pp.instr >= at,
        }
    }
}

/// A host-memory buffer registered with the recorder so its CRC can be
/// checked on each flush and a coalesced `CPU_MEM_RW` entry emitted when it
/// changed (spec.md GLOSSARY "Tracked region", §4.1 "tracked_regions_flush").
pub struct TrackedRegion {
    pub addr: u64,
    pub name: String,
    last_crc: Option<u32>,
}

impl TrackedRegion {
    pub fn new(addr: u64, name: impl Into<String>) -> TrackedRegion {
        TrackedRegion {
            addr,
            name: name.into(),
            last_crc: None,
        }
    }

    /// Recomputes the CRC over `contents` and returns `Some(contents)` iff
    /// it differs from the CRC observed at the previous flush, updating the
    /// cached CRC either way. Mirrors `rr_tracked_mem_regions_record`'s
    /// whole-region re-checksum (spec.md §4.1: "a synthetic CPU_MEM_RW entry
    /// is emitted for the whole region").
    pub fn flush<'a>(&mut self, contents: &'a [u8]) -> Option<&'a [u8]> {
        let crc = crc32(contents);
        let changed = self.last_crc != Some(crc);
        self.last_crc = Some(crc);
        if changed {
            Some(contents)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_flush_always_reports_changed() {
        let mut region = TrackedRegion::new(0x1000, "dma0");
        assert!(region.flush(&[1, 2, 3]).is_some());
    }

    #[test]
    fn unchanged_contents_report_no_change() {
        let mut region = TrackedRegion::new(0x1000, "dma0");
        region.flush(&[1, 2, 3]);
        assert!(region.flush(&[1, 2, 3]).is_none());
    }

    #[test]
    fn changed_contents_report_change() {
        let mut region = TrackedRegion::new(0x1000, "dma0");
        region.flush(&[1, 2, 3]);
        assert!(region.flush(&[1, 2, 4]).is_some());
    }

    #[test]
    fn cadence_none_is_never_due() {
        let cadence = ChecksumCadence::new(Checksum::None);
        assert!(!cadence.is_due(ProgramPoint::new(1_000, 0, 0), true));
    }

    #[test]
    fn cadence_on_flush_only_fires_on_flush_points() {
        let cadence = ChecksumCadence::new(Checksum::OnFlush);
        assert!(cadence.is_due(ProgramPoint::new(1, 0, 0), true));
        assert!(!cadence.is_due(ProgramPoint::new(1, 0, 0), false));
    }

    #[test]
    fn cadence_at_fires_from_the_threshold_onward() {
        let cadence = ChecksumCadence::new(Checksum::At(100));
        assert!(!cadence.is_due(ProgramPoint::new(99, 0, 0), false));
        assert!(cadence.is_due(ProgramPoint::new(100, 0, 0), false));
        assert!(cadence.is_due(ProgramPoint::new(500, 0, 0), false));
    }
}
