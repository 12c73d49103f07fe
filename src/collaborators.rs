//! External collaborators, modeled as traits instead of concrete types —
//! the same seam the teacher draws around its own `Task` abstraction
//! (`src/task_interface/task.rs`): the log subsystem never owns the CPU,
//! the guest address space, or the device-memory map, it only calls back
//! into whoever does (spec.md §2 "Collaborators").

use crate::entry::MemType;
use crate::prog_point::ProgramPoint;

/// Gives the current program point. The recorder and replayer both read
/// this whenever they need "where are we now" (spec.md §2, §4.3, §4.4).
pub trait ProgramPointSource {
    fn current_program_point(&self) -> ProgramPoint;
}

/// The minimal CPU control surface replay needs (spec.md §4.4
/// "EXIT_REQUEST", §6 "Entry kinds").
pub trait CpuControl {
    /// Requests that the emulated machine begin shutting down with the
    /// given guest exit code, mirroring the original's `qemu_system_shutdown_request`.
    fn request_exit(&mut self, exit_code: u32);
}

/// The guest memory-map surface a `MEM_REGION_CHANGE` skipped call
/// replays against (spec.md §4.4, §6 "SKIPPED_CALL / MEM_REGION_CHANGE").
///
/// Takes `&self`: a real host implements this with its own interior
/// mutability (the emulator's memory map is usually behind a lock or a
/// `RefCell` already), which lets one host object satisfy this trait and
/// [`PhysicalMemory`] at the same time without the replay call sites having
/// to juggle two non-aliasing `&mut` borrows of it.
pub trait MemoryRegionHost {
    fn add_subregion(&self, start: u64, size: u64, mtype: MemType, name: &str);
    fn remove_subregion_by_name(&self, name: &str);
}

/// The guest physical address space a `CPU_MEM_RW`/`CPU_MEM_UNMAP` skipped
/// call replays against (spec.md §4.4). `&self` for the same reason as
/// [`MemoryRegionHost`].
pub trait PhysicalMemory {
    /// Writes `bytes` at guest physical address `addr`.
    fn write_physical(&self, addr: u64, bytes: &[u8]);

    /// Reads `len` bytes from guest physical address `addr`, for the
    /// record-side tracked-region CRC pass (spec.md §4.1 "tracked_regions_flush").
    fn read_physical(&self, addr: u64, len: usize) -> Vec<u8>;
}

/// The CPU's register bank, read for the checksum sentinel's
/// register-bank component (spec.md §2 item 8), mirroring the original's
/// `rr_checksum_regs` reading `first_cpu->env_ptr`.
pub trait RegisterBank {
    /// The register bank's raw bytes, in whatever layout the host uses —
    /// the checksum only needs a stable byte sequence to hash, not a
    /// parsed register file.
    fn register_bytes(&self) -> Vec<u8>;
}

/// A do-nothing implementation of every collaborator trait, used by the
/// test suite in place of a real emulator (spec.md §2: "a host capable of
/// standing in for the emulator in tests"). Left as a plain public module
/// rather than `#[cfg(test)]`-gated so the crate's `tests/` integration
/// suite — which compiles as its own crate and cannot see test-only items
/// in this one — can still reach it.
pub mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Records every call made against it instead of doing anything, so
    /// tests can assert on what replay tried to do.
    #[derive(Default)]
    pub struct NullHost {
        pub current_pp: ProgramPoint,
        pub exit_requested: RefCell<Option<u32>>,
        pub regions: RefCell<HashMap<String, (u64, u64, MemType)>>,
        pub memory: RefCell<HashMap<u64, Vec<u8>>>,
        pub registers: RefCell<Vec<u8>>,
    }

    impl NullHost {
        pub fn new() -> NullHost {
            NullHost::default()
        }

        pub fn at(pp: ProgramPoint) -> NullHost {
            NullHost {
                current_pp: pp,
                ..NullHost::default()
            }
        }
    }

    impl ProgramPointSource for NullHost {
        fn current_program_point(&self) -> ProgramPoint {
            self.current_pp
        }
    }

    impl CpuControl for NullHost {
        fn request_exit(&mut self, exit_code: u32) {
            *self.exit_requested.borrow_mut() = Some(exit_code);
        }
    }

    impl MemoryRegionHost for NullHost {
        fn add_subregion(&self, start: u64, size: u64, mtype: MemType, name: &str) {
            self.regions
                .borrow_mut()
                .insert(name.to_string(), (start, size, mtype));
        }

        fn remove_subregion_by_name(&self, name: &str) {
            self.regions.borrow_mut().remove(name);
        }
    }

    impl PhysicalMemory for NullHost {
        fn write_physical(&self, addr: u64, bytes: &[u8]) {
            self.memory.borrow_mut().insert(addr, bytes.to_vec());
        }

        fn read_physical(&self, addr: u64, len: usize) -> Vec<u8> {
            self.memory
                .borrow()
                .get(&addr)
                .cloned()
                .unwrap_or_else(|| vec![0u8; len])
        }
    }

    impl RegisterBank for NullHost {
        fn register_bytes(&self) -> Vec<u8> {
            self.registers.borrow().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::NullHost;
    use super::*;

    #[test]
    fn null_host_records_exit_request() {
        let mut host = NullHost::new();
        host.request_exit(7);
        assert_eq!(*host.exit_requested.borrow(), Some(7));
    }

    #[test]
    fn null_host_tracks_region_add_and_remove() {
        let host = NullHost::new();
        host.add_subregion(0x1000, 0x10, MemType::Io, "dev0");
        assert!(host.regions.borrow().contains_key("dev0"));
        host.remove_subregion_by_name("dev0");
        assert!(!host.regions.borrow().contains_key("dev0"));
    }
}
