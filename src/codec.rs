//! Sequential binary encoder/decoder over a file handle (spec.md §4.1,
//! §4.2, §6). Byte order is host-native — logs are not portable across
//! hosts (spec.md §6, §9 "Host-native endianness"), so every field is
//! written and read with `to_ne_bytes`/`from_ne_bytes` rather than a
//! portability crate like `byteorder`.
//!
//! Fields are written and read **individually**, never as a `sizeof`-wide
//! struct blit — spec.md §4.1 calls this out explicitly so the format stays
//! dense and doesn't depend on any one host's struct padding.
//!
//! I/O here splits the same way spec.md §7 splits errors generally:
//! opening and closing a log (`create`/`open`/`close`) are session-boundary
//! operations, so a failure there is recoverable — the session is simply
//! never entered, surfaced as `RrError::Io`. A short read or write once a
//! session is active (every call `write_item`/`read_item` makes through
//! `w`/`r`) means the log itself is now unreliable; there is no sane way to
//! keep recording or replaying past that, so those go straight through the
//! fatal path, matching the teacher's own `abort()`-on-assertion-failure
//! posture for anything that leaves state inconsistent mid-session.

use crate::callsite::CallSite;
use crate::entry::{EntryKind, EntryPayload, LogEntry, MemType, SkippedCall, SkippedCallKind, TransferRecord};
use crate::error::{RrError, RrResult};
use crate::prog_point::ProgramPoint;
use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

fn io_err(path: &Path, err: io::Error) -> RrError {
    RrError::Io(path.to_path_buf(), err)
}

fn short_io<T>(result: io::Result<T>, path: &Path) -> RrResult<T> {
    result.map_err(|e| io_err(path, e))
}

/// A read or write failure while a session is active (spec.md §7's fatal
/// class). Unlike `io_err`/`short_io`, which hand session-boundary I/O
/// failures back as a recoverable `RrError`, this never returns — the log
/// is mid-entry and there is no way to resume it consistently.
fn fatal_io(path: &Path, err: io::Error) -> ! {
    crate::log!(
        crate::log::LogLevel::LogError,
        "fatal I/O error on {}: {}",
        path.display(),
        err
    );
    std::process::abort();
}

/// The sequential encoder: the record-side half of spec.md §4.1.
pub struct LogWriter {
    file: File,
    path: PathBuf,
    pub last_prog_point: ProgramPoint,
    pub item_number: u64,
}

impl LogWriter {
    /// Opens `path` for write and lays down the header placeholder
    /// (`last_prog_point`, all zero — rewritten at close, spec.md §3 "Log
    /// container"). A failure here is session-boundary: the session is
    /// simply never entered (spec.md §7), so it's reported as `RrError::Io`
    /// rather than aborting the process.
    pub fn create(path: PathBuf) -> RrResult<LogWriter> {
        let mut file = short_io(
            OpenOptions::new().write(true).create(true).truncate(true).open(&path),
            &path,
        )?;
        short_io(file.write_all(&ProgramPoint::ZERO.instr.to_ne_bytes()), &path)?;
        short_io(file.write_all(&ProgramPoint::ZERO.pc.to_ne_bytes()), &path)?;
        short_io(file.write_all(&ProgramPoint::ZERO.secondary.to_ne_bytes()), &path)?;
        Ok(LogWriter {
            file,
            path,
            last_prog_point: ProgramPoint::ZERO,
            item_number: 0,
        })
    }

    /// Writes one field of an active entry. A short write here means the
    /// log is corrupt mid-entry, which spec.md §4.1/§7 treats as fatal, not
    /// a recoverable `RrError::Io` — there's no way to back out a partial
    /// entry once its earlier fields are already on disk.
    fn w(&mut self, bytes: &[u8]) {
        if let Err(e) = self.file.write_all(bytes) {
            fatal_io(&self.path, e);
        }
    }

    fn write_pp(&mut self, pp: ProgramPoint) {
        self.w(&pp.instr.to_ne_bytes());
        self.w(&pp.pc.to_ne_bytes());
        self.w(&pp.secondary.to_ne_bytes());
    }

    fn write_transfer(&mut self, t: &TransferRecord) {
        self.w(&t.transfer_type.to_ne_bytes());
        self.w(&t.src.to_ne_bytes());
        self.w(&t.dst.to_ne_bytes());
        self.w(&t.num_bytes.to_ne_bytes());
    }

    /// Appends one entry: header fields individually, then the variant
    /// payload, then any variable-length tail (spec.md §4.1).
    pub fn write_item(&mut self, entry: &LogEntry) -> RrResult<()> {
        self.write_pp(entry.pp);
        self.w(&(entry.kind() as u32).to_ne_bytes());
        self.w(&(entry.callsite as u32).to_ne_bytes());

        match &entry.payload {
            EntryPayload::Input1(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::Input2(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::Input4(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::Input8(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::InterruptRequest(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::ExitRequest(v) => self.w(&v.to_ne_bytes()),
            EntryPayload::Debug | EntryPayload::Last => {}
            EntryPayload::SkippedCall(call) => {
                // write the sub-kind first, then its shape.
                self.w(&(call.kind() as u32).to_ne_bytes());
                match call {
                    SkippedCall::CpuMemRw { addr, bytes } => {
                        self.w(&addr.to_ne_bytes());
                        self.w(&(bytes.len() as i32).to_ne_bytes());
                        self.w(bytes);
                    }
                    SkippedCall::CpuMemUnmap { addr, bytes } => {
                        self.w(&addr.to_ne_bytes());
                        self.w(&(bytes.len() as u64).to_ne_bytes());
                        self.w(bytes);
                    }
                    SkippedCall::MemRegionChange {
                        start,
                        size,
                        mtype,
                        added,
                        name,
                    } => {
                        self.w(&start.to_ne_bytes());
                        self.w(&size.to_ne_bytes());
                        self.w(&(name.len() as u32).to_ne_bytes());
                        self.w(&(*mtype as u32).to_ne_bytes());
                        self.w(&[*added as u8]);
                        self.w(name.as_bytes());
                    }
                    SkippedCall::HdTransfer(t) | SkippedCall::NetTransfer(t) => {
                        self.write_transfer(t);
                    }
                    SkippedCall::HandlePacket { direction, bytes } => {
                        self.w(&(bytes.len() as i32).to_ne_bytes());
                        self.w(&[*direction]);
                        self.w(bytes);
                    }
                }
            }
        }

        self.last_prog_point = entry.pp;
        self.item_number += 1;
        Ok(())
    }

    /// Rewinds and rewrites only the header with the final program point,
    /// then closes. O(1) regardless of log size — it never touches the
    /// entries already written (spec.md §4.5 "RECORD→OFF"). Like `create`,
    /// this is session-boundary: a failure here is reported, not fatal.
    pub fn close(mut self) -> RrResult<()> {
        short_io(self.file.flush(), &self.path)?;
        short_io(self.file.seek(SeekFrom::Start(0)), &self.path)?;
        let pp = self.last_prog_point;
        short_io(self.file.write_all(&pp.instr.to_ne_bytes()), &self.path)?;
        short_io(self.file.write_all(&pp.pc.to_ne_bytes()), &self.path)?;
        short_io(self.file.write_all(&pp.secondary.to_ne_bytes()), &self.path)?;
        short_io(self.file.flush(), &self.path)
    }
}

/// The sequential decoder: the replay-side half of spec.md §4.2.
pub struct LogReader {
    file: File,
    path: PathBuf,
    pub size: u64,
    pub bytes_read: u64,
    pub item_number: u64,
    pub last_prog_point: ProgramPoint,
}

impl LogReader {
    /// Opens `path` read-only and reads the header, giving `last_prog_point`
    /// for progress display without scanning the log (spec.md §3, §4.5). A
    /// failure here is session-boundary, reported as `RrError::Io`.
    pub fn open(path: PathBuf) -> RrResult<LogReader> {
        let mut file = short_io(File::open(&path), &path)?;
        let size = short_io(file.metadata(), &path)?.len();
        let last_prog_point = {
            let instr = read_u64_raw(&mut file, &path)?;
            let pc = read_u64_raw(&mut file, &path)?;
            let secondary = read_u64_raw(&mut file, &path)?;
            ProgramPoint::new(instr, pc, secondary)
        };
        Ok(LogReader {
            file,
            path,
            size,
            bytes_read: 24,
            item_number: 0,
            last_prog_point,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_read >= self.size
    }

    /// Reads one field of an active entry. A short read here means the log
    /// ended (or was truncated) mid-entry; replay cannot be trusted to
    /// continue from a half-decoded record, so this is fatal (spec.md
    /// §4.2/§7), not a recoverable `RrError::Io`.
    fn r(&mut self, buf: &mut [u8]) {
        if let Err(e) = self.file.read_exact(buf) {
            fatal_io(&self.path, e);
        }
        self.bytes_read += buf.len() as u64;
    }

    fn read_u8(&mut self) -> u8 {
        let mut buf = [0u8; 1];
        self.r(&mut buf);
        buf[0]
    }

    fn read_u16(&mut self) -> u16 {
        let mut buf = [0u8; 2];
        self.r(&mut buf);
        u16::from_ne_bytes(buf)
    }

    fn read_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.r(&mut buf);
        u32::from_ne_bytes(buf)
    }

    fn read_i32(&mut self) -> i32 {
        let mut buf = [0u8; 4];
        self.r(&mut buf);
        i32::from_ne_bytes(buf)
    }

    fn read_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.r(&mut buf);
        u64::from_ne_bytes(buf)
    }

    fn read_bytes(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        self.r(&mut buf);
        buf
    }

    fn read_pp(&mut self) -> ProgramPoint {
        let instr = self.read_u64();
        let pc = self.read_u64();
        let secondary = self.read_u64();
        ProgramPoint::new(instr, pc, secondary)
    }

    fn read_transfer(&mut self) -> TransferRecord {
        TransferRecord {
            transfer_type: self.read_u32(),
            src: self.read_u64(),
            dst: self.read_u64(),
            num_bytes: self.read_u32(),
        }
    }

    /// Reads the next entry, returning it along with the number of bytes
    /// consumed (header + payload), for the caller to fold into per-kind
    /// statistics (spec.md §4.2 "Increments per-kind counters", §2 item 7
    /// "per-kind count and byte totals"). Every read here is infallible
    /// from this function's point of view: a short read aborts the process
    /// instead of producing an `Err`, so the `RrResult` wrapper exists only
    /// to keep this call shaped the same as every other fallible operation
    /// in the crate, not because this can actually fail and be recovered
    /// from.
    pub fn read_item(&mut self) -> RrResult<(LogEntry, u64)> {
        let start = self.bytes_read;
        let pp = self.read_pp();
        let raw_kind = self.read_u32();
        let raw_callsite = self.read_u32();
        let kind = EntryKind::try_from(raw_kind).unwrap_or_else(|bad| unknown_kind_fatal(pp, bad));
        let callsite = CallSite::try_from(raw_callsite).unwrap_or_else(|bad| unknown_callsite_fatal(pp, bad));

        let payload = match kind {
            EntryKind::Input1 => EntryPayload::Input1(self.read_u8()),
            EntryKind::Input2 => EntryPayload::Input2(self.read_u16()),
            EntryKind::Input4 => EntryPayload::Input4(self.read_u32()),
            EntryKind::Input8 => EntryPayload::Input8(self.read_u64()),
            EntryKind::InterruptRequest => EntryPayload::InterruptRequest(self.read_u32()),
            EntryKind::ExitRequest => EntryPayload::ExitRequest(self.read_u32()),
            EntryKind::Debug => EntryPayload::Debug,
            EntryKind::Last => EntryPayload::Last,
            EntryKind::SkippedCall => {
                let raw_sub = self.read_u32();
                let sub = SkippedCallKind::try_from(raw_sub).unwrap_or_else(|bad| unknown_subkind_fatal(pp, bad));
                let call = match sub {
                    SkippedCallKind::CpuMemRw => {
                        let addr = self.read_u64();
                        let len = self.read_i32();
                        let bytes = self.read_bytes(len.max(0) as usize);
                        SkippedCall::CpuMemRw { addr, bytes }
                    }
                    SkippedCallKind::CpuMemUnmap => {
                        let addr = self.read_u64();
                        let len = self.read_u64();
                        let bytes = self.read_bytes(len as usize);
                        SkippedCall::CpuMemUnmap { addr, bytes }
                    }
                    SkippedCallKind::MemRegionChange => {
                        let start_addr = self.read_u64();
                        let size = self.read_u64();
                        let len = self.read_u32();
                        let mtype_raw = self.read_u32();
                        let mtype = MemType::try_from(mtype_raw).unwrap_or(MemType::Ram);
                        let added = self.read_u8() != 0;
                        let name_bytes = self.read_bytes(len as usize);
                        let name = String::from_utf8_lossy(&name_bytes).into_owned();
                        SkippedCall::MemRegionChange {
                            start: start_addr,
                            size,
                            mtype,
                            added,
                            name,
                        }
                    }
                    SkippedCallKind::HdTransfer => SkippedCall::HdTransfer(self.read_transfer()),
                    SkippedCallKind::NetTransfer => SkippedCall::NetTransfer(self.read_transfer()),
                    SkippedCallKind::HandlePacket => {
                        let size = self.read_i32();
                        let direction = self.read_u8();
                        let bytes = self.read_bytes(size.max(0) as usize);
                        SkippedCall::HandlePacket { direction, bytes }
                    }
                };
                EntryPayload::SkippedCall(call)
            }
        };

        self.item_number += 1;
        let consumed = self.bytes_read - start;
        Ok((LogEntry::new(pp, callsite, payload), consumed))
    }
}

fn read_u64_raw(file: &mut File, path: &Path) -> RrResult<u64> {
    let mut buf = [0u8; 8];
    short_io(file.read_exact(&mut buf), path)?;
    Ok(u64::from_ne_bytes(buf))
}

fn unknown_kind_fatal(pp: ProgramPoint, raw: u32) -> ! {
    crate::log!(
        crate::log::LogLevel::LogError,
        "unknown or unimplemented entry kind {} at {}",
        raw,
        pp
    );
    std::process::abort();
}

fn unknown_callsite_fatal(pp: ProgramPoint, raw: u32) -> ! {
    crate::log!(
        crate::log::LogLevel::LogError,
        "unknown or unimplemented call site {} at {}",
        raw,
        pp
    );
    std::process::abort();
}

fn unknown_subkind_fatal(pp: ProgramPoint, raw: u32) -> ! {
    crate::log!(
        crate::log::LogLevel::LogError,
        "unknown or unimplemented skipped-call sub-kind {} at {}",
        raw,
        pp
    );
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callsite::CallSite;
    use tempfile::tempdir;

    fn sample_entries() -> Vec<LogEntry> {
        vec![
            LogEntry::new(
                ProgramPoint::new(10, 0, 0),
                CallSite::IoPortRead,
                EntryPayload::Input1(0x42),
            ),
            LogEntry::new(
                ProgramPoint::new(11, 0, 0),
                CallSite::IoPortRead,
                EntryPayload::Input4(0xDEAD_BEEF),
            ),
            LogEntry::new(
                ProgramPoint::new(12, 0, 0),
                CallSite::MemRegionChange,
                EntryPayload::SkippedCall(SkippedCall::MemRegionChange {
                    start: 0x1000,
                    size: 0x100,
                    mtype: MemType::Io,
                    added: true,
                    name: "dev0".into(),
                }),
            ),
            LogEntry::new(ProgramPoint::new(12, 0, 0), CallSite::Last, EntryPayload::Last),
        ]
    }

    #[test]
    fn round_trips_every_kind_of_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t-rr-nondet.log");

        let mut writer = LogWriter::create(path.clone()).unwrap();
        for entry in sample_entries() {
            writer.write_item(&entry).unwrap();
        }
        writer.close().unwrap();

        let mut reader = LogReader::open(path).unwrap();
        assert_eq!(reader.last_prog_point, ProgramPoint::new(12, 0, 0));

        let mut decoded = Vec::new();
        let mut total_bytes = 0u64;
        while !reader.is_empty() {
            let (entry, bytes) = reader.read_item().unwrap();
            total_bytes += bytes;
            decoded.push(entry);
        }

        assert_eq!(decoded.len(), 4);
        assert_eq!(total_bytes, reader.bytes_read - 24);
        match &decoded[0].payload {
            EntryPayload::Input1(v) => assert_eq!(*v, 0x42),
            other => panic!("unexpected payload {:?}", other),
        }
        match &decoded[2].payload {
            EntryPayload::SkippedCall(SkippedCall::MemRegionChange { name, .. }) => {
                assert_eq!(name, "dev0")
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
