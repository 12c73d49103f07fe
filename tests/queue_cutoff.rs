//! Testable Property 7 from spec.md §8: during `fill()`, the queue never
//! exceeds `max_queue_len + 1` entries, and every `fill()` terminates when
//! either the log is empty or a boundary entry is appended.

use rr_log::callsite::CallSite;
use rr_log::codec::{LogReader, LogWriter};
use rr_log::entry::{EntryPayload, LogEntry};
use rr_log::prog_point::ProgramPoint;
use rr_log::replay::queue::PrefetchQueue;
use tempfile::tempdir;

fn write_log(path: std::path::PathBuf, entries: &[LogEntry]) {
    let mut writer = LogWriter::create(path).unwrap();
    for e in entries {
        writer.write_item(e).unwrap();
    }
    writer.close().unwrap();
}

#[test]
fn fill_never_exceeds_cap_plus_one_even_without_a_boundary_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cutoff-rr-nondet.log");
    // 200 plain INPUT_1 entries, no INTERRUPT_REQUEST/SKIPPED_CALL to stop early.
    let entries: Vec<_> = (0..200)
        .map(|i| LogEntry::new(ProgramPoint::new(i, 0, 0), CallSite::IoPortRead, EntryPayload::Input1(0)))
        .collect();
    write_log(path.clone(), &entries);

    let cap = 50;
    let mut reader = LogReader::open(path).unwrap();
    let mut queue = PrefetchQueue::new(cap);
    queue.fill(&mut reader).unwrap();
    assert!(queue.len() <= cap + 1);
    assert_eq!(queue.len(), cap);
}

#[test]
fn fill_terminates_early_and_inclusively_on_a_boundary_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cutoff2-rr-nondet.log");
    let mut entries: Vec<_> = (0..5)
        .map(|i| LogEntry::new(ProgramPoint::new(i, 0, 0), CallSite::IoPortRead, EntryPayload::Input1(0)))
        .collect();
    entries.push(LogEntry::new(
        ProgramPoint::new(5, 0, 0),
        CallSite::InterruptCheck,
        EntryPayload::InterruptRequest(1),
    ));
    entries.extend((6..10).map(|i| LogEntry::new(ProgramPoint::new(i, 0, 0), CallSite::IoPortRead, EntryPayload::Input1(0))));
    write_log(path.clone(), &entries);

    let mut reader = LogReader::open(path).unwrap();
    let mut queue = PrefetchQueue::new(1000);
    queue.fill(&mut reader).unwrap();
    // 5 INPUT_1 entries plus the boundary INTERRUPT_REQUEST, stopping well
    // short of the 1000 cap and well short of the remaining 4 entries.
    assert_eq!(queue.len(), 6);
}

#[test]
fn fill_terminates_when_the_log_is_exhausted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cutoff3-rr-nondet.log");
    let entries: Vec<_> = (0..3)
        .map(|i| LogEntry::new(ProgramPoint::new(i, 0, 0), CallSite::IoPortRead, EntryPayload::Input1(0)))
        .collect();
    write_log(path.clone(), &entries);

    let mut reader = LogReader::open(path).unwrap();
    let mut queue = PrefetchQueue::new(1000);
    let read = queue.fill(&mut reader).unwrap();
    assert_eq!(read, 3);
    assert!(queue.log_exhausted());
    assert_eq!(queue.fill(&mut reader).unwrap(), 0);
}
