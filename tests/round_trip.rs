//! Testable Property 5 from spec.md §8: for any sequence of `record_*`
//! calls producing log `L`, decoding `L` yields entries whose kinds, PPs,
//! and payload bytes exactly match the sequence (after compaction).

use rr_log::callsite::CallSite;
use rr_log::codec::LogReader;
use rr_log::flags::Flags;
use rr_log::entry::{EntryPayload, MemType, SkippedCall, TransferRecord};
use rr_log::prog_point::ProgramPoint;
use rr_log::recorder::Recorder;
use tempfile::tempdir;

#[test]
fn round_trips_a_mixed_sequence_of_every_kind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rt-rr-nondet.log");
    let mut rec = Recorder::create(path.clone(), Flags::default()).unwrap();

    rec.record_input_1(ProgramPoint::new(1, 0, 0), CallSite::IoPortRead, 0x11).unwrap();
    rec.record_input_2(ProgramPoint::new(2, 0, 0), CallSite::IoPortRead, 0x2222).unwrap();
    rec.record_input_4(ProgramPoint::new(3, 0, 0), CallSite::IoPortRead, 0x3333_3333).unwrap();
    rec.record_input_8(ProgramPoint::new(4, 0, 0), CallSite::IoPortRead, 0x4444_4444_4444_4444)
        .unwrap();
    rec.record_interrupt_request(ProgramPoint::new(5, 0, 0), CallSite::InterruptCheck, 9)
        .unwrap();
    rec.record_exit_request(ProgramPoint::new(6, 0, 0), CallSite::ExitCheck, 1).unwrap();
    rec.record_cpu_mem_rw_call(ProgramPoint::new(7, 0, 0), CallSite::DmaFlush, 0x8000, &[1, 2, 3, 4])
        .unwrap();
    rec.record_cpu_mem_unmap(ProgramPoint::new(8, 0, 0), CallSite::DeviceMemUnmap, 0x9000, &[5, 6])
        .unwrap();
    rec.record_memory_region_change(
        ProgramPoint::new(9, 0, 0),
        CallSite::MemRegionChange,
        0x1000,
        0x100,
        MemType::Io,
        true,
        "dev0",
    )
    .unwrap();
    rec.record_hd_transfer(
        ProgramPoint::new(10, 0, 0),
        CallSite::StorageTransfer,
        TransferRecord {
            transfer_type: 1,
            src: 0xa,
            dst: 0xb,
            num_bytes: 512,
        },
    )
    .unwrap();
    rec.record_net_transfer(
        ProgramPoint::new(11, 0, 0),
        CallSite::NetworkTransfer,
        TransferRecord {
            transfer_type: 2,
            src: 0xc,
            dst: 0xd,
            num_bytes: 256,
        },
    )
    .unwrap();
    rec.record_handle_packet_call(ProgramPoint::new(12, 0, 0), CallSite::PacketHandoff, 1, &[9, 9, 9])
        .unwrap();
    rec.record_debug(ProgramPoint::new(13, 0, 0), CallSite::MainLoopWait).unwrap();

    rec.end_of_log(ProgramPoint::new(13, 0, 0)).unwrap();

    let mut reader = LogReader::open(path).unwrap();
    assert_eq!(reader.last_prog_point, ProgramPoint::new(13, 0, 0));

    let mut entries = Vec::new();
    while !reader.is_empty() {
        let (entry, _bytes) = reader.read_item().unwrap();
        entries.push(entry);
    }
    // 12 data entries + DEBUG + LAST.
    assert_eq!(entries.len(), 14);

    match &entries[0].payload {
        EntryPayload::Input1(v) => assert_eq!(*v, 0x11),
        other => panic!("unexpected {:?}", other),
    }
    match &entries[3].payload {
        EntryPayload::Input8(v) => assert_eq!(*v, 0x4444_4444_4444_4444),
        other => panic!("unexpected {:?}", other),
    }
    match &entries[6].payload {
        EntryPayload::SkippedCall(SkippedCall::CpuMemRw { addr, bytes }) => {
            assert_eq!(*addr, 0x8000);
            assert_eq!(bytes, &[1, 2, 3, 4]);
        }
        other => panic!("unexpected {:?}", other),
    }
    match &entries[8].payload {
        EntryPayload::SkippedCall(SkippedCall::MemRegionChange { start, size, mtype, added, name }) => {
            assert_eq!(*start, 0x1000);
            assert_eq!(*size, 0x100);
            assert_eq!(*mtype, MemType::Io);
            assert!(*added);
            assert_eq!(name, "dev0");
        }
        other => panic!("unexpected {:?}", other),
    }
    match &entries[11].payload {
        EntryPayload::SkippedCall(SkippedCall::HandlePacket { direction, bytes }) => {
            assert_eq!(*direction, 1);
            assert_eq!(bytes, &[9, 9, 9]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(entries[12].kind(), rr_log::EntryKind::Debug);
    assert_eq!(entries[13].kind(), rr_log::EntryKind::Last);
}
