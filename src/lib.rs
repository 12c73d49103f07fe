//! A non-deterministic event log subsystem for deterministic record/replay
//! of a full-system machine emulator. See `SPEC_FULL.md` for the complete
//! module-by-module specification this crate implements.

#[macro_use]
pub mod log;
#[macro_use]
pub mod error;

pub mod callsite;
pub mod checksum;
pub mod codec;
pub mod collaborators;
pub mod commands;
pub mod entry;
pub mod flags;
pub mod prog_point;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod stats;

pub use callsite::CallSite;
pub use entry::{EntryKind, EntryPayload, LogEntry, MemType, SkippedCall, SkippedCallKind, TransferRecord};
pub use error::{RrError, RrResult};
pub use flags::Flags;
pub use prog_point::ProgramPoint;
pub use recorder::Recorder;
pub use replay::Replayer;
pub use session::{SessionController, SessionState};
