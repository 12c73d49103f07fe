//! Replay-side modules (spec.md §4.2, §4.3, §4.4): the prefetch queue and
//! recycle pool, typed entry dispatch, and skipped-call application.

pub mod dispatch;
pub mod queue;
pub mod skipped;

pub use dispatch::Replayer;
