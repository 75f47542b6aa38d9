//! Moderated wiki changes: before/after snapshot handling, diffing, the
//! pending-change engine and the in-memory bulk job tracker.

pub mod bulk;
pub mod diff;
pub mod engine;
pub mod snapshot;
