//! Snapshot Module
//!
//! Coordination of whole-device ("bulk") operations.
//!
//! ## Responsibilities
//! - A single-permit gate so that at most one bulk operation copies at a time
//! - Cancellable waits on that gate
//! - Exporting the store to a flat backup image
//!
//! ## Bulk Operation Shape
//! ```text
//!   acquire gate ──► for each region: lock ─ copy ─ unlock ──► release gate
//!        │                                                          │
//!        └── interruptible (CancelToken)           file I/O happens after
//! ```
//!
//! Ordinary reads and single-region writes never touch the gate; they only
//! contend on their region's lock.

mod backup;
mod gate;

pub use backup::{write_image, BackupExporter, BackupReport, MAX_PATH_LEN};
pub use gate::{CancelToken, GatePermit, SnapshotGate};
