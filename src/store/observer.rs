//! Lock observer
//!
//! Instrumentation hook for region lock traffic and bulk operations.

use super::RegionId;

/// Kind of gated whole-device operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    ReadRegion,
    Backup,
}

/// Events reported to a [`LockObserver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    /// A region lock was acquired
    Acquired(RegionId),

    /// A region lock is about to be released
    Released(RegionId),

    /// A bulk operation entered its copy phase (gate held)
    BulkBegin(BulkKind),

    /// A bulk operation left its copy phase (gate still held)
    BulkEnd(BulkKind),
}

/// Receives lock events from a device
///
/// Called on the thread performing the operation, possibly while a region
/// lock is held. Implementations must not call back into the device.
pub trait LockObserver: Send + Sync {
    fn observe(&self, event: LockEvent);
}
