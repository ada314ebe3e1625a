//! Snapshot gate
//!
//! One-permit admission control with cancellable acquisition.

use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{Result, VBlockError};

/// Cloneable cancellation signal
///
/// Cancelling drops the only sender of an internal channel; every clone's
/// receiver then reports disconnection, which wakes all waiters at once.
#[derive(Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(trigger))),
            signal,
        }
    }

    /// Interrupt every current and future wait observing this token
    pub fn cancel(&self) {
        self.trigger.lock().take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.trigger.lock().is_none()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Binary gate serializing bulk operations
///
/// The permit is a token sitting in a one-slot channel: acquiring receives
/// it, releasing sends it back.
pub struct SnapshotGate {
    release: Sender<()>,
    acquire: Receiver<()>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        let (release, acquire) = bounded(1);
        let seeded = release.try_send(()).is_ok();
        debug_assert!(seeded);
        Self { release, acquire }
    }

    /// Block until the permit is free or `cancel` fires
    ///
    /// Returns `Interrupted` if the token is (or becomes) cancelled before the
    /// permit is obtained.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<GatePermit<'_>> {
        if cancel.is_cancelled() {
            return Err(VBlockError::Interrupted);
        }

        crossbeam::select! {
            recv(self.acquire) -> token => match token {
                Ok(()) => Ok(GatePermit { gate: self }),
                Err(_) => Err(VBlockError::Interrupted),
            },
            recv(cancel.signal) -> _ => Err(VBlockError::Interrupted),
        }
    }

    /// Take the permit only if it is free right now
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        self.acquire.try_recv().ok().map(|()| GatePermit { gate: self })
    }

    /// Whether some bulk operation currently holds the permit
    pub fn is_held(&self) -> bool {
        self.acquire.is_empty()
    }
}

impl Default for SnapshotGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding the gate; the permit returns on drop
pub struct GatePermit<'a> {
    gate: &'a SnapshotGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        let returned = self.gate.release.try_send(()).is_ok();
        debug_assert!(returned);
    }
}
