//! Region table
//!
//! Primary buffer, mirror buffer and lock bitmap, partitioned by region.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::{LockEvent, LockObserver, RegionId, NUM_REGIONS, REGION_SIZE, TOTAL_SIZE};

/// Bytes owned by one region
struct RegionSlot {
    primary: [u8; REGION_SIZE],
    mirror: [u8; REGION_SIZE],
}

impl RegionSlot {
    fn new() -> Self {
        Self {
            primary: [0u8; REGION_SIZE],
            mirror: [0u8; REGION_SIZE],
        }
    }
}

/// The partitioned store
///
/// ## Concurrency:
/// - Each region's bytes (primary and mirror) live behind that region's
///   `Mutex`; holding the guard is the only way to touch them
/// - `bitmap`: administrative lock bits. Only written while the matching
///   region mutex is held, read lock-free for status snapshots
/// - All methods use `&self`
pub struct RegionTable {
    /// One slot per region, index = region id
    slots: Box<[Mutex<RegionSlot>]>,

    /// bit i set => region i requires an authorized key to write
    bitmap: AtomicU8,

    /// Duplicate writes and erases into the mirror buffer
    mirrored: bool,

    /// Optional instrumentation
    observer: Option<Arc<dyn LockObserver>>,
}

impl RegionTable {
    /// Create an all-zero, all-unlocked table
    pub fn new(mirrored: bool) -> Self {
        Self {
            slots: (0..NUM_REGIONS).map(|_| Mutex::new(RegionSlot::new())).collect(),
            bitmap: AtomicU8::new(0),
            mirrored,
            observer: None,
        }
    }

    /// Attach an observer receiving every lock acquisition and release
    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Acquire a region's lock (blocks, not interruptible)
    pub fn lock(&self, region: RegionId) -> RegionGuard<'_> {
        let slot = self.slots[region.index()].lock();
        self.notify(LockEvent::Acquired(region));
        RegionGuard {
            table: self,
            region,
            slot,
        }
    }

    /// Copy bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes copied, clamped to the end of the store.
    /// Each visited region is locked on its own, so the result is consistent
    /// per region only.
    pub fn read(&self, offset: usize, buf: &mut [u8]) -> usize {
        if offset >= TOTAL_SIZE {
            return 0;
        }
        let to_copy = buf.len().min(TOTAL_SIZE - offset);

        let mut done = 0;
        while done < to_copy {
            let pos = offset + done;
            let region = RegionId::containing(pos);
            let in_region = pos - region.start();
            let chunk = (to_copy - done).min(REGION_SIZE - in_region);

            let guard = self.lock(region);
            buf[done..done + chunk].copy_from_slice(&guard.primary()[in_region..in_region + chunk]);
            drop(guard);

            done += chunk;
        }
        done
    }

    /// Lock bitmap snapshot (single atomic load)
    pub fn bitmap(&self) -> u8 {
        self.bitmap.load(Ordering::Acquire)
    }

    /// Whether a region is administratively locked, without taking its lock
    pub fn is_locked(&self, region: RegionId) -> bool {
        self.bitmap() & region.bit() != 0
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Forward an event to the observer, if any
    pub(crate) fn notify(&self, event: LockEvent) {
        if let Some(observer) = &self.observer {
            observer.observe(event);
        }
    }
}

/// Exclusive access to one region's bytes and lock bit
pub struct RegionGuard<'a> {
    table: &'a RegionTable,
    region: RegionId,
    slot: MutexGuard<'a, RegionSlot>,
}

impl RegionGuard<'_> {
    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn primary(&self) -> &[u8; REGION_SIZE] {
        &self.slot.primary
    }

    pub fn mirror(&self) -> &[u8; REGION_SIZE] {
        &self.slot.mirror
    }

    pub fn is_locked(&self) -> bool {
        self.table.is_locked(self.region)
    }

    /// Set or clear this region's administrative lock bit
    pub fn set_locked(&mut self, locked: bool) {
        let bit = self.region.bit();
        if locked {
            self.table.bitmap.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.table.bitmap.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    /// Overwrite bytes at `offset` within the region (and the mirror, if enabled)
    ///
    /// Panics if the range leaves the region; callers validate first.
    pub fn write(&mut self, offset: usize, data: &[u8]) {
        let range = offset..offset + data.len();
        self.slot.primary[range.clone()].copy_from_slice(data);
        if self.table.mirrored {
            self.slot.mirror[range].copy_from_slice(data);
        }
    }

    /// Zero the region (and the mirror, if enabled)
    pub fn erase(&mut self) {
        self.slot.primary.fill(0);
        if self.table.mirrored {
            self.slot.mirror.fill(0);
        }
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        self.table.notify(LockEvent::Released(self.region));
    }
}
