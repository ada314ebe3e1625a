//! Device Module
//!
//! The block device context that owns every component.
//!
//! ## Responsibilities
//! - Byte-range reads and framed writes
//! - Key-authorized writes into administratively locked regions
//! - Control operations (lock/unlock/erase/read region/read mirror/info)
//! - Gate-coordinated bulk operations (full-region read, backup)

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::KeyAuthority;
use crate::config::Config;
use crate::error::{Result, VBlockError};
use crate::handle::Handle;
use crate::protocol::{Command, Reply, WriteRequest};
use crate::snapshot::{BackupExporter, BackupReport, CancelToken, SnapshotGate};
use crate::store::{
    BulkKind, LockEvent, LockObserver, RegionId, RegionTable, NUM_REGIONS, REGION_SIZE,
    TOTAL_SIZE,
};

/// One full region returned by READ_REGION / READ_MIRROR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionData {
    pub region: u32,
    pub data: Vec<u8>,
}

/// Geometry and lock state returned by GET_INFO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub size: u32,
    pub region_size: u32,
    pub num_regions: u32,
    /// bit i = 1 => region i locked
    pub lock_bitmap: u8,
}

impl DeviceInfo {
    pub fn is_locked(&self, region: usize) -> bool {
        region < NUM_REGIONS && self.lock_bitmap & (1u8 << region) != 0
    }
}

/// The virtual block device
///
/// ## Concurrency Model: per-region locks + one bulk gate
///
/// - **Reads / writes / control ops**: take only the lock of the region they
///   touch; different regions proceed in parallel
/// - **Writes** check the administrative lock bit and mutate under a single
///   hold of the region lock, so LOCK/UNLOCK cannot slip in between
/// - **Bulk ops** (READ_REGION, BACKUP): acquire the snapshot gate first
///   (interruptible), then lock regions one at a time
/// - **GET_INFO**: lock-free load of the bitmap, eventually consistent with
///   in-flight LOCK/UNLOCK calls
pub struct VBlock {
    /// Device configuration
    config: Config,

    /// Primary + mirror bytes and the lock bitmap
    regions: RegionTable,

    /// Keys allowed to write locked regions
    keys: KeyAuthority,

    /// Serializes bulk operations
    gate: SnapshotGate,
}

impl VBlock {
    /// Create a zeroed, fully unlocked device
    pub fn open(config: Config) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a device reporting lock traffic to `observer`
    pub fn with_observer(config: Config, observer: Arc<dyn LockObserver>) -> Result<Self> {
        Self::build(config, Some(observer))
    }

    fn build(config: Config, observer: Option<Arc<dyn LockObserver>>) -> Result<Self> {
        config.validate()?;

        let keys = KeyAuthority::new(&config.authorized_keys)?;
        let mut regions = RegionTable::new(config.mirror_enabled);
        if let Some(observer) = observer {
            regions = regions.with_observer(observer);
        }

        tracing::info!(
            "vblock device ready: {} bytes, {} regions, keys={}, mirror={}",
            TOTAL_SIZE,
            NUM_REGIONS,
            keys.len(),
            config.mirror_enabled
        );

        Ok(Self {
            config,
            regions,
            keys,
            gate: SnapshotGate::new(),
        })
    }

    /// Open a cursor over this device
    pub fn handle(self: &Arc<Self>) -> Handle {
        Handle::new(Arc::clone(self))
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation. `cancel` interrupts a bulk
    /// operation still waiting for the gate.
    pub fn execute(&self, command: Command, cancel: &CancelToken) -> Result<Reply> {
        match command {
            Command::Read { offset, len } => Ok(Reply::Data(self.read(offset as usize, len as usize))),
            Command::Write { frame } => self.write_frame(&frame).map(Reply::Written),
            Command::Ping => Ok(Reply::Pong),
            Command::LockRegion { region } => {
                self.lock_region(region)?;
                Ok(Reply::Done)
            }
            Command::UnlockRegion { region } => {
                self.unlock_region(region)?;
                Ok(Reply::Done)
            }
            Command::ReadRegion { region } => self.read_region(region, cancel).map(Reply::Region),
            Command::ReadMirror { region } => self.read_mirror(region).map(Reply::Region),
            Command::GetInfo => Ok(Reply::Info(self.info())),
            Command::EraseRegion { region } => {
                self.erase_region(region)?;
                Ok(Reply::Done)
            }
            Command::Backup { path } => self.backup(Path::new(&path), cancel).map(Reply::Backup),
        }
    }

    // =========================================================================
    // Byte-range surface
    // =========================================================================

    /// Read up to `len` bytes starting at `offset`
    ///
    /// Clamped to the end of the store; an offset at or past the end yields
    /// no bytes.
    pub fn read(&self, offset: usize, len: usize) -> Vec<u8> {
        let available = TOTAL_SIZE.saturating_sub(offset);
        let mut buf = vec![0u8; len.min(available)];
        let copied = self.read_into(offset, &mut buf);
        buf.truncate(copied);
        buf
    }

    /// Read into `buf` starting at `offset`, returning the bytes copied
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> usize {
        let copied = self.regions.read(offset, buf);
        tracing::trace!("read offset={} requested={} copied={}", offset, buf.len(), copied);
        copied
    }

    /// Parse and apply a `[key:]offset:data` frame
    ///
    /// Returns the full frame length on success, or 0 for an empty frame or
    /// an empty payload.
    pub fn write_frame(&self, frame: &[u8]) -> Result<usize> {
        if frame.is_empty() {
            return Ok(0);
        }
        if frame.len() > self.config.max_frame_len {
            return Err(VBlockError::InvalidArgument(format!(
                "write frame too large: {} bytes (max {})",
                frame.len(),
                self.config.max_frame_len
            )));
        }

        let request = WriteRequest::parse(frame)?;
        match self.write(&request)? {
            0 => Ok(0),
            _ => Ok(frame.len()),
        }
    }

    /// Apply a parsed write request, returning the payload bytes written
    ///
    /// The payload must stay inside one region. A locked region requires an
    /// authorized key; the bit is checked under the same region lock that
    /// guards the copy.
    pub fn write(&self, request: &WriteRequest) -> Result<usize> {
        let offset = request.offset as usize;
        let len = request.data.len();

        if offset >= TOTAL_SIZE {
            return Err(VBlockError::InvalidArgument(format!(
                "offset {} beyond device size {}",
                offset, TOTAL_SIZE
            )));
        }
        if len == 0 {
            return Ok(0);
        }
        if offset + len > TOTAL_SIZE {
            return Err(VBlockError::InvalidArgument(format!(
                "write of {} bytes at offset {} overruns device size {}",
                len, offset, TOTAL_SIZE
            )));
        }

        let region = RegionId::containing(offset);
        if RegionId::containing(offset + len - 1) != region {
            return Err(VBlockError::InvalidArgument(format!(
                "write of {} bytes at offset {} crosses the boundary of region {}",
                len, offset, region
            )));
        }

        let mut guard = self.regions.lock(region);
        if !self.keys.permits(guard.is_locked(), request.key) {
            tracing::warn!(
                "write to locked region {} rejected (key {:?})",
                region,
                request.key
            );
            return Err(VBlockError::PermissionDenied(format!(
                "region {} is locked and the key is missing or not authorized",
                region
            )));
        }
        guard.write(offset - region.start(), &request.data);
        drop(guard);

        tracing::debug!("wrote {} bytes at offset {} (region {})", len, offset, region);
        Ok(len)
    }

    // =========================================================================
    // Control operations
    // =========================================================================

    /// Require an authorized key for writes into `region`
    pub fn lock_region(&self, region: i32) -> Result<()> {
        self.set_region_locked(region, true)
    }

    /// Accept writes into `region` without a key
    pub fn unlock_region(&self, region: i32) -> Result<()> {
        self.set_region_locked(region, false)
    }

    fn set_region_locked(&self, region: i32, locked: bool) -> Result<()> {
        let region = RegionId::new(region.into())?;
        self.regions.lock(region).set_locked(locked);
        tracing::info!(
            "region {} {}",
            region,
            if locked { "locked" } else { "unlocked" }
        );
        Ok(())
    }

    /// Whether `region` is administratively locked
    pub fn is_region_locked(&self, region: i32) -> Result<bool> {
        let region = RegionId::new(region.into())?;
        Ok(self.regions.is_locked(region))
    }

    /// Gated copy of one full region
    ///
    /// Waits for the snapshot gate; `cancel` aborts the wait with
    /// `Interrupted`.
    pub fn read_region(&self, region: i32, cancel: &CancelToken) -> Result<RegionData> {
        let region = RegionId::new(region.into())?;

        let permit = self.gate.acquire(cancel)?;
        self.regions.notify(LockEvent::BulkBegin(BulkKind::ReadRegion));
        let data = self.regions.lock(region).primary().to_vec();
        self.regions.notify(LockEvent::BulkEnd(BulkKind::ReadRegion));
        drop(permit);

        Ok(RegionData {
            region: region.index() as u32,
            data,
        })
    }

    /// Copy of one region's mirror (zeros when mirroring is disabled)
    pub fn read_mirror(&self, region: i32) -> Result<RegionData> {
        let region = RegionId::new(region.into())?;
        let data = self.regions.lock(region).mirror().to_vec();
        Ok(RegionData {
            region: region.index() as u32,
            data,
        })
    }

    /// Geometry and current lock bitmap
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            size: TOTAL_SIZE as u32,
            region_size: REGION_SIZE as u32,
            num_regions: NUM_REGIONS as u32,
            lock_bitmap: self.regions.bitmap(),
        }
    }

    /// Zero a region (and its mirror when mirroring is enabled)
    pub fn erase_region(&self, region: i32) -> Result<()> {
        let region = RegionId::new(region.into())?;
        self.regions.lock(region).erase();
        tracing::info!("region {} erased", region);
        Ok(())
    }

    // =========================================================================
    // Bulk operations
    // =========================================================================

    /// Capture the whole store under the snapshot gate
    pub fn snapshot(&self, cancel: &CancelToken) -> Result<Vec<u8>> {
        self.exporter().capture(cancel)
    }

    /// Export the store to `path` as a flat `TOTAL_SIZE`-byte image
    pub fn backup(&self, path: &Path, cancel: &CancelToken) -> Result<BackupReport> {
        self.exporter().export(path, cancel)
    }

    fn exporter(&self) -> BackupExporter<'_> {
        BackupExporter::new(&self.regions, &self.gate)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_mirrored(&self) -> bool {
        self.regions.is_mirrored()
    }

    /// The snapshot gate shared by bulk operations
    pub fn gate(&self) -> &SnapshotGate {
        &self.gate
    }
}

/// Export `device` to `path` without cancellation
///
/// Entry point for in-process collaborators that only hold a device
/// reference.
pub fn backup_to_file(device: &VBlock, path: &Path) -> Result<BackupReport> {
    device.backup(path, &CancelToken::new())
}
