//! Backup exporter
//!
//! Copies the whole store under the snapshot gate and writes it to a flat
//! file.
//!
//! ## File Format
//! Raw binary, exactly `TOTAL_SIZE` bytes, no header. Byte `i` of the file
//! is byte `i` of the store at the time its region was copied.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VBlockError};
use crate::store::{BulkKind, LockEvent, RegionId, RegionTable, TOTAL_SIZE};

use super::{CancelToken, SnapshotGate};

/// Longest accepted backup path, in bytes
pub const MAX_PATH_LEN: usize = 255;

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    /// Where the image was written
    pub path: PathBuf,

    /// Bytes written (always `TOTAL_SIZE`)
    pub bytes_written: u64,

    /// CRC-32 of the image
    pub checksum: u32,
}

/// Gate-coordinated exporter over a region table
pub struct BackupExporter<'a> {
    regions: &'a RegionTable,
    gate: &'a SnapshotGate,
}

impl<'a> BackupExporter<'a> {
    pub fn new(regions: &'a RegionTable, gate: &'a SnapshotGate) -> Self {
        Self { regions, gate }
    }

    /// Copy every region, in order, while holding the gate
    ///
    /// Each region is locked only for its own copy, so the image is
    /// consistent per region, not across the whole device.
    pub fn capture(&self, cancel: &CancelToken) -> Result<Vec<u8>> {
        let mut image = vec![0u8; TOTAL_SIZE];

        let permit = self.gate.acquire(cancel)?;
        self.regions.notify(LockEvent::BulkBegin(BulkKind::Backup));
        for region in RegionId::all() {
            let guard = self.regions.lock(region);
            image[region.range()].copy_from_slice(guard.primary());
        }
        self.regions.notify(LockEvent::BulkEnd(BulkKind::Backup));
        drop(permit);

        Ok(image)
    }

    /// Capture the store and write it to `path`
    pub fn export(&self, path: &Path, cancel: &CancelToken) -> Result<BackupReport> {
        validate_path(path)?;
        let image = self.capture(cancel)?;
        write_image(path, &image)
    }
}

/// Create/truncate `path` and write `image` verbatim
///
/// The image must be exactly `TOTAL_SIZE` bytes.
pub fn write_image(path: &Path, image: &[u8]) -> Result<BackupReport> {
    if image.len() != TOTAL_SIZE {
        return Err(VBlockError::InvalidArgument(format!(
            "backup image must be {} bytes, got {}",
            TOTAL_SIZE,
            image.len()
        )));
    }

    let mut file = File::create(path)?;
    file.write_all(image)?;
    file.flush()?;

    let bytes_written = file.metadata()?.len();
    if bytes_written != TOTAL_SIZE as u64 {
        return Err(VBlockError::Io(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            format!(
                "short backup write: {} of {} bytes",
                bytes_written, TOTAL_SIZE
            ),
        )));
    }

    let checksum = crc32fast::hash(image);
    tracing::info!(
        "Backup written to {} ({} bytes, crc32={:08x})",
        path.display(),
        bytes_written,
        checksum
    );

    Ok(BackupReport {
        path: path.to_path_buf(),
        bytes_written,
        checksum,
    })
}

fn validate_path(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len == 0 {
        return Err(VBlockError::InvalidArgument(
            "backup path is empty".to_string(),
        ));
    }
    if len > MAX_PATH_LEN {
        return Err(VBlockError::InvalidArgument(format!(
            "backup path too long: {} bytes (max {})",
            len, MAX_PATH_LEN
        )));
    }
    Ok(())
}
