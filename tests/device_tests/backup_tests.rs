//! Tests for snapshots and backups
//!
//! These tests verify:
//! - Backup files are exact 4096-byte copies of the store
//! - Path validation and I/O failures
//! - Interrupted gate waits leave nothing behind
//! - The in-process `backup_to_file` entry point

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use vblock::snapshot::{write_image, MAX_PATH_LEN};
use vblock::store::TOTAL_SIZE;
use vblock::{backup_to_file, CancelToken, Config, VBlock, VBlockError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_device_with_data() -> VBlock {
    let device = VBlock::open(Config::builder().authorized_keys([5]).build()).unwrap();
    device.write_frame(b"0:HELLO").unwrap();
    device.write_frame(b"1000:middle").unwrap();
    device.write_frame(b"4090:tail!").unwrap();
    device
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_backup_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vblock.bin");
    let device = setup_device_with_data();

    let report = device.backup(&path, &CancelToken::new()).unwrap();

    let contents = fs::read(&path).unwrap();
    assert_eq!(contents.len(), TOTAL_SIZE);
    assert_eq!(contents, device.read(0, TOTAL_SIZE));
    assert_eq!(report.bytes_written, TOTAL_SIZE as u64);
    assert_eq!(report.path, path);
    assert_eq!(report.checksum, crc32fast::hash(&contents));
}

#[test]
fn test_backup_truncates_existing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("existing.bin");
    fs::write(&path, vec![0xEE; TOTAL_SIZE * 2]).unwrap();

    let device = setup_device_with_data();
    device.backup(&path, &CancelToken::new()).unwrap();

    assert_eq!(fs::read(&path).unwrap(), device.read(0, TOTAL_SIZE));
}

#[test]
fn test_backup_of_empty_store_is_zeroes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("zero.bin");
    let device = VBlock::open(Config::default()).unwrap();

    backup_to_file(&device, &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![0u8; TOTAL_SIZE]);
}

#[test]
fn test_snapshot_matches_store() {
    let device = setup_device_with_data();
    let image = device.snapshot(&CancelToken::new()).unwrap();

    assert_eq!(image, device.read(0, TOTAL_SIZE));
    assert!(!device.gate().is_held());
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_backup_into_missing_directory_fails_with_io() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no_such_dir").join("vblock.bin");
    let device = setup_device_with_data();

    let err = device.backup(&path, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, VBlockError::Io(_)));
    assert!(!device.gate().is_held());
}

#[test]
fn test_backup_rejects_bad_paths() {
    let device = setup_device_with_data();
    let token = CancelToken::new();

    let empty = device.backup(std::path::Path::new(""), &token).unwrap_err();
    assert!(matches!(empty, VBlockError::InvalidArgument(_)));

    let long = "x".repeat(MAX_PATH_LEN + 1);
    let err = device.backup(std::path::Path::new(&long), &token).unwrap_err();
    assert!(matches!(err, VBlockError::InvalidArgument(_)));
}

#[test]
fn test_write_image_rejects_wrong_size() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("short.bin");

    let err = write_image(&path, &[0u8; 100]).unwrap_err();
    assert!(matches!(err, VBlockError::InvalidArgument(_)));
    assert!(!path.exists());
}

// =============================================================================
// Interruption Tests
// =============================================================================

#[test]
fn test_backup_with_cancelled_token_is_interrupted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("never.bin");
    let device = setup_device_with_data();

    let token = CancelToken::new();
    token.cancel();

    let err = device.backup(&path, &token).unwrap_err();
    assert!(matches!(err, VBlockError::Interrupted));
    assert!(!path.exists());
}

#[test]
fn test_backup_waiting_on_gate_can_be_interrupted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("blocked.bin");
    let device = Arc::new(setup_device_with_data());
    let before = device.read(0, TOTAL_SIZE);

    let permit = device.gate().try_acquire().unwrap();
    let token = CancelToken::new();

    let waiter = {
        let device = Arc::clone(&device);
        let token = token.clone();
        let path = path.clone();
        thread::spawn(move || device.backup(&path, &token).map(|_| ()))
    };

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    assert!(matches!(waiter.join().unwrap(), Err(VBlockError::Interrupted)));
    assert!(!path.exists());
    assert_eq!(device.read(0, TOTAL_SIZE), before);
    drop(permit);
}

#[test]
fn test_read_region_waiting_on_gate_can_be_interrupted() {
    let device = Arc::new(setup_device_with_data());
    let permit = device.gate().try_acquire().unwrap();
    let token = CancelToken::new();

    let waiter = {
        let device = Arc::clone(&device);
        let token = token.clone();
        thread::spawn(move || device.read_region(0, &token).map(|_| ()))
    };

    thread::sleep(Duration::from_millis(50));
    token.cancel();

    assert!(matches!(waiter.join().unwrap(), Err(VBlockError::Interrupted)));
    drop(permit);

    // Non-bulk operations never needed the gate
    assert_eq!(device.read(0, 5), b"HELLO");
}

#[test]
fn test_ordinary_ops_ignore_held_gate() {
    let device = setup_device_with_data();
    let _permit = device.gate().try_acquire().unwrap();

    device.write_frame(b"0:WORLD").unwrap();
    device.lock_region(3).unwrap();
    device.erase_region(2).unwrap();
    assert_eq!(device.read(0, 5), b"WORLD");
    assert_eq!(device.read_mirror(0).unwrap().region, 0);
    assert_eq!(device.info().lock_bitmap, 0b1000);
}
