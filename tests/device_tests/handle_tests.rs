//! Handle tests
//!
//! These tests verify:
//! - Seek bounds and whence handling
//! - Reads advance the cursor and clamp at the end of the store
//! - Writes move the cursor past the written payload
//! - `std::io` trait adapters map device errors to `io::ErrorKind`

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use vblock::store::TOTAL_SIZE;
use vblock::{Config, Handle, VBlock, VBlockError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_handle() -> Handle {
    let config = Config::builder().authorized_keys([5]).build();
    let device = Arc::new(VBlock::open(config).unwrap());
    device.handle()
}

// =============================================================================
// Seek Tests
// =============================================================================

#[test]
fn test_seek_whence() {
    let mut handle = setup_handle();

    assert_eq!(handle.seek_to(SeekFrom::Start(100)).unwrap(), 100);
    assert_eq!(handle.seek_to(SeekFrom::Current(-40)).unwrap(), 60);
    assert_eq!(handle.seek_to(SeekFrom::End(-96)).unwrap(), 4000);
    assert_eq!(handle.position(), 4000);
}

#[test]
fn test_seek_to_both_ends() {
    let mut handle = setup_handle();

    assert_eq!(handle.seek_to(SeekFrom::End(0)).unwrap(), TOTAL_SIZE as u64);
    assert_eq!(handle.seek_to(SeekFrom::Start(0)).unwrap(), 0);
}

#[test]
fn test_seek_out_of_range_keeps_position() {
    let mut handle = setup_handle();
    handle.seek_to(SeekFrom::Start(10)).unwrap();

    let err = handle.seek_to(SeekFrom::Current(-11)).unwrap_err();
    assert!(matches!(err, VBlockError::OutOfRange(_)));

    let err = handle.seek_to(SeekFrom::End(1)).unwrap_err();
    assert!(matches!(err, VBlockError::OutOfRange(_)));

    let err = handle.seek_to(SeekFrom::Start(4097)).unwrap_err();
    assert!(matches!(err, VBlockError::OutOfRange(_)));

    assert_eq!(handle.position(), 10);
}

// =============================================================================
// Read / Write Tests
// =============================================================================

#[test]
fn test_read_advances_cursor() {
    let mut handle = setup_handle();
    handle.device().write_frame(b"0:HELLOWORLD").unwrap();

    let mut buf = [0u8; 5];
    handle.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"HELLO");
    assert_eq!(handle.position(), 5);

    handle.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"WORLD");
    assert_eq!(handle.position(), 10);
}

#[test]
fn test_read_at_end_returns_zero() {
    let mut handle = setup_handle();
    handle.seek_to(SeekFrom::End(-4)).unwrap();

    let mut buf = [0xFFu8; 16];
    assert_eq!(handle.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf[..4], &[0, 0, 0, 0]);
    assert_eq!(handle.read(&mut buf).unwrap(), 0);
    assert_eq!(handle.position(), TOTAL_SIZE as u64);
}

#[test]
fn test_read_to_end_reads_whole_store() {
    let mut handle = setup_handle();
    handle.device().write_frame(b"4000:last").unwrap();

    let mut contents = Vec::new();
    handle.read_to_end(&mut contents).unwrap();
    assert_eq!(contents.len(), TOTAL_SIZE);
    assert_eq!(&contents[4000..4004], b"last");
}

#[test]
fn test_write_frame_moves_cursor_past_payload() {
    let mut handle = setup_handle();
    handle.seek_to(SeekFrom::Start(3000)).unwrap();

    assert_eq!(handle.write_frame(b"100:abc").unwrap(), 7);
    assert_eq!(handle.position(), 103);

    assert_eq!(handle.write_frame(b"5:600:keyed").unwrap(), 11);
    assert_eq!(handle.position(), 605);
}

#[test]
fn test_empty_payload_leaves_cursor() {
    let mut handle = setup_handle();
    handle.seek_to(SeekFrom::Start(42)).unwrap();

    assert_eq!(handle.write_frame(b"100:").unwrap(), 0);
    assert_eq!(handle.write_frame(b"").unwrap(), 0);
    assert_eq!(handle.position(), 42);
}

#[test]
fn test_rejected_write_leaves_cursor() {
    let mut handle = setup_handle();
    handle.seek_to(SeekFrom::Start(7)).unwrap();
    handle.device().lock_region(0).unwrap();

    let err = handle.write_frame(b"0:nope").unwrap_err();
    assert!(matches!(err, VBlockError::PermissionDenied(_)));
    assert_eq!(handle.position(), 7);
}

#[test]
fn test_handles_share_the_device() {
    let mut a = setup_handle();
    let mut b = a.device().handle();

    a.write_frame(b"20:shared").unwrap();
    b.seek_to(SeekFrom::Start(20)).unwrap();

    let mut buf = [0u8; 6];
    b.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"shared");
    assert_eq!(a.position(), 26);
    assert_eq!(b.position(), 26);
}

// =============================================================================
// std::io Adapter Tests
// =============================================================================

#[test]
fn test_io_write_consumes_whole_frame() {
    let mut handle = setup_handle();

    assert_eq!(handle.write(b"9:abc").unwrap(), 5);
    assert_eq!(handle.write(b"9:").unwrap(), 2);
    handle.flush().unwrap();
    assert_eq!(handle.device().read(9, 3), b"abc");
}

#[test]
fn test_io_errors_map_to_kinds() {
    let mut handle = setup_handle();
    handle.device().lock_region(1).unwrap();

    let err = handle.write(b"512:x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

    let err = handle.write(b"not a frame").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

    let err = handle.seek(SeekFrom::Current(-1)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_io_seek_matches_seek_to() {
    let mut handle = setup_handle();
    assert_eq!(handle.seek(SeekFrom::End(-1)).unwrap(), 4095);
    assert_eq!(handle.stream_position().unwrap(), 4095);
}
