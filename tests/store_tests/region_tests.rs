//! Tests for RegionTable and RegionId
//!
//! These tests verify:
//! - Region index validation and geometry
//! - Byte-range reads clamped to the store and split per region
//! - Lock bitmap updates through region guards
//! - Mirror duplication of writes and erases
//! - Observer notifications for lock traffic

use std::sync::Arc;

use parking_lot::Mutex;
use vblock::store::{
    LockEvent, LockObserver, RegionId, RegionTable, NUM_REGIONS, REGION_SIZE, TOTAL_SIZE,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn region(index: i64) -> RegionId {
    RegionId::new(index).unwrap()
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<LockEvent>>,
}

impl LockObserver for Recorder {
    fn observe(&self, event: LockEvent) {
        self.events.lock().push(event);
    }
}

// =============================================================================
// Geometry Tests
// =============================================================================

#[test]
fn test_geometry_constants() {
    assert_eq!(TOTAL_SIZE, 4096);
    assert_eq!(REGION_SIZE, 512);
    assert_eq!(NUM_REGIONS, 8);
    assert_eq!(TOTAL_SIZE, REGION_SIZE * NUM_REGIONS);
}

#[test]
fn test_region_id_accepts_valid_indices() {
    for i in 0..NUM_REGIONS as i64 {
        assert_eq!(region(i).index(), i as usize);
    }
}

#[test]
fn test_region_id_rejects_out_of_range() {
    assert!(RegionId::new(-1).is_err());
    assert!(RegionId::new(8).is_err());
    assert!(RegionId::new(i64::MAX).is_err());
}

#[test]
fn test_region_id_ranges() {
    assert_eq!(region(0).range(), 0..512);
    assert_eq!(region(3).range(), 1536..2048);
    assert_eq!(region(7).range(), 3584..4096);
    assert_eq!(region(5).bit(), 0b0010_0000);
}

#[test]
fn test_region_id_containing() {
    assert_eq!(RegionId::containing(0), region(0));
    assert_eq!(RegionId::containing(511), region(0));
    assert_eq!(RegionId::containing(512), region(1));
    assert_eq!(RegionId::containing(4095), region(7));
}

#[test]
fn test_region_id_all_in_order() {
    let all: Vec<usize> = RegionId::all().map(|r| r.index()).collect();
    assert_eq!(all, (0..NUM_REGIONS).collect::<Vec<_>>());
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_new_table_is_zeroed() {
    let table = RegionTable::new(false);
    let mut buf = vec![0xFFu8; TOTAL_SIZE];

    assert_eq!(table.read(0, &mut buf), TOTAL_SIZE);
    assert!(buf.iter().all(|&b| b == 0));
    assert_eq!(table.bitmap(), 0);
}

#[test]
fn test_read_past_end_returns_nothing() {
    let table = RegionTable::new(false);
    let mut buf = [0u8; 16];

    assert_eq!(table.read(TOTAL_SIZE, &mut buf), 0);
    assert_eq!(table.read(TOTAL_SIZE + 100, &mut buf), 0);
}

#[test]
fn test_read_clamps_to_end() {
    let table = RegionTable::new(false);
    let mut buf = [0u8; 64];

    assert_eq!(table.read(TOTAL_SIZE - 10, &mut buf), 10);
}

#[test]
fn test_read_spans_regions() {
    let table = RegionTable::new(false);
    table.lock(region(0)).write(510, b"ab");
    table.lock(region(1)).write(0, b"cd");

    let mut buf = [0u8; 4];
    assert_eq!(table.read(510, &mut buf), 4);
    assert_eq!(&buf, b"abcd");
}

// =============================================================================
// Guard Tests
// =============================================================================

#[test]
fn test_guard_write_and_erase() {
    let table = RegionTable::new(false);
    {
        let mut guard = table.lock(region(2));
        assert_eq!(guard.region(), region(2));
        guard.write(10, b"HELLO");
        assert_eq!(&guard.primary()[10..15], b"HELLO");
        guard.erase();
        assert!(guard.primary().iter().all(|&b| b == 0));
    }
}

#[test]
fn test_guard_set_locked_updates_bitmap() {
    let table = RegionTable::new(false);

    table.lock(region(1)).set_locked(true);
    table.lock(region(6)).set_locked(true);
    assert_eq!(table.bitmap(), 0b0100_0010);
    assert!(table.is_locked(region(1)));
    assert!(!table.is_locked(region(0)));

    table.lock(region(1)).set_locked(false);
    assert_eq!(table.bitmap(), 0b0100_0000);
}

#[test]
fn test_unmirrored_table_leaves_mirror_zero() {
    let table = RegionTable::new(false);
    let mut guard = table.lock(region(0));
    guard.write(0, b"DATA");

    assert!(guard.mirror().iter().all(|&b| b == 0));
}

#[test]
fn test_mirrored_table_duplicates_writes_and_erases() {
    let table = RegionTable::new(true);
    let mut guard = table.lock(region(4));

    guard.write(100, b"MIRROR");
    assert_eq!(guard.primary(), guard.mirror());

    guard.erase();
    assert!(guard.mirror().iter().all(|&b| b == 0));
}

// =============================================================================
// Observer Tests
// =============================================================================

#[test]
fn test_observer_sees_acquire_and_release() {
    let recorder = Arc::new(Recorder::default());
    let table = RegionTable::new(false).with_observer(recorder.clone());

    drop(table.lock(region(3)));

    assert_eq!(
        *recorder.events.lock(),
        vec![LockEvent::Acquired(region(3)), LockEvent::Released(region(3))]
    );
}

#[test]
fn test_observer_sees_each_region_of_a_spanning_read() {
    let recorder = Arc::new(Recorder::default());
    let table = RegionTable::new(false).with_observer(recorder.clone());

    let mut buf = [0u8; 1024];
    table.read(256, &mut buf);

    assert_eq!(
        *recorder.events.lock(),
        vec![
            LockEvent::Acquired(region(0)),
            LockEvent::Released(region(0)),
            LockEvent::Acquired(region(1)),
            LockEvent::Released(region(1)),
            LockEvent::Acquired(region(2)),
            LockEvent::Released(region(2)),
        ]
    );
}
