//! Store Module
//!
//! The fixed-geometry byte store and its per-region locking.
//!
//! ## Responsibilities
//! - Own the primary and mirror buffers
//! - One concurrency lock per region, guarding both buffers for that region
//! - The administrative lock bitmap (which regions require a key to write)
//!
//! ## Layout
//! ```text
//!  0        512      1024     1536     2048     2560     3072     3584     4096
//!  ├────────┼────────┼────────┼────────┼────────┼────────┼────────┼────────┤
//!  │   R0   │   R1   │   R2   │   R3   │   R4   │   R5   │   R6   │   R7   │
//!  └────────┴────────┴────────┴────────┴────────┴────────┴────────┴────────┘
//!   bitmap bit i  <=>  region i administratively locked
//! ```

mod observer;
mod table;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VBlockError};

pub use observer::{BulkKind, LockEvent, LockObserver};
pub use table::{RegionGuard, RegionTable};

/// Total size of the store in bytes
pub const TOTAL_SIZE: usize = 4096;

/// Size of one region in bytes
pub const REGION_SIZE: usize = 512;

/// Number of regions
pub const NUM_REGIONS: usize = TOTAL_SIZE / REGION_SIZE;

const _: () = assert!(TOTAL_SIZE == REGION_SIZE * NUM_REGIONS);
const _: () = assert!(NUM_REGIONS <= u8::BITS as usize);

/// A validated region index in `[0, NUM_REGIONS)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u8);

impl RegionId {
    /// Validate a region index coming from a caller
    pub fn new(index: i64) -> Result<Self> {
        if index < 0 || index >= NUM_REGIONS as i64 {
            return Err(VBlockError::InvalidArgument(format!(
                "region index {} out of range [0, {})",
                index, NUM_REGIONS
            )));
        }
        Ok(Self(index as u8))
    }

    /// The region holding byte `offset`
    ///
    /// `offset` must be below `TOTAL_SIZE`.
    pub fn containing(offset: usize) -> Self {
        debug_assert!(offset < TOTAL_SIZE);
        Self((offset / REGION_SIZE) as u8)
    }

    /// All regions in ascending order
    pub fn all() -> impl Iterator<Item = RegionId> {
        (0..NUM_REGIONS as u8).map(RegionId)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// First byte of this region
    pub fn start(self) -> usize {
        self.index() * REGION_SIZE
    }

    /// Byte range covered by this region
    pub fn range(self) -> Range<usize> {
        self.start()..self.start() + REGION_SIZE
    }

    /// This region's bit in the lock bitmap
    pub fn bit(self) -> u8 {
        1u8 << self.0
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
