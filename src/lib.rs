//! # vblock
//!
//! A 4 KiB in-memory virtual block device with:
//! - Eight fixed 512-byte regions, each with its own lock
//! - Administrative region locks gated by an allow-list of integer keys
//! - Optional write mirroring into a secondary buffer
//! - Gate-serialized bulk reads and flat-file backups
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Command Dispatch (VBlock)                   │
//! │        byte-range read/write + control operations            │
//! └──────────┬───────────────────────────────┬──────────────────┘
//!            │                               │ bulk ops
//!            ▼                               ▼
//!   ┌─────────────────┐            ┌───────────────────┐
//!   │  KeyAuthority   │            │   SnapshotGate    │
//!   │  (allow-list)   │            │  (one permit)     │
//!   └────────┬────────┘            └─────────┬─────────┘
//!            │                               │
//!            ▼                               ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │       RegionTable: 8 × Mutex<primary + mirror>      │
//!   │                 + lock bitmap                       │
//!   └─────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod auth;
pub mod snapshot;
pub mod protocol;
pub mod network;
pub mod device;
pub mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{VBlockError, Result};
pub use config::Config;
pub use device::{backup_to_file, DeviceInfo, RegionData, VBlock};
pub use handle::Handle;
pub use snapshot::{BackupReport, CancelToken};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of vblock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
