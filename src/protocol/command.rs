//! Command definitions
//!
//! Represents requests from clients.

use crate::error::VBlockError;

/// Command types
///
/// Control operations live in the `0x80` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Read = 0x01,
    Write = 0x02,
    Ping = 0x0F,
    LockRegion = 0x81,
    UnlockRegion = 0x82,
    ReadRegion = 0x83,
    GetInfo = 0x84,
    EraseRegion = 0x85,
    Backup = 0x94,
    ReadMirror = 0x95,
}

impl TryFrom<u8> for CommandType {
    type Error = VBlockError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x01 => CommandType::Read,
            0x02 => CommandType::Write,
            0x0F => CommandType::Ping,
            0x81 => CommandType::LockRegion,
            0x82 => CommandType::UnlockRegion,
            0x83 => CommandType::ReadRegion,
            0x84 => CommandType::GetInfo,
            0x85 => CommandType::EraseRegion,
            0x94 => CommandType::Backup,
            0x95 => CommandType::ReadMirror,
            other => {
                return Err(VBlockError::Unsupported(format!(
                    "unknown operation code 0x{:02x}",
                    other
                )))
            }
        })
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read up to `len` bytes starting at `offset`
    Read { offset: u32, len: u32 },

    /// Framed write: `[key:]offset:data`
    Write { frame: Vec<u8> },

    /// Health check
    Ping,

    /// Mark a region as requiring a key to write
    LockRegion { region: i32 },

    /// Clear a region's key requirement
    UnlockRegion { region: i32 },

    /// Gated copy of a whole region
    ReadRegion { region: i32 },

    /// Copy of a region's mirror
    ReadMirror { region: i32 },

    /// Geometry and lock bitmap
    GetInfo,

    /// Zero a region
    EraseRegion { region: i32 },

    /// Export the store to a file on the server's filesystem
    Backup { path: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Read { .. } => CommandType::Read,
            Command::Write { .. } => CommandType::Write,
            Command::Ping => CommandType::Ping,
            Command::LockRegion { .. } => CommandType::LockRegion,
            Command::UnlockRegion { .. } => CommandType::UnlockRegion,
            Command::ReadRegion { .. } => CommandType::ReadRegion,
            Command::ReadMirror { .. } => CommandType::ReadMirror,
            Command::GetInfo => CommandType::GetInfo,
            Command::EraseRegion { .. } => CommandType::EraseRegion,
            Command::Backup { .. } => CommandType::Backup,
        }
    }

    /// Whether this command goes through the snapshot gate
    pub fn is_bulk(&self) -> bool {
        matches!(self, Command::ReadRegion { .. } | Command::Backup { .. })
    }
}
