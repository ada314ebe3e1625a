//! Response definitions
//!
//! Represents responses to clients and the typed replies they carry.

use crate::device::{DeviceInfo, RegionData};
use crate::error::{Result, VBlockError};
use crate::snapshot::BackupReport;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    InvalidArgument = 0x01,
    PermissionDenied = 0x02,
    OutOfRange = 0x03,
    Interrupted = 0x04,
    IoFailure = 0x05,
    Unsupported = 0x06,
    Error = 0x7F,
}

impl Status {
    /// Decode a status byte
    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            0x00 => Status::Ok,
            0x01 => Status::InvalidArgument,
            0x02 => Status::PermissionDenied,
            0x03 => Status::OutOfRange,
            0x04 => Status::Interrupted,
            0x05 => Status::IoFailure,
            0x06 => Status::Unsupported,
            0x7F => Status::Error,
            other => {
                return Err(VBlockError::Protocol(format!(
                    "Unknown response status: 0x{:02x}",
                    other
                )))
            }
        })
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (reply body for OK, error message otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an error response carrying the error's message
    pub fn error(err: &VBlockError) -> Self {
        Self {
            status: err.status(),
            payload: Some(err.to_string().into_bytes()),
        }
    }

    /// Turn a received response back into a result
    pub fn into_result(self) -> Result<Option<Vec<u8>>> {
        match self.status {
            Status::Ok => Ok(self.payload),
            status => {
                let message = self
                    .payload
                    .map(|p| String::from_utf8_lossy(&p).into_owned())
                    .unwrap_or_default();
                Err(VBlockError::from_status(status, message))
            }
        }
    }
}

/// Typed result of executing a command on a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Bytes from a byte-range read
    Data(Vec<u8>),

    /// Bytes consumed by a write
    Written(usize),

    /// A full region (primary or mirror)
    Region(RegionData),

    /// Device geometry and lock bitmap
    Info(DeviceInfo),

    /// A completed export
    Backup(BackupReport),

    /// Control operation without a body
    Done,

    Pong,
}

impl Reply {
    /// Encode the reply body for the wire
    ///
    /// Structured replies are bincode-encoded, reads are raw bytes, writes
    /// return the consumed count as a big-endian u32.
    pub fn into_response(self) -> Result<Response> {
        let payload = match self {
            Reply::Data(bytes) => Some(bytes),
            Reply::Written(count) => Some((count as u32).to_be_bytes().to_vec()),
            Reply::Region(region) => Some(bincode::serialize(&region)?),
            Reply::Info(info) => Some(bincode::serialize(&info)?),
            Reply::Backup(report) => Some(bincode::serialize(&report)?),
            Reply::Done => None,
            Reply::Pong => Some(b"PONG".to_vec()),
        };
        Ok(Response::ok(payload))
    }
}
