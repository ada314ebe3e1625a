//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │  Op (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - READ:                    offset (4) + len (4)
//! - WRITE:                   raw write frame
//! - LOCK/UNLOCK/READ_REGION/
//!   READ_MIRROR/ERASE:       region (4, signed)
//! - BACKUP:                  UTF-8 path
//! - GET_INFO, PING:          empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Command, CommandType, Response, Status};
use crate::error::{Result, VBlockError};

/// Header size: 1 byte op/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 KB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: op (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();
    match command {
        Command::Read { offset, len } => {
            payload.put_u32(*offset);
            payload.put_u32(*len);
        }
        Command::Write { frame } => payload.put_slice(frame),
        Command::LockRegion { region }
        | Command::UnlockRegion { region }
        | Command::ReadRegion { region }
        | Command::ReadMirror { region }
        | Command::EraseRegion { region } => payload.put_i32(*region),
        Command::Backup { path } => payload.put_slice(path.as_bytes()),
        Command::GetInfo | Command::Ping => {}
    }

    frame_message(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
///
/// An unknown op code yields `Unsupported`, a malformed payload `Protocol`.
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (op, payload) = split_message(bytes, "command")?;

    let command_type = CommandType::try_from(op)?;
    let mut payload = payload;

    match command_type {
        CommandType::Read => {
            expect_len(command_type, payload, 8)?;
            let offset = payload.get_u32();
            let len = payload.get_u32();
            Ok(Command::Read { offset, len })
        }
        CommandType::Write => Ok(Command::Write {
            frame: payload.to_vec(),
        }),
        CommandType::LockRegion => Ok(Command::LockRegion {
            region: decode_region(command_type, payload)?,
        }),
        CommandType::UnlockRegion => Ok(Command::UnlockRegion {
            region: decode_region(command_type, payload)?,
        }),
        CommandType::ReadRegion => Ok(Command::ReadRegion {
            region: decode_region(command_type, payload)?,
        }),
        CommandType::ReadMirror => Ok(Command::ReadMirror {
            region: decode_region(command_type, payload)?,
        }),
        CommandType::EraseRegion => Ok(Command::EraseRegion {
            region: decode_region(command_type, payload)?,
        }),
        CommandType::Backup => {
            let path = std::str::from_utf8(payload).map_err(|e| {
                VBlockError::Protocol(format!("BACKUP command: path is not UTF-8: {}", e))
            })?;
            Ok(Command::Backup {
                path: path.to_string(),
            })
        }
        CommandType::GetInfo => {
            expect_len(command_type, payload, 0)?;
            Ok(Command::GetInfo)
        }
        CommandType::Ping => {
            expect_len(command_type, payload, 0)?;
            Ok(Command::Ping)
        }
    }
}

fn decode_region(command_type: CommandType, mut payload: &[u8]) -> Result<i32> {
    expect_len(command_type, payload, 4)?;
    Ok(payload.get_i32())
}

fn expect_len(command_type: CommandType, payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() != expected {
        return Err(VBlockError::Protocol(format!(
            "{:?} command: expected {} payload bytes, got {}",
            command_type,
            expected,
            payload.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame_message(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_message(bytes, "response")?;
    let status = Status::from_byte(status_byte)?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame_message(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Validate a full message and split it into (tag, payload)
fn split_message<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(VBlockError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let tag = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(VBlockError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(VBlockError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete message (header + payload) from a stream
fn read_message<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = (&header[1..]).get_u32();
    check_payload_len(payload_len, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

/// Read one raw command frame (header + payload) without decoding it
///
/// An error here means the stream position is unknown: either the reader
/// failed or the header announced an oversized payload that was not read.
pub fn read_command_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    read_message(reader, "command")
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs. The whole
/// frame is consumed before decoding, so a decode error leaves the stream
/// positioned at the next command.
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_command_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_message(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
