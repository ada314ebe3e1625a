//! Write frame parsing
//!
//! Grammar:
//! ```text
//! frame := ( key ":" )? offset ":" data
//! key    := signed decimal (i32)
//! offset := unsigned decimal (u32)
//! data   := every remaining byte, never split further
//! ```
//!
//! The keyed form wins whenever the first two fields both parse, so
//! `"5:0:WORLD"` is key 5 / offset 0. Otherwise everything after the first
//! colon is data, which lets payloads carry colons (`"0:a:b"` writes `a:b`).
//! A frame such as `"5:abc:WORLD"` is therefore an unkeyed write of
//! `abc:WORLD` at offset 5.

use crate::error::{Result, VBlockError};

/// A parsed write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Key offered for locked regions
    pub key: Option<i32>,

    /// Global byte offset into the store
    pub offset: u32,

    /// Bytes to write
    pub data: Vec<u8>,
}

impl WriteRequest {
    pub fn new(key: Option<i32>, offset: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            key,
            offset,
            data: data.into(),
        }
    }

    /// Parse a `[key:]offset:data` frame
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let (head, rest) = split_field(frame).ok_or_else(|| {
            VBlockError::InvalidArgument("write frame needs at least one ':' separator".to_string())
        })?;

        if let Some((middle, data)) = split_field(rest) {
            if let (Some(key), Some(offset)) = (parse_number::<i32>(head), parse_number::<u32>(middle)) {
                return Ok(Self::new(Some(key), offset, data));
            }
        }

        let offset = parse_number::<u32>(head).ok_or_else(|| {
            VBlockError::InvalidArgument(format!(
                "invalid offset field {:?}",
                String::from_utf8_lossy(head)
            ))
        })?;
        Ok(Self::new(None, offset, rest))
    }

    /// Encode back into frame form
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = match self.key {
            Some(key) => format!("{}:{}:", key, self.offset).into_bytes(),
            None => format!("{}:", self.offset).into_bytes(),
        };
        frame.extend_from_slice(&self.data);
        frame
    }
}

/// Split at the first ':' into (field, remainder)
fn split_field(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = bytes.iter().position(|&b| b == b':')?;
    Some((&bytes[..pos], &bytes[pos + 1..]))
}

fn parse_number<T: std::str::FromStr>(field: &[u8]) -> Option<T> {
    std::str::from_utf8(field).ok()?.parse().ok()
}
