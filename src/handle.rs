//! Device handle
//!
//! A cursor over a shared device, the open-file view of the store.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::device::VBlock;
use crate::error::{Result, VBlockError};
use crate::protocol::WriteRequest;
use crate::store::TOTAL_SIZE;

/// Per-caller cursor over a [`VBlock`]
///
/// Reads start at the cursor. Writes take their offset from the frame and
/// leave the cursor just past the written payload.
pub struct Handle {
    device: Arc<VBlock>,
    pos: u64,
}

impl Handle {
    pub fn new(device: Arc<VBlock>) -> Self {
        Self { device, pos: 0 }
    }

    /// Current cursor position
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move the cursor; the target must lie in `[0, TOTAL_SIZE]`
    pub fn seek_to(&mut self, from: SeekFrom) -> Result<u64> {
        let target = match from {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => TOTAL_SIZE as i128 + i128::from(delta),
        };

        if target < 0 || target > TOTAL_SIZE as i128 {
            return Err(VBlockError::OutOfRange(format!(
                "seek target {} outside [0, {}]",
                target, TOTAL_SIZE
            )));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }

    /// Apply a write frame, moving the cursor past the payload
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<usize> {
        let written = self.device.write_frame(frame)?;
        if written > 0 {
            let request = WriteRequest::parse(frame)?;
            self.pos = u64::from(request.offset) + request.data.len() as u64;
        }
        Ok(written)
    }

    pub fn device(&self) -> &Arc<VBlock> {
        &self.device
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let copied = self.device.read_into(self.pos as usize, buf);
        self.pos += copied as u64;
        Ok(copied)
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_frame(buf)?;
        // The frame is consumed as a unit, even when the payload was empty.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}
