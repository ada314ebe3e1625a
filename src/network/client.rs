//! TCP Client
//!
//! Blocking client speaking the binary protocol.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::device::{DeviceInfo, RegionData};
use crate::error::{Result, VBlockError};
use crate::protocol::{read_response, write_command, Command};
use crate::snapshot::BackupReport;

/// A connection to a vblock server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one command and return the OK payload
    ///
    /// Non-OK statuses come back as the matching `VBlockError`.
    pub fn call(&mut self, command: &Command) -> Result<Option<Vec<u8>>> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)?.into_result()
    }

    pub fn ping(&mut self) -> Result<()> {
        self.call(&Command::Ping).map(|_| ())
    }

    /// Read up to `len` bytes starting at `offset`
    pub fn read(&mut self, offset: u32, len: u32) -> Result<Vec<u8>> {
        Ok(self.call(&Command::Read { offset, len })?.unwrap_or_default())
    }

    /// Send a `[key:]offset:data` frame, returning the bytes consumed
    pub fn write(&mut self, frame: &[u8]) -> Result<usize> {
        let payload = self.call(&Command::Write {
            frame: frame.to_vec(),
        })?;
        let bytes: [u8; 4] = payload
            .as_deref()
            .and_then(|p| p.try_into().ok())
            .ok_or_else(|| VBlockError::Protocol("WRITE reply: expected 4-byte count".to_string()))?;
        Ok(u32::from_be_bytes(bytes) as usize)
    }

    pub fn lock_region(&mut self, region: i32) -> Result<()> {
        self.call(&Command::LockRegion { region }).map(|_| ())
    }

    pub fn unlock_region(&mut self, region: i32) -> Result<()> {
        self.call(&Command::UnlockRegion { region }).map(|_| ())
    }

    pub fn erase_region(&mut self, region: i32) -> Result<()> {
        self.call(&Command::EraseRegion { region }).map(|_| ())
    }

    pub fn read_region(&mut self, region: i32) -> Result<RegionData> {
        let payload = self.call(&Command::ReadRegion { region })?;
        decode_body(payload, "READ_REGION")
    }

    pub fn read_mirror(&mut self, region: i32) -> Result<RegionData> {
        let payload = self.call(&Command::ReadMirror { region })?;
        decode_body(payload, "READ_MIRROR")
    }

    pub fn info(&mut self) -> Result<DeviceInfo> {
        let payload = self.call(&Command::GetInfo)?;
        decode_body(payload, "GET_INFO")
    }

    /// Ask the server to export its store to `path` (server-side filesystem)
    pub fn backup(&mut self, path: &str) -> Result<BackupReport> {
        let payload = self.call(&Command::Backup {
            path: path.to_string(),
        })?;
        decode_body(payload, "BACKUP")
    }
}

fn decode_body<T: serde::de::DeserializeOwned>(payload: Option<Vec<u8>>, what: &str) -> Result<T> {
    let payload = payload
        .ok_or_else(|| VBlockError::Protocol(format!("{} reply: missing payload", what)))?;
    Ok(bincode::deserialize(&payload)?)
}
