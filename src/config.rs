//! Configuration for vblock
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, VBlockError};

/// Maximum number of authorized keys a device accepts
pub const MAX_AUTHORIZED_KEYS: usize = 8;

/// Default upper bound on a single write frame, in bytes
pub const DEFAULT_MAX_FRAME_LEN: usize = 1023;

/// Main configuration for a vblock device and its server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Keys allowed to write into administratively locked regions.
    /// Fixed for the lifetime of the device.
    pub authorized_keys: Vec<i32>,

    /// Duplicate every write into the mirror buffer
    pub mirror_enabled: bool,

    /// Largest accepted write frame (`[key:]offset:data`), in bytes
    pub max_frame_len: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authorized_keys: Vec::new(),
            mirror_enabled: false,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            listen_addr: "127.0.0.1:7410".to_string(),
            max_connections: 64,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the device-level limits
    pub fn validate(&self) -> Result<()> {
        if self.authorized_keys.len() > MAX_AUTHORIZED_KEYS {
            return Err(VBlockError::Config(format!(
                "too many authorized keys: {} (max {})",
                self.authorized_keys.len(),
                MAX_AUTHORIZED_KEYS
            )));
        }
        if self.max_frame_len == 0 {
            return Err(VBlockError::Config(
                "max_frame_len must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Replace the authorized key list
    pub fn authorized_keys(mut self, keys: impl IntoIterator<Item = i32>) -> Self {
        self.config.authorized_keys = keys.into_iter().collect();
        self
    }

    /// Add a single authorized key
    pub fn authorize(mut self, key: i32) -> Self {
        self.config.authorized_keys.push(key);
        self
    }

    /// Enable or disable write mirroring
    pub fn mirror_enabled(mut self, enabled: bool) -> Self {
        self.config.mirror_enabled = enabled;
        self
    }

    /// Set the largest accepted write frame (in bytes)
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.config.max_frame_len = len;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
