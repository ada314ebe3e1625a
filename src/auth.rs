//! Key authority
//!
//! Flat allow-list of integer keys permitted to write locked regions.

use crate::config::MAX_AUTHORIZED_KEYS;
use crate::error::{Result, VBlockError};

/// Immutable set of authorized write keys
#[derive(Debug, Clone, Default)]
pub struct KeyAuthority {
    keys: Vec<i32>,
}

impl KeyAuthority {
    /// Build an authority from at most `MAX_AUTHORIZED_KEYS` keys
    pub fn new(keys: &[i32]) -> Result<Self> {
        if keys.len() > MAX_AUTHORIZED_KEYS {
            return Err(VBlockError::Config(format!(
                "too many authorized keys: {} (max {})",
                keys.len(),
                MAX_AUTHORIZED_KEYS
            )));
        }
        Ok(Self {
            keys: keys.to_vec(),
        })
    }

    /// Whether `key` is in the allow-list
    pub fn is_authorized(&self, key: i32) -> bool {
        self.keys.iter().any(|&k| k == key)
    }

    /// Write policy for a region: unlocked regions accept any request,
    /// locked regions need an authorized key.
    pub fn permits(&self, region_locked: bool, key: Option<i32>) -> bool {
        !region_locked || key.map_or(false, |k| self.is_authorized(k))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
