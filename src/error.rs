//! Error types for vblock
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::Status;

/// Result type alias using VBlockError
pub type Result<T> = std::result::Result<T, VBlockError>;

/// Unified error type for vblock operations
#[derive(Debug, Error)]
pub enum VBlockError {
    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // -------------------------------------------------------------------------
    // Coordination Errors
    // -------------------------------------------------------------------------
    #[error("Interrupted while waiting for the snapshot gate")]
    Interrupted,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VBlockError {
    /// Wire status reported to clients for this error
    pub fn status(&self) -> Status {
        match self {
            VBlockError::InvalidArgument(_) | VBlockError::Protocol(_) => Status::InvalidArgument,
            VBlockError::PermissionDenied(_) => Status::PermissionDenied,
            VBlockError::OutOfRange(_) => Status::OutOfRange,
            VBlockError::Unsupported(_) => Status::Unsupported,
            VBlockError::Interrupted => Status::Interrupted,
            VBlockError::Io(_) => Status::IoFailure,
            VBlockError::Serialization(_) | VBlockError::Network(_) | VBlockError::Config(_) => {
                Status::Error
            }
        }
    }

    /// Rebuild an error from a status and message received over the wire
    pub fn from_status(status: Status, message: String) -> Self {
        match status {
            Status::InvalidArgument => VBlockError::InvalidArgument(message),
            Status::PermissionDenied => VBlockError::PermissionDenied(message),
            Status::OutOfRange => VBlockError::OutOfRange(message),
            Status::Interrupted => VBlockError::Interrupted,
            Status::IoFailure => {
                VBlockError::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
            }
            Status::Unsupported => VBlockError::Unsupported(message),
            Status::Ok | Status::Error => VBlockError::Network(message),
        }
    }
}

impl From<bincode::Error> for VBlockError {
    fn from(err: bincode::Error) -> Self {
        VBlockError::Serialization(err.to_string())
    }
}

impl From<VBlockError> for std::io::Error {
    fn from(err: VBlockError) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            VBlockError::Io(e) => return std::io::Error::new(e.kind(), err.to_string()),
            VBlockError::InvalidArgument(_) | VBlockError::OutOfRange(_) => ErrorKind::InvalidInput,
            VBlockError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            VBlockError::Interrupted => ErrorKind::Interrupted,
            VBlockError::Unsupported(_) => ErrorKind::Unsupported,
            VBlockError::Protocol(_) | VBlockError::Serialization(_) => ErrorKind::InvalidData,
            VBlockError::Network(_) | VBlockError::Config(_) => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
