//! Protocol Module
//!
//! Defines the wire protocol for client-server communication and the
//! textual write frame.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │  Op (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Operations
//! - 0x01: READ          - Payload: offset (4) + len (4)
//! - 0x02: WRITE         - Payload: `[key:]offset:data`
//! - 0x0F: PING          - Payload: empty
//! - 0x81: LOCK_REGION   - Payload: region (4)
//! - 0x82: UNLOCK_REGION - Payload: region (4)
//! - 0x83: READ_REGION   - Payload: region (4)
//! - 0x84: GET_INFO      - Payload: empty
//! - 0x85: ERASE_REGION  - Payload: region (4)
//! - 0x94: BACKUP        - Payload: path
//! - 0x95: READ_MIRROR   - Payload: region (4)
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: INVALID_ARGUMENT
//! - 0x02: PERMISSION_DENIED
//! - 0x03: OUT_OF_RANGE
//! - 0x04: INTERRUPTED
//! - 0x05: IO_FAILURE
//! - 0x06: UNSUPPORTED
//! - 0x7F: ERROR

mod codec;
mod command;
mod frame;
mod response;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_command_frame, read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use command::{Command, CommandType};
pub use frame::WriteRequest;
pub use response::{Reply, Response, Status};
