//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: CREATE - Payload: JSON object
//! - 0x02: LIST   - Payload: empty
//! - 0x03: GET    - Payload: id_len (4) + id
//! - 0x04: UPDATE - Payload: id_len (4) + id + JSON object
//! - 0x05: DELETE - Payload: id_len (4) + id
//! - 0x06: PING   - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK          (HTTP 200)
//! - 0x01: NOT_FOUND   (HTTP 404)
//! - 0x02: BAD_REQUEST (HTTP 400)
//! - 0x03: ERROR       (HTTP 500)

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    encode_command, decode_command, encode_response, decode_response,
    read_command, write_command, read_response, write_response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
