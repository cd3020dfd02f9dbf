//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - CREATE: JSON object
//! - LIST:   empty
//! - GET:    id_len (4 bytes) + id
//! - UPDATE: id_len (4 bytes) + id + JSON object
//! - DELETE: id_len (4 bytes) + id
//! - PING:   empty
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

use crate::error::{EventEaseError, Result};
use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut payload = BytesMut::new();
    match command {
        Command::Create { body } => payload.put_slice(body),
        Command::List | Command::Ping => {}
        Command::Get { id } | Command::Delete { id } => put_id(&mut payload, id),
        Command::Update { id, body } => {
            put_id(&mut payload, id);
            payload.put_slice(body);
        }
    }

    frame(command.command_type() as u8, &payload, "command")
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    match cmd_type {
        0x01 => Ok(Command::Create {
            body: payload.to_vec(),
        }),
        0x02 => expect_empty(payload, "LIST").map(|_| Command::List),
        0x03 => decode_id_only(payload, "GET").map(|id| Command::Get { id }),
        0x04 => {
            let mut rest = payload;
            let id = take_id(&mut rest, "UPDATE")?;
            Ok(Command::Update {
                id,
                body: rest.to_vec(),
            })
        }
        0x05 => decode_id_only(payload, "DELETE").map(|id| Command::Delete { id }),
        0x06 => expect_empty(payload, "PING").map(|_| Command::Ping),
        _ => Err(EventEaseError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

fn put_id(buf: &mut BytesMut, id: &str) {
    buf.put_u32(id.len() as u32);
    buf.put_slice(id.as_bytes());
}

/// Read `id_len (4) + id` off the front of `payload`
fn take_id(payload: &mut &[u8], name: &str) -> Result<String> {
    if payload.remaining() < 4 {
        return Err(EventEaseError::Protocol(format!(
            "{} command: missing id length",
            name
        )));
    }

    let id_len = payload.get_u32() as usize;
    if payload.remaining() < id_len {
        return Err(EventEaseError::Protocol(format!(
            "{} command: incomplete id (expected {}, got {})",
            name,
            id_len,
            payload.remaining()
        )));
    }

    let id = std::str::from_utf8(&payload[..id_len])
        .map_err(|_| EventEaseError::Protocol(format!("{} command: id is not UTF-8", name)))?
        .to_string();
    payload.advance(id_len);

    Ok(id)
}

fn decode_id_only(payload: &[u8], name: &str) -> Result<String> {
    let mut rest = payload;
    let id = take_id(&mut rest, name)?;
    if rest.has_remaining() {
        return Err(EventEaseError::Protocol(format!(
            "{} command: {} unexpected trailing bytes",
            name,
            rest.remaining()
        )));
    }
    Ok(id)
}

fn expect_empty(payload: &[u8], name: &str) -> Result<()> {
    if !payload.is_empty() {
        return Err(EventEaseError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
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
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload, "response")
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        EventEaseError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing
// =============================================================================

/// Frame a payload, refusing anything the reading side would reject
fn frame(kind: u8, payload: &[u8], what: &str) -> Result<Vec<u8>> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| {
        EventEaseError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what,
            payload.len(),
            MAX_PAYLOAD_SIZE
        ))
    })?;
    check_payload_len(payload_len, what)?;

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload_len);
    message.put_slice(payload);
    Ok(message.to_vec())
}

/// Validate a complete frame and split it into (type byte, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(EventEaseError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = header.get_u32();
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(EventEaseError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(EventEaseError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a stream
///
/// Blocks until the frame is received or an error occurs
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let mut len_bytes = &header[1..];
    let payload_len = len_bytes.get_u32();
    check_payload_len(payload_len, what)?;

    let mut message = Vec::with_capacity(HEADER_SIZE + payload_len as usize);
    message.extend_from_slice(&header);
    message.resize(HEADER_SIZE + payload_len as usize, 0);
    reader.read_exact(&mut message[HEADER_SIZE..])?;

    Ok(message)
}

/// Read a complete command from a stream
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response)?)?;
    writer.flush()?;
    Ok(())
}
