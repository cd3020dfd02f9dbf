//! Response definitions
//!
//! Represents responses to clients.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{EventEaseError, Result, TicketAction};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    BadRequest = 0x02,
    Error = 0x03,
}

impl Status {
    /// The HTTP status code this status stands for
    pub fn http_code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::BadRequest => 400,
            Status::Error => 500,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::BadRequest),
            0x03 => Some(Status::Error),
            _ => None,
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// JSON body for OK, message text otherwise
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK response carrying `value` as JSON
    pub fn ok_json<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Self::ok(Some(serde_json::to_vec(value)?)))
    }

    /// Create a NOT_FOUND response
    pub fn not_found(message: &str) -> Self {
        Self::with_message(Status::NotFound, message)
    }

    /// Create a BAD_REQUEST response
    pub fn bad_request(message: &str) -> Self {
        Self::with_message(Status::BadRequest, message)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::with_message(Status::Error, message)
    }

    /// Map a failed operation onto a response
    ///
    /// A missing ticket on GET is 404; on UPDATE/DELETE it is 400.
    /// Malformed requests are 400, everything else 500.
    pub fn from_error(err: &EventEaseError) -> Self {
        let message = err.to_string();
        match err {
            EventEaseError::NotFound {
                action: TicketAction::Get,
                ..
            } => Self::not_found(&message),
            EventEaseError::NotFound { .. } | EventEaseError::Protocol(_) => {
                Self::bad_request(&message)
            }
            _ => Self::error(&message),
        }
    }

    /// Payload as text (lossy)
    pub fn message(&self) -> Option<String> {
        self.payload
            .as_ref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }

    /// Decode the JSON payload
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            EventEaseError::Protocol("Response has no payload".to_string())
        })?;
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    fn with_message(status: Status, message: &str) -> Self {
        Self {
            status,
            payload: Some(message.as_bytes().to_vec()),
        }
    }
}
