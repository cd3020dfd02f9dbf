//! Command definitions
//!
//! Represents requests from clients. Each command maps onto exactly one
//! ticket service operation.

use crate::error::Result;
use crate::ticket::Fields;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Create = 0x01,
    List = 0x02,
    Get = 0x03,
    Update = 0x04,
    Delete = 0x05,
    Ping = 0x06,
}

/// A parsed command
///
/// `body` carries the raw JSON object exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a ticket from a JSON object
    Create { body: Vec<u8> },

    /// List all tickets
    List,

    /// Get a ticket by id
    Get { id: String },

    /// Merge a JSON object into an existing ticket
    Update { id: String, body: Vec<u8> },

    /// Delete a ticket by id
    Delete { id: String },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Create { .. } => CommandType::Create,
            Command::List => CommandType::List,
            Command::Get { .. } => CommandType::Get,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }

    /// CREATE with `fields` as the body
    pub fn create(fields: &Fields) -> Result<Self> {
        Ok(Command::Create {
            body: serde_json::to_vec(fields)?,
        })
    }

    /// UPDATE of `id` with `patch` as the body
    pub fn update(id: impl Into<String>, patch: &Fields) -> Result<Self> {
        Ok(Command::Update {
            id: id.into(),
            body: serde_json::to_vec(patch)?,
        })
    }
}
