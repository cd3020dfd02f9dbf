//! Error types for EventEase
//!
//! Provides a unified error type for all operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using EventEaseError
pub type Result<T> = std::result::Result<T, EventEaseError>;

/// The ticket operation that addressed a missing id
///
/// Kept on `NotFound` so the surfaced result stays distinguishable:
/// a failed lookup is "not found", a failed update/delete is "operation failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Get,
    Update,
    Delete,
}

impl TicketAction {
    /// Caller-facing message for a missing ticket
    pub fn not_found_message(&self, id: &str) -> String {
        match self {
            TicketAction::Get => format!("Ticket with id={} not found", id),
            TicketAction::Update => {
                format!("Couldn't update ticket with id={}. Ticket not found", id)
            }
            TicketAction::Delete => {
                format!("Couldn't delete ticket with id={}. Ticket not found", id)
            }
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TicketAction::Get => "get",
            TicketAction::Update => "update",
            TicketAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Unified error type for EventEase operations
#[derive(Debug, Error)]
pub enum EventEaseError {
    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{}", .action.not_found_message(.id))]
    NotFound { id: String, action: TicketAction },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EventEaseError {
    /// Shorthand for a `NotFound` on the given id
    pub fn not_found(id: impl Into<String>, action: TicketAction) -> Self {
        Self::NotFound {
            id: id.into(),
            action,
        }
    }

    /// True for the domain `NotFound` kind, regardless of action
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for EventEaseError {
    fn from(err: serde_json::Error) -> Self {
        EventEaseError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for EventEaseError {
    fn from(err: bincode::Error) -> Self {
        EventEaseError::Serialization(err.to_string())
    }
}
