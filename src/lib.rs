//! # EventEase
//!
//! A durable ticket record service with:
//! - Create/read/update/delete over a single ticket collection
//! - Write-Ahead Logging (WAL) plus checkpoint snapshots for durability
//! - Crash recovery with partial write handling
//! - Single-writer/multi-reader concurrency model
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Ticket Service                             │
//! │         (ids, timestamps, merge, existence checks)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Durable Map                               │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ checkpoint
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Snapshot   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod store;
pub mod ticket;
pub mod service;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EventEaseError, Result, TicketAction};
pub use config::Config;
pub use store::DurableMap;
pub use ticket::{Fields, Ticket};
pub use service::TicketService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EventEase
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
