//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool fed by a bounded channel
//! - Commands routed through the ticket service

mod server;
mod connection;

pub use server::Server;
pub use connection::{execute_command, Connection};
