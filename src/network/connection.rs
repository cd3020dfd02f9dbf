//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{EventEaseError, Result};
use crate::protocol::{read_command, write_response, Command, Response, MAX_PAYLOAD_SIZE};
use crate::service::{Clock, IdGenerator, SystemClock, TicketService, UuidGenerator};
use crate::ticket::Fields;

/// Handles a single client connection
pub struct Connection<C = SystemClock, G = UuidGenerator> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the ticket service
    service: Arc<TicketService<C, G>>,

    /// Peer address for logging
    peer_addr: String,
}

impl<C: Clock, G: IdGenerator> Connection<C, G> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, service: Arc<TicketService<C, G>>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            service,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(EventEaseError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(EventEaseError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // The stream is out of sync after a bad frame; answer and hang up
                    let _ = self.send_response(Response::from_error(&e));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = execute_command(&self.service, command);

            if let Err(e) = self.send_response(response) {
                if let EventEaseError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

/// Run one command against the service and build its response
///
/// Every command maps to exactly one service operation.
pub fn execute_command<C: Clock, G: IdGenerator>(
    service: &TicketService<C, G>,
    command: Command,
) -> Response {
    let result = match command {
        Command::Create { body } => parse_fields(&body)
            .and_then(|fields| service.create(fields))
            .and_then(|ticket| Response::ok_json(&ticket)),
        Command::List => service
            .list()
            .and_then(|tickets| Response::ok_json(&tickets)),
        Command::Get { id } => service
            .get(&id)
            .and_then(|ticket| Response::ok_json(&ticket)),
        Command::Update { id, body } => parse_fields(&body)
            .and_then(|patch| service.update(&id, patch))
            .and_then(|ticket| Response::ok_json(&ticket)),
        Command::Delete { id } => service
            .delete(&id)
            .and_then(|ticket| Response::ok_json(&ticket)),
        Command::Ping => Ok(Response::ok(Some(b"PONG".to_vec()))),
    };

    let response = result.unwrap_or_else(|e| {
        if !e.is_not_found() {
            tracing::warn!("Command failed: {}", e);
        }
        Response::from_error(&e)
    });

    // A frame over the limit would be rejected by the client mid-stream
    let payload_len = response.payload.as_ref().map_or(0, Vec::len);
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        tracing::warn!(
            "Response payload of {} bytes exceeds the {} byte limit",
            payload_len,
            MAX_PAYLOAD_SIZE
        );
        return Response::error(&format!(
            "Response payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        ));
    }

    response
}

/// Decode a request body; an empty body is an empty object
fn parse_fields(body: &[u8]) -> Result<Fields> {
    if body.is_empty() {
        return Ok(Fields::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(EventEaseError::Protocol(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(EventEaseError::Protocol(format!("Invalid JSON body: {}", e))),
    }
}
