//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::config::Config;
use crate::error::{EventEaseError, Result};
use crate::protocol::{write_response, Response};
use crate::service::{Clock, IdGenerator, SystemClock, TicketService, UuidGenerator};

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// TCP server for EventEase
pub struct Server<C = SystemClock, G = UuidGenerator> {
    config: Config,
    service: Arc<TicketService<C, G>>,
    listener: Option<TcpListener>,
    shutdown: Arc<AtomicBool>,
}

impl<C, G> Server<C, G>
where
    C: Clock + 'static,
    G: IdGenerator + 'static,
{
    /// Create a new server with the given config and service
    pub fn new(config: Config, service: Arc<TicketService<C, G>>) -> Self {
        Self {
            config,
            service,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the listen address (idempotent) and return the bound address
    ///
    /// Useful with port 0 to learn the port before `run`.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }

        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            EventEaseError::Config(format!("Cannot bind {}: {}", self.config.listen_addr, e))
        })?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Flag that stops the accept loop when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Start the server (blocking)
    ///
    /// Returns once shutdown is signalled and every worker has finished
    /// its current connection.
    pub fn run(&mut self) -> Result<()> {
        let addr = self.bind()?;
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return Err(EventEaseError::Config("Listener not bound".to_string())),
        };
        listener.set_nonblocking(true)?;

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let mut workers = Vec::with_capacity(self.config.worker_threads);
        for i in 0..self.config.worker_threads {
            let rx = rx.clone();
            let service = Arc::clone(&self.service);
            let timeouts = (self.config.read_timeout_ms, self.config.write_timeout_ms);
            let handle = thread::Builder::new()
                .name(format!("eventease-worker-{}", i))
                .spawn(move || worker_loop(rx, service, timeouts))?;
            workers.push(handle);
        }
        drop(rx);

        tracing::info!(
            "Listening on {} with {} workers",
            addr,
            self.config.worker_threads
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets may inherit non-blocking mode
                    stream.set_nonblocking(false)?;
                    tracing::trace!("Accepted connection from {}", peer);

                    match tx.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(stream)) => {
                            tracing::warn!("Connection queue full, rejecting {}", peer);
                            let _ = write_response(&mut &stream, &Response::error("Server busy"));
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::error!("All workers exited; stopping accept loop");
                            break;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn worker_loop<C: Clock, G: IdGenerator>(
    rx: Receiver<TcpStream>,
    service: Arc<TicketService<C, G>>,
    (read_ms, write_ms): (u64, u64),
) {
    for stream in rx.iter() {
        let mut connection = match Connection::new(stream, Arc::clone(&service)) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                continue;
            }
        };

        if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
            tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
            continue;
        }

        if let Err(e) = connection.handle() {
            tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
        }
    }
}
