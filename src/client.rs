//! Blocking TCP client
//!
//! One request in flight at a time over a single connection.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{read_response, write_command, Command, Response};
use crate::ticket::Fields;

/// Client for an EventEase server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Bound how long a response may take
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send a command and wait for its response
    pub fn send(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn create(&mut self, fields: &Fields) -> Result<Response> {
        self.send(&Command::create(fields)?)
    }

    pub fn list(&mut self) -> Result<Response> {
        self.send(&Command::List)
    }

    pub fn get(&mut self, id: &str) -> Result<Response> {
        self.send(&Command::Get { id: id.to_string() })
    }

    pub fn update(&mut self, id: &str, patch: &Fields) -> Result<Response> {
        self.send(&Command::update(id, patch)?)
    }

    pub fn delete(&mut self, id: &str) -> Result<Response> {
        self.send(&Command::Delete { id: id.to_string() })
    }

    pub fn ping(&mut self) -> Result<Response> {
        self.send(&Command::Ping)
    }
}
