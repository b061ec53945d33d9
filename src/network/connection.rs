//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{KvError, Result};
use crate::protocol::{Decoder, DecoderOptions, Reply};

/// Handles a single client connection
///
/// Requests are served strictly one at a time: decode a frame, dispatch
/// it, write and flush the reply, then decode the next one.
pub struct Connection {
    /// Decoder over the buffered read half
    decoder: Decoder<BufReader<TcpStream>>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Handle used to switch read deadlines between frames
    control: TcpStream,

    /// Shared command executor
    dispatcher: Arc<Dispatcher>,

    /// Deadline while waiting for the next frame to start
    idle_timeout: Option<Duration>,

    /// Deadline once a frame has started
    frame_timeout: Option<Duration>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn new(stream: TcpStream, dispatcher: Arc<Dispatcher>, config: &Config) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;
        let control = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            decoder: Decoder::with_options(
                BufReader::new(read_stream),
                DecoderOptions::from_config(config),
            ),
            writer: BufWriter::new(write_stream),
            control,
            dispatcher,
            idle_timeout: config.idle_timeout(),
            frame_timeout: config.read_timeout(),
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns `Ok` when the client disconnects, and the fatal error
    /// otherwise. Protocol errors are answered once and then close the
    /// connection; command errors are answered and serving continues.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            match self.serve_one() {
                Ok(()) => {}
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::Timeout) => {
                    tracing::debug!("Timed out waiting on client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e @ KvError::Protocol(_)) => {
                    tracing::warn!("Protocol error from {}: {}", self.peer_addr, e);
                    // Best effort, the stream is being dropped either way
                    let _ = self.send(Reply::error(&e).encode(self.dispatcher.reply_style()));
                    let _ = self.control.shutdown(Shutdown::Write);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error on connection {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }
        }
    }

    /// Decode, execute and answer a single request
    fn serve_one(&mut self) -> Result<()> {
        self.control.set_read_timeout(self.idle_timeout)?;
        self.decoder.wait_readable()?;
        self.control.set_read_timeout(self.frame_timeout)?;

        let frame = self.decoder.decode()?;

        let reply = match self.dispatcher.execute_frame(frame) {
            Ok(reply) => reply,
            Err(e) if !e.is_connection_fatal() => {
                tracing::debug!("Rejected command from {}: {}", self.peer_addr, e);
                Reply::Error(e.to_string()).encode(self.dispatcher.reply_style())
            }
            Err(e) => return Err(e),
        };

        self.send(reply)
    }

    /// Write one reply and flush it
    fn send(&mut self, reply: Bytes) -> Result<()> {
        tracing::trace!("Sending {} bytes to {}", reply.len(), self.peer_addr);
        self.writer.write_all(&reply).map_err(KvError::from_io)?;
        self.writer.flush().map_err(KvError::from_io)?;
        Ok(())
    }
}
