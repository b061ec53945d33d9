//! Blocking client
//!
//! Minimal client used by the CLI and the network tests. Each call writes
//! one request and reads exactly one reply.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::config::ReplyStyle;
use crate::error::{KvError, Result};
use crate::protocol::{Decoder, DecoderOptions, Frame};

/// A connection to a respkv (or any RESP) server
pub struct Client {
    decoder: Decoder<BufReader<TcpStream>>,
    writer: BufWriter<TcpStream>,

    /// Reply style the server is expected to use
    reply_style: ReplyStyle,
}

impl Client {
    /// Connect to `addr`
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        // Replies may legitimately carry nulls and nested arrays
        let options = DecoderOptions::default().accept_null(true);

        Ok(Self {
            decoder: Decoder::with_options(BufReader::new(read_stream), options),
            writer: BufWriter::new(stream),
            reply_style: ReplyStyle::default(),
        })
    }

    /// Match the server's reply style (defaults to `Compatible`)
    pub fn with_reply_style(mut self, style: ReplyStyle) -> Self {
        self.reply_style = style;
        self
    }

    /// Apply a read timeout to replies
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.writer.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send a command (name and arguments) and wait for its reply
    pub fn command<T: AsRef<[u8]>>(&mut self, parts: &[T]) -> Result<Frame> {
        let mut buf = BytesMut::new();
        Frame::request(parts).encode_into(&mut buf);
        self.send_raw(&buf)?;
        self.read_reply()
    }

    /// Write raw bytes without waiting for a reply
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(KvError::from_io)?;
        self.writer.flush().map_err(KvError::from_io)?;
        Ok(())
    }

    /// Read the next reply frame
    pub fn read_reply(&mut self) -> Result<Frame> {
        self.decoder.decode()
    }

    pub fn ping(&mut self) -> Result<Frame> {
        self.command(&["PING"])
    }

    pub fn echo(&mut self, message: impl AsRef<[u8]>) -> Result<Frame> {
        self.command(&[b"ECHO".as_slice(), message.as_ref()])
    }

    /// GET a key
    ///
    /// `$-1` is always `None`. Under `ReplyStyle::Compatible` the server
    /// answers an absent key with the bulk string `(nil)`, which cannot be
    /// told apart from a stored value `(nil)`; that bulk is reported as
    /// `None` too. Use `ReplyStyle::Canonical` on both ends to keep it.
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Bytes>> {
        match self.command(&[b"GET".as_slice(), key.as_ref()])? {
            Frame::Null => Ok(None),
            Frame::Bulk(data)
                if self.reply_style == ReplyStyle::Compatible && data.as_ref() == b"(nil)" =>
            {
                Ok(None)
            }
            Frame::Bulk(data) => Ok(Some(data)),
            Frame::Error(message) => Err(KvError::Command(message)),
            other => Err(KvError::protocol(format!("unexpected GET reply: {}", other))),
        }
    }

    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        match self.command(&[b"SET".as_slice(), key.as_ref(), value.as_ref()])? {
            Frame::Simple(status) if status == "OK" => Ok(()),
            Frame::Error(message) => Err(KvError::Command(message)),
            other => Err(KvError::protocol(format!("unexpected SET reply: {}", other))),
        }
    }
}
