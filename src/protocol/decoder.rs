//! Protocol decoder
//!
//! Turns a buffered byte stream into one [`Frame`] per call.
//!
//! ## Framing
//! ```text
//! *<count>\r\n  <count frames>       array
//! $<len>\r\n    <len bytes>\r\n      bulk string
//! +<text>\r\n                        simple string
//! -<message>\r\n                     error
//! :<digits>\r\n                      integer
//! ```
//!
//! Arrays recurse once per nesting level. Recursion is bounded by
//! `max_depth`, so hostile input fails with a protocol error instead of
//! exhausting the stack.

use std::io::{self, BufRead, Read};

use bytes::Bytes;

use super::frame::{Frame, CRLF};
use crate::config::Config;
use crate::error::{KvError, Result};

/// Longest header or single-line frame accepted (64 KB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Upper bound on capacity reserved from a declared length before the
/// bytes have actually arrived
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Limits and switches for a [`Decoder`]
#[derive(Debug, Clone, Copy)]
pub struct DecoderOptions {
    /// Deepest allowed array nesting (a flat request needs 1)
    pub max_depth: usize,

    /// Largest accepted bulk payload in bytes
    pub max_bulk_len: usize,

    /// Largest accepted array element count
    pub max_array_len: usize,

    /// Accept `$-1` / `*-1` as [`Frame::Null`] instead of rejecting them
    pub accept_null: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DecoderOptions {
    /// Server-side options: limits from config, nulls rejected
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_depth: config.max_nesting_depth,
            max_bulk_len: config.max_bulk_len,
            max_array_len: config.max_array_len,
            accept_null: false,
        }
    }

    pub fn accept_null(mut self, accept: bool) -> Self {
        self.accept_null = accept;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Parsed header line
enum Header {
    Array(usize),
    Bulk(usize),
    Simple(String),
    Error(String),
    Integer(i64),
    Null,
}

/// Stateful decoder over a buffered reader
///
/// One decoder belongs to exactly one connection; it keeps the connection's
/// read buffer between calls so pipelined frames are never lost.
pub struct Decoder<R> {
    reader: R,
    options: DecoderOptions,

    /// Scratch buffer for header lines
    line: Vec<u8>,
}

impl<R: BufRead> Decoder<R> {
    /// Create a decoder with default server-side options
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecoderOptions::default())
    }

    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self {
            reader,
            options,
            line: Vec::with_capacity(64),
        }
    }

    /// Block until at least one byte is buffered
    ///
    /// Returns `EndOfStream` if the peer closed the stream instead.
    pub fn wait_readable(&mut self) -> Result<()> {
        loop {
            match self.reader.fill_buf() {
                Ok([]) => return Err(KvError::EndOfStream),
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(KvError::from_io(e)),
            }
        }
    }

    /// Decode the next complete frame
    ///
    /// `EndOfStream` is only reported when the stream ends before the first
    /// header line is complete. Running dry anywhere later inside the frame
    /// is a protocol error.
    pub fn decode(&mut self) -> Result<Frame> {
        let frame = self.decode_at(0)?;
        tracing::trace!("decoded frame: {}", frame);
        Ok(frame)
    }

    fn decode_at(&mut self, depth: usize) -> Result<Frame> {
        match self.read_header(depth == 0)? {
            Header::Array(count) => {
                if depth >= self.options.max_depth {
                    return Err(KvError::protocol(format!(
                        "array nesting exceeds limit of {}",
                        self.options.max_depth
                    )));
                }

                let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    items.push(self.decode_at(depth + 1)?);
                }
                Ok(Frame::Array(items))
            }
            Header::Bulk(len) => self.read_bulk(len).map(Frame::Bulk),
            Header::Simple(text) => Ok(Frame::Simple(text)),
            Header::Error(message) => Ok(Frame::Error(message)),
            Header::Integer(n) => Ok(Frame::Integer(n)),
            Header::Null => Ok(Frame::Null),
        }
    }

    /// Read one CRLF-terminated line and parse it as a header
    fn read_header(&mut self, at_boundary: bool) -> Result<Header> {
        self.line.clear();
        let limit = (MAX_LINE_LEN + CRLF.len()) as u64;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .map_err(KvError::from_io)?;

        if self.line.last() != Some(&b'\n') {
            if read as u64 == limit {
                return Err(KvError::protocol(format!(
                    "line exceeds {} bytes",
                    MAX_LINE_LEN
                )));
            }
            if at_boundary {
                return Err(KvError::EndOfStream);
            }
            return Err(KvError::protocol("unexpected end of stream inside frame"));
        }

        let len = self.line.len();
        if len < 3 {
            return Err(KvError::protocol("line too short"));
        }
        if self.line[len - 2] != b'\r' {
            return Err(KvError::protocol("line terminator is missing CR"));
        }

        parse_header(&self.line[..len - 2], &self.options)
    }

    /// Read exactly `len` payload bytes followed by CRLF
    fn read_bulk(&mut self, len: usize) -> Result<Bytes> {
        let mut data = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let read = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut data)
            .map_err(KvError::from_io)?;

        if read < len {
            return Err(KvError::protocol(format!(
                "bulk string truncated: expected {} bytes, got {}",
                len, read
            )));
        }

        let mut terminator = [0u8; 2];
        match self.reader.read_exact(&mut terminator) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(KvError::protocol("missing bulk string terminator"));
            }
            Err(e) => return Err(KvError::from_io(e)),
        }

        if &terminator[..] != CRLF {
            return Err(KvError::protocol(format!(
                "bulk string length mismatch: declared {} bytes",
                len
            )));
        }

        Ok(Bytes::from(data))
    }
}

fn parse_header(line: &[u8], options: &DecoderOptions) -> Result<Header> {
    let (&sigil, rest) = match line.split_first() {
        Some(split) => split,
        None => return Err(KvError::protocol("empty line")),
    };

    match sigil {
        b'*' => match parse_length(rest, "array", options)? {
            Some(count) if count > options.max_array_len => Err(KvError::protocol(format!(
                "array length {} exceeds limit of {}",
                count, options.max_array_len
            ))),
            Some(count) => Ok(Header::Array(count)),
            None => Ok(Header::Null),
        },
        b'$' => match parse_length(rest, "bulk string", options)? {
            Some(len) if len > options.max_bulk_len => Err(KvError::protocol(format!(
                "bulk string length {} exceeds limit of {}",
                len, options.max_bulk_len
            ))),
            Some(len) => Ok(Header::Bulk(len)),
            None => Ok(Header::Null),
        },
        b'+' => utf8(rest).map(Header::Simple),
        b'-' => utf8(rest).map(Header::Error),
        b':' => parse_integer(rest)
            .map(Header::Integer)
            .ok_or_else(|| KvError::protocol("invalid integer")),
        other => Err(KvError::protocol(format!(
            "unsupported frame type '{}'",
            other.escape_ascii()
        ))),
    }
}

/// Parse a length field; `Ok(None)` means a null marker that was accepted
fn parse_length(digits: &[u8], kind: &str, options: &DecoderOptions) -> Result<Option<usize>> {
    if digits == b"-1" {
        if options.accept_null {
            return Ok(None);
        }
        return Err(KvError::protocol(format!("null {} not accepted", kind)));
    }
    if digits.first() == Some(&b'-') {
        return Err(KvError::protocol(format!("negative {} length", kind)));
    }

    parse_decimal(digits)
        .map(Some)
        .ok_or_else(|| KvError::protocol(format!("invalid {} length", kind)))
}

/// Unsigned decimal, ASCII digits only, no sign, no overflow
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0usize, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(usize::from(b - b'0'))
    })
}

fn parse_integer(text: &[u8]) -> Option<i64> {
    let (negative, digits) = match text.split_first() {
        Some((&b'-', tail)) => (true, tail),
        _ => (false, text),
    };
    if digits.is_empty() {
        return None;
    }

    digits.iter().try_fold(0i64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        let digit = i64::from(b - b'0');
        let acc = acc.checked_mul(10)?;
        if negative {
            acc.checked_sub(digit)
        } else {
            acc.checked_add(digit)
        }
    })
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| KvError::protocol("line is not valid UTF-8"))
}
