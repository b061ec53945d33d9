//! Frame definitions
//!
//! A decoded protocol value and its wire encoding.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

pub(crate) const CRLF: &[u8] = b"\r\n";

/// One protocol value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+<text>\r\n`
    Simple(String),

    /// `-<message>\r\n`
    Error(String),

    /// `:<digits>\r\n`
    Integer(i64),

    /// `$<len>\r\n<bytes>\r\n`
    Bulk(Bytes),

    /// `*<count>\r\n` followed by `count` frames
    Array(Vec<Frame>),

    /// `$-1\r\n` (decoded only when nulls are accepted)
    Null,
}

impl Frame {
    /// Build a bulk frame from anything byte-like
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Frame::Bulk(data.into())
    }

    /// Build a request frame: an Array of Bulk strings
    pub fn request<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Frame::Array(
            parts
                .into_iter()
                .map(|part| Frame::Bulk(Bytes::copy_from_slice(part.as_ref())))
                .collect(),
        )
    }

    /// Append the wire encoding of this frame to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Frame::Simple(text) => line(buf, b'+', text.as_bytes()),
            Frame::Error(message) => line(buf, b'-', message.as_bytes()),
            Frame::Integer(n) => line(buf, b':', n.to_string().as_bytes()),
            Frame::Bulk(data) => {
                line(buf, b'$', data.len().to_string().as_bytes());
                buf.reserve(data.len() + CRLF.len());
                buf.put_slice(data);
                buf.put_slice(CRLF);
            }
            Frame::Array(items) => {
                line(buf, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.encode_into(buf);
                }
            }
            Frame::Null => buf.put_slice(b"$-1\r\n"),
        }
    }

    /// Encode this frame into a fresh buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

/// Write a single-line frame. CR and LF in `body` become spaces so the
/// line always encodes as exactly one frame.
fn line(buf: &mut BytesMut, sigil: u8, body: &[u8]) {
    buf.reserve(1 + body.len() + CRLF.len());
    buf.put_u8(sigil);
    buf.extend(body.iter().map(|&b| match b {
        b'\r' | b'\n' => b' ',
        other => other,
    }));
    buf.put_slice(CRLF);
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(text) => write!(f, "+{}", text),
            Frame::Error(message) => write!(f, "-{}", message),
            Frame::Integer(n) => write!(f, ":{}", n),
            Frame::Bulk(data) => write!(f, "${:?}", String::from_utf8_lossy(data)),
            Frame::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                write!(f, "]")
            }
            Frame::Null => write!(f, "nil"),
        }
    }
}
