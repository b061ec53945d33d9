//! Reply definitions
//!
//! Represents replies sent back to clients.

use bytes::{Bytes, BytesMut};

use super::frame::Frame;
use crate::config::ReplyStyle;

/// A reply to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Ok,

    /// Answer to PING
    Pong,

    /// Bulk payload (ECHO, GET hit)
    Bulk(Bytes),

    /// Answer to GET for an absent key
    Nil,

    /// `-ERR <message>`
    Error(String),
}

impl Reply {
    /// Create an error reply with the conventional `ERR` prefix
    pub fn error(message: impl std::fmt::Display) -> Self {
        Reply::Error(format!("ERR {}", message))
    }

    /// The frame this reply is written as
    pub fn to_frame(&self, style: ReplyStyle) -> Frame {
        match (self, style) {
            (Reply::Ok, _) => Frame::Simple("OK".to_string()),
            (Reply::Pong, ReplyStyle::Compatible) => Frame::bulk(&b"PONG"[..]),
            (Reply::Pong, ReplyStyle::Canonical) => Frame::Simple("PONG".to_string()),
            (Reply::Bulk(data), _) => Frame::Bulk(data.clone()),
            (Reply::Nil, ReplyStyle::Compatible) => Frame::bulk(&b"(nil)"[..]),
            (Reply::Nil, ReplyStyle::Canonical) => Frame::Null,
            (Reply::Error(message), _) => Frame::Error(message.clone()),
        }
    }

    /// Encode this reply in the given style
    pub fn encode(&self, style: ReplyStyle) -> Bytes {
        let mut buf = BytesMut::new();
        self.to_frame(style).encode_into(&mut buf);
        buf.freeze()
    }
}
