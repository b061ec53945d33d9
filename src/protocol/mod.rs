//! Protocol Module
//!
//! The RESP subset spoken between clients and the server.
//!
//! ## Request Format
//! A request is an array of bulk strings, command name first:
//! ```text
//! *2\r\n
//! $3\r\nGET\r\n
//! $3\r\nfoo\r\n
//! ```
//!
//! ### Commands
//! - PING            - no arguments
//! - ECHO <message>
//! - GET <key>
//! - SET <key> <value>
//!
//! ## Reply Format
//! - `+OK\r\n`                    status
//! - `$<len>\r\n<data>\r\n`       bulk (ECHO, GET)
//! - `-ERR <message>\r\n`         error
//!
//! PING and the absent-key reply depend on [`ReplyStyle`](crate::config::ReplyStyle).

mod command;
mod decoder;
mod frame;
mod reply;

pub use command::{request_parts, Command, CommandType};
pub use decoder::{Decoder, DecoderOptions, MAX_LINE_LEN};
pub use frame::Frame;
pub use reply::Reply;
