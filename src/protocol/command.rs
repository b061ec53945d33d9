//! Command definitions
//!
//! Turns a decoded request frame into a typed command.

use bytes::Bytes;

use super::frame::Frame;
use crate::error::{KvError, Result};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Ping,
    Echo,
    Get,
    Set,
    Unknown,
}

impl CommandType {
    /// Look up a command name, ignoring ASCII case
    pub fn from_name(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"ping") {
            CommandType::Ping
        } else if name.eq_ignore_ascii_case(b"echo") {
            CommandType::Echo
        } else if name.eq_ignore_ascii_case(b"get") {
            CommandType::Get
        } else if name.eq_ignore_ascii_case(b"set") {
            CommandType::Set
        } else {
            CommandType::Unknown
        }
    }

    /// Number of arguments expected after the name, if fixed
    pub fn arity(&self) -> Option<usize> {
        match self {
            CommandType::Ping => Some(0),
            CommandType::Echo | CommandType::Get => Some(1),
            CommandType::Set => Some(2),
            CommandType::Unknown => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Health check
    Ping,

    /// Reply with the message
    Echo { message: Bytes },

    /// Get a value by key
    Get { key: Bytes },

    /// Set a key-value pair
    Set { key: Bytes, value: Bytes },

    /// Anything outside the command table
    Unknown { name: Bytes, args: Vec<Bytes> },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::Echo { .. } => CommandType::Echo,
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Unknown { .. } => CommandType::Unknown,
        }
    }

    /// Parse a request: command name followed by its arguments
    pub fn parse(request: &[Bytes]) -> Result<Self> {
        let (name, args) = request
            .split_first()
            .ok_or_else(|| KvError::command("ERR empty command"))?;

        let ty = CommandType::from_name(name);
        if let Some(expected) = ty.arity() {
            if args.len() != expected {
                return Err(KvError::command(format!(
                    "ERR wrong number of arguments for '{}' command",
                    String::from_utf8_lossy(name).to_lowercase()
                )));
            }
        }

        let command = match ty {
            CommandType::Ping => Command::Ping,
            CommandType::Echo => Command::Echo {
                message: args[0].clone(),
            },
            CommandType::Get => Command::Get {
                key: args[0].clone(),
            },
            CommandType::Set => Command::Set {
                key: args[0].clone(),
                value: args[1].clone(),
            },
            CommandType::Unknown => Command::Unknown {
                name: name.clone(),
                args: args.to_vec(),
            },
        };

        Ok(command)
    }

    /// Parse a top-level frame, which must be an Array of strings
    pub fn from_frame(frame: Frame) -> Result<Self> {
        let request = request_parts(frame)?;
        Self::parse(&request)
    }
}

/// Extract the request strings from a top-level Array frame
pub fn request_parts(frame: Frame) -> Result<Vec<Bytes>> {
    let items = match frame {
        Frame::Array(items) => items,
        other => {
            return Err(KvError::command(format!(
                "ERR expected an array of bulk strings, got {}",
                frame_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Frame::Bulk(data) => Ok(data),
            Frame::Simple(text) => Ok(Bytes::from(text)),
            other => Err(KvError::command(format!(
                "ERR request element must be a string, got {}",
                frame_kind(&other)
            ))),
        })
        .collect()
}

fn frame_kind(frame: &Frame) -> &'static str {
    match frame {
        Frame::Simple(_) => "simple string",
        Frame::Error(_) => "error",
        Frame::Integer(_) => "integer",
        Frame::Bulk(_) => "bulk string",
        Frame::Array(_) => "array",
        Frame::Null => "null",
    }
}
