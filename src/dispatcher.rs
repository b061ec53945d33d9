//! Dispatcher Module
//!
//! Maps decoded requests onto the store and encodes the reply.
//!
//! ## Responsibilities
//! - Validate command name and arity
//! - Run the store operation (SET is the only mutation)
//! - Produce exactly one encoded reply per request

use std::sync::Arc;

use bytes::Bytes;

use crate::config::{Config, ReplyStyle, UnknownCommandPolicy};
use crate::error::Result;
use crate::protocol::{request_parts, Command, Frame, Reply};
use crate::store::Store;

/// Executes commands against a shared store
///
/// Cheap to share between connection workers behind an `Arc`; the only
/// mutable state is inside the store.
pub struct Dispatcher {
    store: Arc<Store>,
    reply_style: ReplyStyle,
    unknown_command_policy: UnknownCommandPolicy,
}

impl Dispatcher {
    /// Create a dispatcher with the default reply policies
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_config(store, &Config::default())
    }

    /// Create a dispatcher using the reply policies from `config`
    pub fn with_config(store: Arc<Store>, config: &Config) -> Self {
        Self {
            store,
            reply_style: config.reply_style,
            unknown_command_policy: config.unknown_command_policy,
        }
    }

    /// Execute a request (command name followed by arguments)
    ///
    /// Returns the encoded reply, or `KvError::Command` if the request is
    /// malformed. No reply is produced for a malformed request; the caller
    /// decides how to tell the peer.
    pub fn execute(&self, request: &[Bytes]) -> Result<Bytes> {
        let command = Command::parse(request)?;
        Ok(self.run(command).encode(self.reply_style))
    }

    /// Execute a decoded top-level frame
    pub fn execute_frame(&self, frame: Frame) -> Result<Bytes> {
        let request = request_parts(frame)?;
        self.execute(&request)
    }

    /// Run a parsed command and build its reply
    pub fn run(&self, command: Command) -> Reply {
        tracing::trace!("executing {:?}", command.command_type());

        match command {
            Command::Ping => Reply::Pong,
            Command::Echo { message } => Reply::Bulk(message),
            Command::Get { key } => match self.store.get(&key) {
                Some(value) => Reply::Bulk(value),
                None => Reply::Nil,
            },
            Command::Set { key, value } => {
                self.store.set(key, value);
                Reply::Ok
            }
            Command::Unknown { name, .. } => match self.unknown_command_policy {
                UnknownCommandPolicy::ReplyOk => Reply::Ok,
                UnknownCommandPolicy::ReplyError => Reply::error(format_args!(
                    "unknown command '{}'",
                    String::from_utf8_lossy(&name)
                )),
            },
        }
    }

    pub fn reply_style(&self) -> ReplyStyle {
        self.reply_style
    }
}
