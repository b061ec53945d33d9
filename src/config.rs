//! Configuration for respkv
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{KvError, Result};

/// Main configuration for a respkv server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Read deadline once a frame has started (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// How long a connection may sit idle between frames (milliseconds, 0 = forever)
    pub idle_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Deepest allowed Array-of-Array nesting
    pub max_nesting_depth: usize,

    /// Largest accepted bulk string payload (bytes)
    pub max_bulk_len: usize,

    /// Largest accepted array element count
    pub max_array_len: usize,

    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Number of lock stripes in the keyspace (power of two)
    pub store_shards: usize,

    // -------------------------------------------------------------------------
    // Reply Policy
    // -------------------------------------------------------------------------
    /// Encoding used for PONG and the absent-key reply
    pub reply_style: ReplyStyle,

    /// What to answer for commands outside the command table
    pub unknown_command_policy: UnknownCommandPolicy,
}

/// Wire encoding for the two replies where the historical server and
/// canonical RESP disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyStyle {
    /// `$4\r\nPONG\r\n` and `$5\r\n(nil)\r\n`
    #[default]
    Compatible,

    /// `+PONG\r\n` and `$-1\r\n`
    Canonical,
}

/// Handling of commands the dispatcher does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCommandPolicy {
    /// Answer `+OK` and do nothing (keeps `redis-cli` handshakes such as
    /// `COMMAND DOCS` working)
    #[default]
    ReplyOk,

    /// Answer `-ERR unknown command '<name>'`
    ReplyError,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            idle_timeout_ms: 0,
            max_nesting_depth: 32,
            max_bulk_len: 512 * 1024 * 1024, // 512 MB
            max_array_len: 1024 * 1024,
            store_shards: 16,
            reply_style: ReplyStyle::Compatible,
            unknown_command_policy: UnknownCommandPolicy::ReplyOk,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        millis(self.idle_timeout_ms)
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(KvError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(KvError::Config("max_connections must be > 0".to_string()));
        }
        if self.max_nesting_depth == 0 {
            return Err(KvError::Config("max_nesting_depth must be > 0".to_string()));
        }
        if self.max_bulk_len == 0 || self.max_array_len == 0 {
            return Err(KvError::Config(
                "max_bulk_len and max_array_len must be > 0".to_string(),
            ));
        }
        if !self.store_shards.is_power_of_two() {
            return Err(KvError::Config(format!(
                "store_shards must be a power of two, got {}",
                self.store_shards
            )));
        }
        Ok(())
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the in-frame read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the idle timeout between frames (in milliseconds)
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.max_nesting_depth = depth;
        self
    }

    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.config.max_bulk_len = len;
        self
    }

    pub fn max_array_len(mut self, len: usize) -> Self {
        self.config.max_array_len = len;
        self
    }

    /// Set the number of store shards
    pub fn store_shards(mut self, shards: usize) -> Self {
        self.config.store_shards = shards;
        self
    }

    pub fn reply_style(mut self, style: ReplyStyle) -> Self {
        self.config.reply_style = style;
        self
    }

    pub fn unknown_command_policy(mut self, policy: UnknownCommandPolicy) -> Self {
        self.config.unknown_command_policy = policy;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
