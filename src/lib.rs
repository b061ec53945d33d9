//! # respkv
//!
//! A small key-value server speaking a subset of RESP:
//! - Recursive, length-prefixed frame decoding with explicit limits
//! - PING / ECHO / GET / SET over a sharded, lock-striped keyspace
//! - One worker thread per TCP connection, strictly FIFO replies
//! - A blocking client for the CLI and tests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one worker per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Decoder                                    │
//! │           (per connection, owns read buffer)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Frame
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Dispatcher                                  │
//! │            (shared, stateless apart from Store)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │     Store     │
//!               │ (RwLock shards)│
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod dispatcher;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::{Config, ReplyStyle, UnknownCommandPolicy};
pub use dispatcher::Dispatcher;
pub use error::{KvError, Result};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
