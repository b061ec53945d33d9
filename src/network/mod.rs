//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One worker thread per connection, bounded by `max_connections`
//! - Commands routed through a shared Dispatcher

mod connection;
mod server;

pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
