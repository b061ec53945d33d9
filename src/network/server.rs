//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::connection::Connection;
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::store::Store;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const MAX_CLIENTS_REPLY: &[u8] = b"-ERR max number of clients reached\r\n";

/// TCP server for respkv
pub struct Server {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
    listener: TcpListener,
    shutdown: ShutdownHandle,

    /// Live connection workers
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listener; connections are accepted once `run` is called
    pub fn bind(config: Config, store: Arc<Store>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Non-blocking so the accept loop can notice shutdown requests
        listener.set_nonblocking(true)?;

        let dispatcher = Arc::new(Dispatcher::with_config(store, &config));

        Ok(Self {
            config: Arc::new(config),
            dispatcher,
            listener,
            shutdown: ShutdownHandle::default(),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops the accept loop from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the accept loop (blocking until shutdown)
    ///
    /// Workers already running keep serving their clients after this returns.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let mut next_id: u64 = 0;
        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    next_id += 1;
                    self.spawn_worker(stream, addr, next_id);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                }
            }
        }

        tracing::info!("Accept loop stopped");
        Ok(())
    }

    fn spawn_worker(&self, mut stream: TcpStream, addr: SocketAddr, id: u64) {
        // Accepted sockets inherit non-blocking mode on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", addr, e);
            return;
        }

        let guard = match ActiveGuard::acquire(&self.active, self.config.max_connections) {
            Some(guard) => guard,
            None => {
                tracing::warn!(
                    "Rejecting {}: {} connections already open",
                    addr,
                    self.config.max_connections
                );
                let _ = stream.write_all(MAX_CLIENTS_REPLY);
                return;
            }
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let config = Arc::clone(&self.config);

        let spawned = thread::Builder::new()
            .name(format!("respkv-conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                let mut connection = match Connection::new(stream, dispatcher, &config) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                        return;
                    }
                };

                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} closed with error: {}", addr, e);
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn worker for {}: {}", addr, e);
        }
    }
}

/// Stops a running [`Server`] accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Counts a live worker; released when the worker thread exits
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn acquire(active: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        let previous = active.fetch_add(1, Ordering::AcqRel);
        if previous >= limit {
            active.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(Self {
            active: Arc::clone(active),
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}
