//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::device::VBlock;
use crate::error::Result;
use crate::snapshot::CancelToken;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for a vblock device
pub struct Server {
    config: Config,
    device: Arc<VBlock>,

    /// Cancelled by `shutdown`; also interrupts gate waits of live connections
    shutdown: CancelToken,

    /// Connections currently being served
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and device
    pub fn new(config: Config, device: Arc<VBlock>) -> Self {
        Self {
            config,
            device,
            shutdown: CancelToken::new(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the configured address and serve (blocking)
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        self.serve(listener)
    }

    /// Serve connections from an already bound listener until shutdown
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", local_addr);

        while !self.shutdown.is_cancelled() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                        continue;
                    }
                    self.dispatch(stream, peer);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed on {}: {}", local_addr, e);
                }
            }
        }

        tracing::info!("Server on {} shutting down", local_addr);
        Ok(())
    }

    /// Hand a connection to its own worker thread
    fn dispatch(&self, stream: std::net::TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::Acquire) >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: connection limit {} reached",
                peer,
                self.config.max_connections
            );
            return;
        }

        let mut connection =
            match Connection::new(stream, Arc::clone(&self.device), self.shutdown.clone()) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                    return;
                }
            };
        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            tracing::warn!("Failed to set timeouts for {}: {}", peer, e);
            return;
        }

        let active = Arc::clone(&self.active);
        active.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("vblock-conn-{}", peer))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                }
                active.fetch_sub(1, Ordering::AcqRel);
            });

        if let Err(e) = spawned {
            self.active.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!("Failed to spawn worker for {}: {}", peer, e);
        }
    }

    /// Signal the server to shutdown gracefully
    ///
    /// Stops the accept loop and interrupts bulk operations still waiting on
    /// the snapshot gate.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn device(&self) -> &Arc<VBlock> {
        &self.device
    }
}
