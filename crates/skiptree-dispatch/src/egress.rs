//! Egress manager (§5): a per-peer socket map, mutated under a single
//! lock, shared by the dispatcher thread and the offload threads it
//! spawns for small sends.

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Frames larger than this are sent on the calling thread, blocking it,
/// rather than offloaded — avoiding the complexity of tracking a partial
/// send across a detached thread for a payload that large (§5).
pub const LARGE_FRAME_THRESHOLD: usize = 64 * 1024;

/// Owns one reusable connection per destination address. Generic over the
/// connection type so it can be exercised in tests without opening real
/// sockets; `skiptree-net` supplies a `TcpStream`-backed connector.
pub struct EgressManager<C> {
    connections: Mutex<HashMap<SocketAddr, (C, Instant)>>,
    connect: Box<dyn Fn(SocketAddr) -> std::io::Result<C> + Send + Sync>,
}

impl<C: Write + Send> EgressManager<C> {
    pub fn new(connect: impl Fn(SocketAddr) -> std::io::Result<C> + Send + Sync + 'static) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            connect: Box::new(connect),
        }
    }

    /// Send `frame` to `addr`, opening a connection if none is cached.
    ///
    /// # Errors
    /// Returns an error if a new connection cannot be opened, or if the
    /// write fails (the cached connection is dropped in that case so the
    /// next send retries fresh).
    pub fn send(&self, addr: SocketAddr, frame: &[u8]) -> Result<()> {
        let mut connections = self.connections.lock().expect("egress socket map poisoned");
        if !connections.contains_key(&addr) {
            let conn = (self.connect)(addr).with_context(|| format!("connect to {addr}"))?;
            connections.insert(addr, (conn, Instant::now()));
        }

        let (conn, last_used) = connections.get_mut(&addr).expect("just inserted above");
        if let Err(e) = conn.write_all(frame) {
            connections.remove(&addr);
            return Err(e).with_context(|| format!("send frame to {addr}"));
        }
        *last_used = Instant::now();
        Ok(())
    }

    /// Drop a cached connection, e.g. after the idle-channel cleaner
    /// decides it has been silent too long.
    pub fn close(&self, addr: &SocketAddr) {
        self.connections.lock().expect("egress socket map poisoned").remove(addr);
    }

    /// Drop every connection that has not been used for longer than
    /// `timeout` (§5, `NodeConfig::idle_channel_timeout`). Run
    /// periodically by a dedicated cleaner thread.
    pub fn close_idle(&self, timeout: Duration) {
        self.connections
            .lock()
            .expect("egress socket map poisoned")
            .retain(|_, (_, last_used)| last_used.elapsed() <= timeout);
    }

    #[must_use]
    pub fn open_connection_count(&self) -> usize {
        self.connections.lock().expect("egress socket map poisoned").len()
    }
}

#[must_use]
pub fn is_large_frame(len: usize) -> bool {
    len > LARGE_FRAME_THRESHOLD
}
