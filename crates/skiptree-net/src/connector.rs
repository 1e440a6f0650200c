//! A `TcpStream`-backed connector for [`skiptree_dispatch::EgressManager`].

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Connect timeout applied to every egress dial; generous enough for a
/// LAN/WAN peer, short enough not to stall the offload thread forever on
/// a dead address.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the connect closure `EgressManager::new` expects: dial `addr`
/// over TCP and disable Nagle's algorithm, since every send here is
/// already one complete netstring frame.
#[must_use]
pub fn tcp_connector() -> impl Fn(SocketAddr) -> std::io::Result<TcpStream> + Send + Sync + 'static {
    |addr: SocketAddr| {
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}
