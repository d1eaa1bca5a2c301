use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("position queue capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("read timeout must be greater than zero")]
    ZeroReadTimeout,

    #[error("failed to connect to link at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("no link connection to {addr} within {timeout:?}")]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("failed to bind UDP socket for {target}: {source}")]
    Bind {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send datagram to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("short datagram to {target}: sent {sent} of {expected} bytes")]
    ShortWrite {
        target: SocketAddr,
        sent: usize,
        expected: usize,
    },
}
