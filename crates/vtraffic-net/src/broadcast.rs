use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::BroadcastError;

/// Fire-and-forget datagrams to one fixed target. Nothing is retried or
/// buffered.
#[derive(Debug)]
pub struct Broadcaster {
    socket: UdpSocket,
    target: SocketAddr,
}

impl Broadcaster {
    /// Binds an ephemeral local port of the target's address family.
    pub async fn bind(target: SocketAddr) -> Result<Self, BroadcastError> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| BroadcastError::Bind { target, source })?;
        Ok(Self { socket, target })
    }

    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub async fn send(&self, payload: &str) -> Result<(), BroadcastError> {
        let sent = self
            .socket
            .send_to(payload.as_bytes(), self.target)
            .await
            .map_err(|source| BroadcastError::Send {
                target: self.target,
                source,
            })?;
        if sent < payload.len() {
            return Err(BroadcastError::ShortWrite {
                target: self.target,
                sent,
                expected: payload.len(),
            });
        }
        Ok(())
    }
}
