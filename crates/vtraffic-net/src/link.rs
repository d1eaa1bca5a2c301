use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use vtraffic_core::{LatLon, TimestampUtc};
use vtraffic_log::{log_debug, log_info, log_trace, log_warn, SharedLogger};
use vtraffic_wire::{scan_link_buffer, LinkScan, LINK_MARKER};

use crate::LinkError;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MIN_POSITION_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_POSITION_QUEUE_CAPACITY: usize = 32;
pub const DEFAULT_MAX_PENDING_TEXT: usize = 16 * 1024;

const READ_CHUNK_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Bounds both the connect attempt and every single read.
    pub read_timeout: Duration,
    /// Positions closer together than this are dropped.
    pub min_position_interval: Duration,
    pub queue_capacity: usize,
    /// Unscanned text beyond this is thrown away.
    pub max_pending_text: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            min_position_interval: DEFAULT_MIN_POSITION_INTERVAL,
            queue_capacity: DEFAULT_POSITION_QUEUE_CAPACITY,
            max_pending_text: DEFAULT_MAX_PENDING_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    /// The host closed the stream.
    Closed,
    /// A socket error ended the link.
    Failed(String),
    /// `disconnect` was called.
    Disconnected,
}

impl LinkStatus {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Host position as read from the link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPosition {
    pub position: LatLon,
    pub received_at: TimestampUtc,
}

/// Receiving end of the position queue. Yields `None` once the link is down
/// and every queued position has been taken.
#[derive(Debug)]
pub struct LinkPositions {
    receiver: mpsc::Receiver<LinkPosition>,
}

impl LinkPositions {
    pub async fn recv(&mut self) -> Option<LinkPosition> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<LinkPosition> {
        self.receiver.try_recv().ok()
    }
}

/// TCP client on the host simulator's link channel.
///
/// A background reader owns the stream; the owner only holds the shutdown
/// switch, the status and the reader's handle.
#[derive(Debug)]
pub struct LinkReceiver {
    peer: SocketAddr,
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<LinkStatus>,
    reader: Option<JoinHandle<()>>,
}

impl LinkReceiver {
    pub async fn connect(
        addr: SocketAddr,
        config: LinkConfig,
        logger: SharedLogger,
    ) -> Result<(Self, LinkPositions), LinkError> {
        if config.queue_capacity == 0 {
            return Err(LinkError::ZeroQueueCapacity);
        }
        if config.read_timeout.is_zero() {
            return Err(LinkError::ZeroReadTimeout);
        }

        let stream = timeout(config.read_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| LinkError::ConnectTimeout {
                addr,
                timeout: config.read_timeout,
            })?
            .map_err(|source| LinkError::Connect { addr, source })?;
        log_info!(logger, "link connected to {addr}");

        let (position_tx, position_rx) = mpsc::channel(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(LinkStatus::Connected);

        let reader = LinkReader {
            stream,
            config,
            positions: position_tx,
            shutdown: shutdown_rx,
            status: status_tx,
            logger,
            pending: String::new(),
            undecoded: Vec::new(),
            last_accepted: None,
        };
        let handle = tokio::spawn(reader.run());

        Ok((
            Self {
                peer: addr,
                shutdown: shutdown_tx,
                status: status_rx,
                reader: Some(handle),
            },
            LinkPositions {
                receiver: position_rx,
            },
        ))
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.status.borrow().clone()
    }

    /// Watch handle that changes whenever the link state does.
    #[must_use]
    pub fn status_changes(&self) -> watch::Receiver<LinkStatus> {
        self.status.clone()
    }

    /// Stops the reader and waits for it to exit. Calling it again is a no-op.
    pub async fn disconnect(&mut self) {
        let Some(handle) = self.reader.take() else {
            return;
        };
        // The reader may already be gone; then there is nobody to tell.
        let _ = self.shutdown.send(true);
        let _ = handle.await;
    }
}

impl Drop for LinkReceiver {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

struct LinkReader {
    stream: TcpStream,
    config: LinkConfig,
    positions: mpsc::Sender<LinkPosition>,
    shutdown: watch::Receiver<bool>,
    status: watch::Sender<LinkStatus>,
    logger: SharedLogger,
    pending: String,
    /// Tail of a character split across reads.
    undecoded: Vec<u8>,
    last_accepted: Option<Instant>,
}

impl LinkReader {
    async fn run(mut self) {
        let mut chunk = vec![0_u8; READ_CHUNK_SIZE];
        let final_status = loop {
            if *self.shutdown.borrow() {
                break LinkStatus::Disconnected;
            }

            let read = tokio::select! {
                _ = self.shutdown.changed() => continue,
                read = timeout(self.config.read_timeout, self.stream.read(&mut chunk)) => read,
            };

            match read {
                Err(_) => {
                    log_trace!(self.logger, "no link data within {:?}", self.config.read_timeout);
                }
                Ok(Ok(0)) => {
                    log_info!(self.logger, "link closed by host");
                    break LinkStatus::Closed;
                }
                Ok(Ok(count)) => {
                    self.undecoded.extend_from_slice(&chunk[..count]);
                    append_utf8(&mut self.undecoded, &mut self.pending);
                    if !self.drain_pending() {
                        log_debug!(self.logger, "position consumer is gone, stopping link reader");
                        break LinkStatus::Disconnected;
                    }
                }
                Ok(Err(error)) => {
                    log_warn!(self.logger, "link read failed: {error}");
                    break LinkStatus::Failed(error.to_string());
                }
            }
        };

        log_info!(self.logger, "link reader stopped: {final_status:?}");
        let _ = self.status.send(final_status);
    }

    /// Scans the pending text. Returns false once nobody takes positions.
    fn drain_pending(&mut self) -> bool {
        loop {
            match scan_link_buffer(&self.pending) {
                LinkScan::Position { position, consumed } => {
                    self.pending.drain(..consumed);
                    if !self.accept(position) {
                        return false;
                    }
                }
                LinkScan::Malformed { consumed } => {
                    log_debug!(self.logger, "skipped malformed link message");
                    self.pending.drain(..consumed);
                }
                LinkScan::Incomplete { discard } => {
                    self.pending.drain(..discard);
                    break;
                }
                LinkScan::NotFound => {
                    // Only a split marker can still turn into a message.
                    let mut keep_from = self
                        .pending
                        .len()
                        .saturating_sub(LINK_MARKER.len() - 1);
                    while !self.pending.is_char_boundary(keep_from) {
                        keep_from += 1;
                    }
                    self.pending.drain(..keep_from);
                    break;
                }
            }
        }

        if self.pending.len() > self.config.max_pending_text {
            log_warn!(
                self.logger,
                "dropped {} bytes of unterminated link text",
                self.pending.len()
            );
            self.pending.clear();
        }
        true
    }

    fn accept(&mut self, position: LatLon) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < self.config.min_position_interval {
                log_trace!(self.logger, "dropped link position {position}: too soon");
                return true;
            }
        }

        let update = LinkPosition {
            position,
            received_at: TimestampUtc::now(),
        };
        match self.positions.try_send(update) {
            Ok(()) => {
                self.last_accepted = Some(now);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                log_warn!(self.logger, "position queue full, dropped {position}");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Moves the decodable prefix of `bytes` into `text`. A trailing partial
/// character stays in `bytes` for the next read; invalid bytes become U+FFFD.
fn append_utf8(bytes: &mut Vec<u8>, text: &mut String) {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                bytes.clear();
                return;
            }
            Err(error) => {
                let valid_up_to = error.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&bytes[..valid_up_to]));
                match error.error_len() {
                    Some(invalid) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        bytes.drain(..valid_up_to + invalid);
                    }
                    None => {
                        bytes.drain(..valid_up_to);
                        return;
                    }
                }
            }
        }
    }
}
