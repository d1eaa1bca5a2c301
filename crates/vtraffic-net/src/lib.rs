//! Sockets between the traffic plugin, the host simulator and the pool.
//!
//! [`LinkReceiver`] reads the host's own position from the link channel and
//! hands it over through a bounded queue. [`Broadcaster`] fires traffic and
//! weather datagrams at the plugin.

mod broadcast;
mod error;
mod link;

pub use broadcast::Broadcaster;
pub use error::{BroadcastError, LinkError};
pub use link::{
    LinkConfig, LinkPosition, LinkPositions, LinkReceiver, LinkStatus,
    DEFAULT_MAX_PENDING_TEXT, DEFAULT_MIN_POSITION_INTERVAL, DEFAULT_POSITION_QUEUE_CAPACITY,
    DEFAULT_READ_TIMEOUT,
};
