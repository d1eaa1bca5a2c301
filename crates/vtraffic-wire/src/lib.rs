//! Text formats spoken with the traffic plugin.
//!
//! Everything here is pure: no sockets, no clocks.

mod error;
mod link;
mod traffic;
mod weather;

pub use error::TrafficDecodeError;
pub use link::{parse_link_position, scan_link_buffer, LinkScan, LINK_MARKER};
pub use traffic::{
    decode_legacy_traffic, decode_traffic, decode_traffic_line, encode_legacy_traffic,
    encode_traffic, TrafficFormat, TrafficReport, LEGACY_TRAFFIC_TAG, MIN_TRAFFIC_FIELDS,
    TRAFFIC_EXTENSION_FIELDS, TRAFFIC_TAG,
};
pub use weather::{encode_weather, WeatherReport};

/// TCP port the host simulator serves its own position on.
pub const LINK_PORT: u16 = 10747;
/// UDP port for `RTTFC` traffic.
pub const TRAFFIC_PORT: u16 = 49005;
/// UDP port for legacy `AITFC` traffic.
pub const LEGACY_TRAFFIC_PORT: u16 = 49003;
pub const WEATHER_PORT: u16 = 49004;
