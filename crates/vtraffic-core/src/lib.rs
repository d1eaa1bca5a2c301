pub mod position;
pub mod time;

pub use position::{CoreError, LatLon};
pub use time::{TimestampError, TimestampUtc};
