use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// UTC timestamp represented as nanoseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampUtc {
    unix_nanos: i128,
}

impl TimestampUtc {
    /// The Unix epoch (`1970-01-01T00:00:00Z`).
    pub const UNIX_EPOCH: Self = Self { unix_nanos: 0 };

    /// Returns the current UTC timestamp derived from system clock.
    #[must_use]
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Creates a timestamp from raw Unix nanoseconds.
    #[must_use]
    pub const fn from_unix_nanos(unix_nanos: i128) -> Self {
        Self { unix_nanos }
    }

    /// Creates a timestamp from Unix whole seconds.
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self {
            unix_nanos: (seconds as i128) * NANOS_PER_SECOND,
        }
    }

    /// Creates a timestamp from system time.
    #[must_use]
    pub fn from_system_time(value: SystemTime) -> Self {
        match value.duration_since(UNIX_EPOCH) {
            Ok(delta) => Self {
                unix_nanos: duration_to_nanos(delta),
            },
            Err(err) => Self {
                unix_nanos: -duration_to_nanos(err.duration()),
            },
        }
    }

    #[must_use]
    pub const fn unix_nanos(self) -> i128 {
        self.unix_nanos
    }

    /// Returns Unix whole seconds from the epoch.
    #[must_use]
    pub const fn unix_seconds(self) -> i128 {
        self.unix_nanos.div_euclid(NANOS_PER_SECOND)
    }

    /// Shifts the timestamp by a possibly fractional number of seconds.
    #[must_use]
    pub fn add_seconds(self, seconds: f64) -> Self {
        if !seconds.is_finite() {
            return self;
        }
        let delta = (seconds * NANOS_PER_SECOND as f64).round() as i128;
        Self {
            unix_nanos: self.unix_nanos.saturating_add(delta),
        }
    }

    #[must_use]
    pub fn add_duration(self, delta: Duration) -> Self {
        Self {
            unix_nanos: self.unix_nanos.saturating_add(duration_to_nanos(delta)),
        }
    }

    /// Signed seconds elapsed from `earlier` to `self`.
    #[must_use]
    pub fn seconds_since(self, earlier: Self) -> f64 {
        (self.unix_nanos - earlier.unix_nanos) as f64 / NANOS_PER_SECOND as f64
    }

    /// Converts this timestamp to `SystemTime`.
    pub fn to_system_time(self) -> Result<SystemTime, TimestampError> {
        let out_of_range = TimestampError::OutOfRangeForSystemTime {
            unix_nanos: self.unix_nanos,
        };
        let magnitude = self.unix_nanos.unsigned_abs();
        let seconds = u64::try_from(magnitude / (NANOS_PER_SECOND as u128))
            .map_err(|_| out_of_range.clone())?;
        let delta = Duration::new(seconds, (magnitude % (NANOS_PER_SECOND as u128)) as u32);

        let converted = if self.unix_nanos >= 0 {
            UNIX_EPOCH.checked_add(delta)
        } else {
            UNIX_EPOCH.checked_sub(delta)
        };
        converted.ok_or(out_of_range)
    }
}

impl Default for TimestampUtc {
    fn default() -> Self {
        Self::UNIX_EPOCH
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    OutOfRangeForSystemTime { unix_nanos: i128 },
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRangeForSystemTime { unix_nanos } => {
                write!(f, "timestamp {unix_nanos}ns is out of range for SystemTime")
            }
        }
    }
}

impl std::error::Error for TimestampError {}

fn duration_to_nanos(delta: Duration) -> i128 {
    (delta.as_secs() as i128) * NANOS_PER_SECOND + (delta.subsec_nanos() as i128)
}
