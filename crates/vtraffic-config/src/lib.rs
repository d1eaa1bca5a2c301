//! Typed configuration for a traffic session.
//!
//! [`TrafficConfig`] is what the handler and the CLI consume. On disk it is
//! a YAML document whose shape is described by [`json_schema`].

mod schema;
mod validate;

use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use vtraffic_net::{LinkConfig, DEFAULT_MAX_PENDING_TEXT};
use vtraffic_sim::{PoolConfig, PoolError};

pub use schema::json_schema;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrafficConfig {
    pub link: LinkSettings,
    pub pool: PoolSettings,
    pub data: DataSettings,
    pub logging: LoggingConfig,
}

impl TrafficConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate::validate(self)
    }

    /// Reads and validates a YAML document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let document: schema::TrafficConfigDocument = serde_yaml::from_str(text)?;
        let config = Self::try_from(document)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        let document = schema::TrafficConfigDocument::from(self);
        Ok(serde_yaml::to_string(&document)?)
    }
}

/// Where the host simulator and the traffic plugin live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub host: IpAddr,
    pub link_port: u16,
    pub traffic_port: u16,
    pub legacy_traffic_port: u16,
    pub weather_port: u16,
    /// Send `AITFC` lines to the legacy port instead of `RTTFC`.
    pub legacy_traffic: bool,
    pub read_timeout: Duration,
    pub min_position_interval: Duration,
    pub position_queue_capacity: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        let link = LinkConfig::default();
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            link_port: vtraffic_wire::LINK_PORT,
            traffic_port: vtraffic_wire::TRAFFIC_PORT,
            legacy_traffic_port: vtraffic_wire::LEGACY_TRAFFIC_PORT,
            weather_port: vtraffic_wire::WEATHER_PORT,
            legacy_traffic: false,
            read_timeout: link.read_timeout,
            min_position_interval: link.min_position_interval,
            position_queue_capacity: link.queue_capacity,
        }
    }
}

impl LinkSettings {
    #[must_use]
    pub fn link_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.link_port)
    }

    /// Target of traffic datagrams, depending on the selected format.
    #[must_use]
    pub fn traffic_addr(&self) -> SocketAddr {
        let port = if self.legacy_traffic {
            self.legacy_traffic_port
        } else {
            self.traffic_port
        };
        SocketAddr::new(self.host, port)
    }

    #[must_use]
    pub fn weather_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.weather_port)
    }

    #[must_use]
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            read_timeout: self.read_timeout,
            min_position_interval: self.min_position_interval,
            queue_capacity: self.position_queue_capacity,
            max_pending_text: DEFAULT_MAX_PENDING_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub total_aircraft: usize,
    pub vfr_aircraft: usize,
    /// Minimum time between two regenerate/update cycles.
    pub step_length: Duration,
    pub range_nm: f64,
    /// Fixed seed for reproducible traffic; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            total_aircraft: pool.total_aircraft,
            vfr_aircraft: pool.vfr_aircraft,
            step_length: Duration::from_secs(10),
            range_nm: pool.range_nm,
            seed: None,
        }
    }
}

impl PoolSettings {
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            total_aircraft: self.total_aircraft,
            vfr_aircraft: self.vfr_aircraft,
            range_nm: self.range_nm,
        }
    }
}

/// Location of the route tables and the VFR script folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSettings {
    pub dir: PathBuf,
    pub airways_file: String,
    pub runways_file: String,
    pub scripts_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            airways_file: "my_awy.dat".to_owned(),
            runways_file: "my_rwy.dat".to_owned(),
            scripts_dir: "vfrScripts".to_owned(),
        }
    }
}

impl DataSettings {
    #[must_use]
    pub fn scripts_path(&self) -> PathBuf {
        self.dir.join(&self.scripts_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config document: {0}")]
    Document(#[from] serde_yaml::Error),

    #[error(transparent)]
    InvalidPool(#[from] PoolError),

    #[error("invalid {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("link.position_queue_capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("port {port} is used by both {first} and {second}")]
    DuplicatePort {
        port: u16,
        first: &'static str,
        second: &'static str,
    },

    #[error("{field} must not be empty")]
    EmptyPath { field: &'static str },
}
