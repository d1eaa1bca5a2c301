use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::{
    ConfigError, DataSettings, LinkSettings, LogFormat, LogLevel, LoggingConfig, PoolSettings,
    TrafficConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TrafficConfigDocument {
    pub link: LinkDocument,
    pub pool: PoolDocument,
    pub data: DataDocument,
    pub logging: LoggingDocument,
}

impl Default for TrafficConfigDocument {
    fn default() -> Self {
        Self::from(&TrafficConfig::default())
    }
}

impl From<&TrafficConfig> for TrafficConfigDocument {
    fn from(value: &TrafficConfig) -> Self {
        Self {
            link: LinkDocument::from(&value.link),
            pool: PoolDocument::from(&value.pool),
            data: DataDocument::from(&value.data),
            logging: LoggingDocument::from(&value.logging),
        }
    }
}

impl TryFrom<TrafficConfigDocument> for TrafficConfig {
    type Error = ConfigError;

    fn try_from(value: TrafficConfigDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            link: value.link.try_into()?,
            pool: value.pool.into(),
            data: value.data.into(),
            logging: value.logging.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LinkDocument {
    pub host: String,
    pub link_port: u16,
    pub traffic_port: u16,
    pub legacy_traffic_port: u16,
    pub weather_port: u16,
    pub legacy_traffic: bool,
    pub read_timeout: DurationDocument,
    pub min_position_interval: DurationDocument,
    pub position_queue_capacity: usize,
}

impl Default for LinkDocument {
    fn default() -> Self {
        Self::from(&LinkSettings::default())
    }
}

impl From<&LinkSettings> for LinkDocument {
    fn from(value: &LinkSettings) -> Self {
        Self {
            host: value.host.to_string(),
            link_port: value.link_port,
            traffic_port: value.traffic_port,
            legacy_traffic_port: value.legacy_traffic_port,
            weather_port: value.weather_port,
            legacy_traffic: value.legacy_traffic,
            read_timeout: DurationDocument::from_duration(value.read_timeout),
            min_position_interval: DurationDocument::from_duration(value.min_position_interval),
            position_queue_capacity: value.position_queue_capacity,
        }
    }
}

impl TryFrom<LinkDocument> for LinkSettings {
    type Error = ConfigError;

    fn try_from(value: LinkDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            host: parse_ip_addr("link.host", value.host)?,
            link_port: value.link_port,
            traffic_port: value.traffic_port,
            legacy_traffic_port: value.legacy_traffic_port,
            weather_port: value.weather_port,
            legacy_traffic: value.legacy_traffic,
            read_timeout: value.read_timeout.into_duration(),
            min_position_interval: value.min_position_interval.into_duration(),
            position_queue_capacity: value.position_queue_capacity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PoolDocument {
    pub total_aircraft: usize,
    pub vfr_aircraft: usize,
    pub step_length: DurationDocument,
    pub range_nm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PoolDocument {
    fn default() -> Self {
        Self::from(&PoolSettings::default())
    }
}

impl From<&PoolSettings> for PoolDocument {
    fn from(value: &PoolSettings) -> Self {
        Self {
            total_aircraft: value.total_aircraft,
            vfr_aircraft: value.vfr_aircraft,
            step_length: DurationDocument::from_duration(value.step_length),
            range_nm: value.range_nm,
            seed: value.seed,
        }
    }
}

impl From<PoolDocument> for PoolSettings {
    fn from(value: PoolDocument) -> Self {
        Self {
            total_aircraft: value.total_aircraft,
            vfr_aircraft: value.vfr_aircraft,
            step_length: value.step_length.into_duration(),
            range_nm: value.range_nm,
            seed: value.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DataDocument {
    pub dir: PathBuf,
    pub airways_file: String,
    pub runways_file: String,
    pub scripts_dir: String,
}

impl Default for DataDocument {
    fn default() -> Self {
        Self::from(&DataSettings::default())
    }
}

impl From<&DataSettings> for DataDocument {
    fn from(value: &DataSettings) -> Self {
        Self {
            dir: value.dir.clone(),
            airways_file: value.airways_file.clone(),
            runways_file: value.runways_file.clone(),
            scripts_dir: value.scripts_dir.clone(),
        }
    }
}

impl From<DataDocument> for DataSettings {
    fn from(value: DataDocument) -> Self {
        Self {
            dir: value.dir,
            airways_file: value.airways_file,
            runways_file: value.runways_file,
            scripts_dir: value.scripts_dir,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[schemars(with = "String")]
pub(crate) struct DurationDocument(Duration);

impl DurationDocument {
    pub(crate) const fn from_duration(value: Duration) -> Self {
        Self(value)
    }

    pub(crate) const fn into_duration(self) -> Duration {
        self.0
    }
}

impl Serialize for DurationDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(self.0))
    }
}

impl<'de> Deserialize<'de> for DurationDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDuration {
            Text(String),
            Milliseconds(u64),
        }

        match RawDuration::deserialize(deserializer)? {
            RawDuration::Text(text) => parse_duration(&text)
                .map(Self)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {text}"))),
            RawDuration::Milliseconds(ms) => Ok(Self(Duration::from_millis(ms))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LoggingDocument {
    pub level: LogLevelDocument,
    pub format: LogFormatDocument,
}

impl Default for LoggingDocument {
    fn default() -> Self {
        Self::from(&LoggingConfig::default())
    }
}

impl From<&LoggingConfig> for LoggingDocument {
    fn from(value: &LoggingConfig) -> Self {
        Self {
            level: LogLevelDocument::from(value.level),
            format: LogFormatDocument::from(value.format),
        }
    }
}

impl From<LoggingDocument> for LoggingConfig {
    fn from(value: LoggingDocument) -> Self {
        Self {
            level: value.level.into(),
            format: value.format.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogLevelDocument {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LogLevelDocument {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::Trace,
            LogLevel::Debug => Self::Debug,
            LogLevel::Info => Self::Info,
            LogLevel::Warn => Self::Warn,
            LogLevel::Error => Self::Error,
        }
    }
}

impl From<LogLevelDocument> for LogLevel {
    fn from(value: LogLevelDocument) -> Self {
        match value {
            LogLevelDocument::Trace => Self::Trace,
            LogLevelDocument::Debug => Self::Debug,
            LogLevelDocument::Info => Self::Info,
            LogLevelDocument::Warn => Self::Warn,
            LogLevelDocument::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogFormatDocument {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for LogFormatDocument {
    fn from(value: LogFormat) -> Self {
        match value {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

impl From<LogFormatDocument> for LogFormat {
    fn from(value: LogFormatDocument) -> Self {
        match value {
            LogFormatDocument::Pretty => Self::Pretty,
            LogFormatDocument::Compact => Self::Compact,
            LogFormatDocument::Json => Self::Json,
        }
    }
}

/// JSON schema of the YAML configuration document.
#[must_use]
pub fn json_schema() -> JsonValue {
    serde_json::to_value(schema_for!(TrafficConfigDocument)).unwrap_or(JsonValue::Null)
}

fn parse_ip_addr(field: &'static str, value: String) -> Result<IpAddr, ConfigError> {
    IpAddr::from_str(value.trim()).map_err(|_| ConfigError::InvalidAddress { field, value })
}

fn parse_duration(raw: &str) -> Option<Duration> {
    let text = raw.trim();
    if let Some(value) = text.strip_suffix("ms") {
        return value.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(value) = text.strip_suffix('s') {
        return value.trim().parse::<u64>().ok().map(Duration::from_secs);
    }
    if let Some(value) = text.strip_suffix('m') {
        return value
            .trim()
            .parse::<u64>()
            .ok()
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)));
    }

    text.parse::<u64>().ok().map(Duration::from_secs)
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        return format!("{}s", duration.as_secs());
    }

    format!("{}ms", duration.as_millis())
}
