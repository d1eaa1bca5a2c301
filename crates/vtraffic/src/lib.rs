//! Virtual traffic for a flight-simulator traffic plugin.
//!
//! This crate ties the workspace together: [`TrafficHandler`] runs a session
//! against the host simulator, [`convert_recording`] turns recorded traffic
//! into scripts, and [`VtrafficError`] wraps every crate's error.

mod convert;
mod error;
mod handler;
mod report;

use thiserror::Error;

pub use convert::{
    convert_recording, convert_recording_file, Conversion, ConvertOptions,
    ALTITUDE_CHANGE_THRESHOLD_FT, CORRECTIVE_VERTICAL_RATE_FPM, JET_SPEED_THRESHOLD_KT,
    MIN_MOVING_SPEED_KT, SPEED_CHANGE_THRESHOLD_KT,
};
pub use error::{ConvertError, HandlerError};
pub use handler::{SessionStats, TrafficHandler};
pub use report::traffic_report;

pub mod prelude {
    pub use vtraffic_config::TrafficConfig;
    pub use vtraffic_core::{CoreError, LatLon, TimestampUtc};
    pub use vtraffic_log::{Logger, SharedLogger};
    pub use vtraffic_routes::{AirwaySegment, AirwayTable, RouteCatalog, RunwayRecord, RunwayTable};
    pub use vtraffic_script::{Command, Descriptor, FlightKind, Script, ScriptLibrary};
    pub use vtraffic_sim::{PerformanceEnvelope, PoolConfig, TrafficPool, VirtualAircraft};
    pub use vtraffic_wire::{TrafficFormat, TrafficReport, WeatherReport};

    pub use crate::{SessionStats, TrafficHandler, VtrafficError};
}

pub type Result<T> = std::result::Result<T, VtrafficError>;

#[derive(Debug, Error)]
pub enum VtrafficError {
    #[error(transparent)]
    Core(#[from] vtraffic_core::CoreError),
    #[error(transparent)]
    Timestamp(#[from] vtraffic_core::TimestampError),
    #[error(transparent)]
    Route(#[from] vtraffic_routes::RouteError),
    #[error(transparent)]
    ScriptParse(#[from] vtraffic_script::ScriptParseError),
    #[error(transparent)]
    ScriptLoad(#[from] vtraffic_script::ScriptLoadError),
    #[error(transparent)]
    Script(#[from] vtraffic_script::ScriptError),
    #[error(transparent)]
    Pool(#[from] vtraffic_sim::PoolError),
    #[error(transparent)]
    Simulation(#[from] vtraffic_sim::SimulationError),
    #[error(transparent)]
    TrafficDecode(#[from] vtraffic_wire::TrafficDecodeError),
    #[error(transparent)]
    Link(#[from] vtraffic_net::LinkError),
    #[error(transparent)]
    Broadcast(#[from] vtraffic_net::BroadcastError),
    #[error(transparent)]
    Config(#[from] vtraffic_config::ConfigError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}
