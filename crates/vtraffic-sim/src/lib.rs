//! Kinematic aircraft model and the traffic pool that keeps a population of
//! virtual aircraft alive around a reference position.

mod aircraft;
mod envelope;
mod error;
pub mod fleet;
mod model;
mod pool;
mod simulate;

pub use aircraft::{AircraftIdentity, FlightRules, VirtualAircraft};
pub use envelope::{
    AircraftCategory, PerformanceEnvelope, FALLBACK_SPEED_KT, MAX_ACCELERATION_KT_PER_SEC,
    MAX_TURN_RATE_DEG_PER_SEC, MIN_ACCELERATION_KT_PER_SEC, MIN_ALTITUDE_FT,
    MIN_TURN_RATE_DEG_PER_SEC, MIN_VERTICAL_RATE_FPM,
};
pub use error::{PoolError, SimulationError};
pub use model::{KinematicModel, Telemetry, AIRBORNE_MARGIN_FT, LEG_CORRECTION_THRESHOLD_DEGREES};
pub use pool::{
    PoolConfig, TrafficPool, MAX_IFR_ALTITUDE_FT, MAX_REGISTRATION_NUMBER, MIN_IFR_ALTITUDE_FT,
};
pub use simulate::{
    anchor_script, simulate_script, SimulatedTrack, SimulationSettings,
    DEFAULT_MAX_SIMULATION_STEPS, DEFAULT_SIMULATION_STEP_SECONDS,
};
