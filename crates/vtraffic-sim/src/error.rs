use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("total aircraft must be at least 1")]
    ZeroTotalAircraft,
    #[error("{vfr} VFR aircraft requested but only {total} in total")]
    VfrExceedsTotal { vfr: usize, total: usize },
    #[error("selection range must be a positive number of nm, got {range_nm}")]
    InvalidRange { range_nm: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("simulation step must be positive seconds, got {step_seconds}")]
    InvalidStep { step_seconds: f64 },
    #[error("simulation step limit must be at least 1")]
    ZeroStepLimit,
    #[error("runway `{preference}` not found")]
    RunwayNotFound { preference: String },
    #[error("{kind} scripts need a runway to start from")]
    MissingRunway { kind: String },
    #[error("{kind} scripts cannot be simulated on their own")]
    UnsupportedKind { kind: String },
}
