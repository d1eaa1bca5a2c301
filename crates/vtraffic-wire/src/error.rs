use thiserror::Error;
use vtraffic_core::CoreError;

#[derive(Debug, Error, PartialEq)]
pub enum TrafficDecodeError {
    #[error("expected `{expected}` line, found `{found}`")]
    UnexpectedTag { expected: &'static str, found: String },
    #[error("traffic line has {found} fields, at least {expected} required")]
    MissingFields { expected: usize, found: usize },
    #[error("field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("timestamp must be positive, got {0}")]
    NonPositiveTimestamp(i64),
    #[error("altitude must be positive, got {0} ft")]
    NonPositiveAltitude(f64),
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] CoreError),
}
