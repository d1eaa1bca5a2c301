use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vtraffic_core::CoreError;

/// Failure to build a single airway or runway record.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record has {found} fields, expected at least {expected}")]
    MissingFields { expected: usize, found: usize },

    #[error("field `{field}` is not a valid number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` must not be empty")]
    EmptyField { field: &'static str },

    #[error("altitude band base {base_ft} ft must be below top {top_ft} ft")]
    InvalidAltitudeBand { base_ft: i32, top_ft: i32 },

    #[error("segment start and end are the same waypoint `{id}`")]
    DegenerateSegment { id: String },

    #[error("runway number must be in 1..=36, got {number}")]
    InvalidRunwayNumber { number: u8 },

    #[error("runway thresholds coincide")]
    DegenerateRunway,

    #[error(transparent)]
    Position(#[from] CoreError),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to read route table `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write route table `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("route table I/O failed: {0}")]
    Io(#[source] io::Error),

    #[error("route table `{path}` holds no usable records")]
    EmptyTable { path: PathBuf },
}
