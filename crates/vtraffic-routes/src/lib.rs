mod airway;
mod catalog;
mod error;
mod io;
mod runway;

pub use airway::{AirwayLayer, AirwaySegment, AirwayTable, Waypoint};
pub use catalog::RouteCatalog;
pub use error::{RecordError, RouteError};
pub use io::{
    load_airways, load_runways, parse_airway_record, parse_runway_record, read_airways,
    read_runways, save_airways, save_runways, write_airways, write_runways, LoadReport,
    SkippedRecord, AIRWAY_TABLE_TERMINATOR,
};
pub use runway::{RunwayRecord, RunwayTable};
