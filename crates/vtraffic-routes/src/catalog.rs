use std::path::Path;

use crate::{load_airways, load_runways, AirwayTable, LoadReport, RouteError, RunwayTable};

/// The two immutable lookup tables the traffic pool selects routes from.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    pub airways: AirwayTable,
    pub runways: RunwayTable,
}

impl RouteCatalog {
    #[must_use]
    pub fn new(airways: AirwayTable, runways: RunwayTable) -> Self {
        Self { airways, runways }
    }

    /// Loads `dir/airways_file` and `dir/runways_file`.
    ///
    /// Both tables are required; a missing file or a table without a single
    /// usable record is an error.
    pub fn load(
        dir: &Path,
        airways_file: &str,
        runways_file: &str,
    ) -> Result<(Self, LoadReport, LoadReport), RouteError> {
        let airways_path = dir.join(airways_file);
        let (airways, airway_report) = load_airways(&airways_path)?;
        if airways.is_empty() {
            return Err(RouteError::EmptyTable { path: airways_path });
        }

        let runways_path = dir.join(runways_file);
        let (runways, runway_report) = load_runways(&runways_path)?;
        if runways.is_empty() {
            return Err(RouteError::EmptyTable { path: runways_path });
        }

        Ok((Self::new(airways, runways), airway_report, runway_report))
    }
}
