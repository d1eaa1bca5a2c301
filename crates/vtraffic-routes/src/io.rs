use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use vtraffic_core::LatLon;

use crate::{
    AirwayLayer, AirwaySegment, AirwayTable, RecordError, RouteError, RunwayRecord, RunwayTable,
    Waypoint,
};

/// Line that ends an airway table file.
pub const AIRWAY_TABLE_TERMINATOR: &str = "99";

const AIRWAY_FIELDS: usize = 12;
const RUNWAY_FIELDS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub line: usize,
    pub reason: String,
}

/// Outcome of reading a table: accepted count plus the lines that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub accepted: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl LoadReport {
    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedRecord {
            line,
            reason: reason.into(),
        });
    }
}

/// Parses `sid sreg slat slon eid ereg elat elon layer base_ft top_ft names`.
pub fn parse_airway_record(line: &str) -> Result<AirwaySegment, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < AIRWAY_FIELDS {
        return Err(RecordError::MissingFields {
            expected: AIRWAY_FIELDS,
            found: fields.len(),
        });
    }

    let start = Waypoint::new(
        fields[0],
        fields[1],
        LatLon::new(
            parse_number("start_lat", fields[2])?,
            parse_number("start_lon", fields[3])?,
        )?,
    )?;
    let end = Waypoint::new(
        fields[4],
        fields[5],
        LatLon::new(
            parse_number("end_lat", fields[6])?,
            parse_number("end_lon", fields[7])?,
        )?,
    )?;
    let layer = AirwayLayer::from_code(parse_number("layer", fields[8])?);
    let base_ft = parse_number("base_ft", fields[9])?;
    let top_ft = parse_number("top_ft", fields[10])?;

    AirwaySegment::new(start, end, layer, base_ft, top_ft, fields[11])
}

/// Parses `icao,number,side,elevation_ft,slat,slon,elat,elon`.
pub fn parse_runway_record(line: &str) -> Result<RunwayRecord, RecordError> {
    let mut reader = runway_reader(line.as_bytes());
    let mut record = StringRecord::new();
    // A line that is not even CSV carries no fields.
    if !reader.read_record(&mut record).unwrap_or(false) {
        return Err(RecordError::MissingFields {
            expected: RUNWAY_FIELDS,
            found: 0,
        });
    }
    runway_from_record(&record)
}

fn runway_from_record(record: &StringRecord) -> Result<RunwayRecord, RecordError> {
    if record.len() < RUNWAY_FIELDS {
        return Err(RecordError::MissingFields {
            expected: RUNWAY_FIELDS,
            found: record.len(),
        });
    }
    let field = |index: usize| record.get(index).unwrap_or_default();

    RunwayRecord::new(
        field(0),
        parse_number("number", field(1))?,
        field(2),
        parse_number("elevation", field(3))?,
        LatLon::new(
            parse_number("start_lat", field(4))?,
            parse_number("start_lon", field(5))?,
        )?,
        LatLon::new(
            parse_number("end_lat", field(6))?,
            parse_number("end_lon", field(7))?,
        )?,
    )
}

fn runway_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn record_line(record: &StringRecord) -> usize {
    record
        .position()
        .and_then(|position| usize::try_from(position.line()).ok())
        .unwrap_or_default()
}

pub fn read_airways<R: BufRead>(reader: R) -> Result<(AirwayTable, LoadReport), RouteError> {
    let mut table = AirwayTable::new();
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(RouteError::Io)?;
        let trimmed = line.trim();
        if is_terminator(trimmed) {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        match parse_airway_record(trimmed) {
            Ok(segment) => {
                let key = segment.key().to_owned();
                if table.insert(segment) {
                    report.accepted += 1;
                } else {
                    report.skip(index + 1, format!("duplicate key {key}"));
                }
            }
            Err(error) => report.skip(index + 1, error.to_string()),
        }
    }

    Ok((table, report))
}

pub fn read_runways<R: BufRead>(reader: R) -> Result<(RunwayTable, LoadReport), RouteError> {
    let mut table = RunwayTable::new();
    let mut report = LoadReport::default();

    let mut reader = runway_reader(reader);
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(error) if error.is_io_error() => return Err(RouteError::Io(error.into())),
            Err(error) => {
                let line = error
                    .position()
                    .and_then(|position| usize::try_from(position.line()).ok())
                    .unwrap_or_default();
                report.skip(line, error.to_string());
                continue;
            }
        }
        if record.iter().all(str::is_empty) {
            continue;
        }

        match runway_from_record(&record) {
            Ok(runway) => {
                let key = runway.key().to_owned();
                if table.insert(runway) {
                    report.accepted += 1;
                } else {
                    report.skip(record_line(&record), format!("duplicate key {key}"));
                }
            }
            Err(error) => report.skip(record_line(&record), error.to_string()),
        }
    }

    Ok((table, report))
}

pub fn write_airways<W: Write>(mut writer: W, table: &AirwayTable) -> Result<(), RouteError> {
    for segment in table.iter() {
        let start = segment.start();
        let end = segment.end();
        writeln!(
            writer,
            "{} {} {:.6} {:.6} {} {} {:.6} {:.6} {} {} {} {}",
            start.ident(),
            start.region(),
            start.position().latitude(),
            start.position().longitude(),
            end.ident(),
            end.region(),
            end.position().latitude(),
            end.position().longitude(),
            segment.layer().code(),
            segment.base_ft(),
            segment.top_ft(),
            segment.names().join("-"),
        )
        .map_err(RouteError::Io)?;
    }
    writeln!(writer, "{AIRWAY_TABLE_TERMINATOR}").map_err(RouteError::Io)?;
    writer.flush().map_err(RouteError::Io)
}

pub fn write_runways<W: Write>(writer: W, table: &RunwayTable) -> Result<(), RouteError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for runway in table.iter() {
        writer
            .write_record([
                runway.airport().to_owned(),
                runway.number().to_string(),
                runway.side().to_owned(),
                format!("{:.0}", runway.elevation_ft()),
                format!("{:.6}", runway.threshold().latitude()),
                format!("{:.6}", runway.threshold().longitude()),
                format!("{:.6}", runway.opposite().latitude()),
                format!("{:.6}", runway.opposite().longitude()),
            ])
            .map_err(|error| RouteError::Io(error.into()))?;
    }
    writer.flush().map_err(RouteError::Io)
}

pub fn load_airways(path: &Path) -> Result<(AirwayTable, LoadReport), RouteError> {
    let file = File::open(path).map_err(|source| RouteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_airways(BufReader::new(file)).map_err(|error| with_read_path(error, path))
}

pub fn load_runways(path: &Path) -> Result<(RunwayTable, LoadReport), RouteError> {
    let file = File::open(path).map_err(|source| RouteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    read_runways(BufReader::new(file)).map_err(|error| with_read_path(error, path))
}

pub fn save_airways(path: &Path, table: &AirwayTable) -> Result<(), RouteError> {
    let file = File::create(path).map_err(|source| RouteError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_airways(BufWriter::new(file), table).map_err(|error| with_write_path(error, path))
}

pub fn save_runways(path: &Path, table: &RunwayTable) -> Result<(), RouteError> {
    let file = File::create(path).map_err(|source| RouteError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_runways(BufWriter::new(file), table).map_err(|error| with_write_path(error, path))
}

fn is_terminator(line: &str) -> bool {
    line.split_whitespace().next() == Some(AIRWAY_TABLE_TERMINATOR)
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    value.trim().parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}

fn with_read_path(error: RouteError, path: &Path) -> RouteError {
    match error {
        RouteError::Io(source) => RouteError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

fn with_write_path(error: RouteError, path: &Path) -> RouteError {
    match error {
        RouteError::Io(source) => RouteError::Write {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{
        parse_airway_record, parse_runway_record, read_airways, read_runways, write_runways,
    };
    use crate::{AirwayLayer, RecordError};

    #[test]
    fn airway_record_parses_all_fields() {
        let segment = parse_airway_record(
            "TRA LS 47.689444 8.437500 ZUE LS 47.591667 8.817500 2 24500 66000 UN871-UL612",
        )
        .expect("record should parse");

        assert_eq!(segment.key(), "TRA_LS_ZUE_LS");
        assert_eq!(segment.layer(), AirwayLayer::High);
        assert_eq!(segment.base_ft(), 24_500);
        assert_eq!(segment.top_ft(), 66_000);
        assert_eq!(segment.names().len(), 2);
    }

    #[test]
    fn airway_record_reports_bad_number() {
        let error = parse_airway_record("TRA LS north 8.4 ZUE LS 47.5 8.8 2 24500 66000 UN871")
            .expect_err("latitude text is not a number");
        assert_eq!(
            error,
            RecordError::InvalidNumber {
                field: "start_lat",
                value: "north".to_owned()
            }
        );
    }

    #[test]
    fn airway_reader_stops_at_terminator_and_reports_skips() {
        let text = "\
TRA LS 47.689444 8.437500 ZUE LS 47.591667 8.817500 2 24500 66000 UN871
TRA LS 47.689444 8.437500 ZUE LS 47.591667 8.817500 2 24500 66000 UN871
BAD LS 47.0 8.0 BAD LS 47.0 8.0 1 1000 5000 A1
short line

99
ZUE LS 47.591667 8.817500 TRA LS 47.689444 8.437500 2 24500 66000 UN871
";
        let (table, report) = read_airways(Cursor::new(text)).expect("read should succeed");

        assert_eq!(table.len(), 1);
        assert_eq!(report.accepted, 1);
        let lines: Vec<usize> = report.skipped.iter().map(|skip| skip.line).collect();
        assert_eq!(lines, [2, 3, 4]);
        assert!(report.skipped[0].reason.contains("duplicate"));
    }

    #[test]
    fn runway_record_parses_csv() {
        let runway = parse_runway_record("LSZH,14,,1416,47.482,8.535,47.463,8.562")
            .expect("record should parse");
        assert_eq!(runway.key(), "LSZH_RW14");
        assert_eq!(runway.elevation_ft(), 1_416.0);
        assert!((runway.bearing_degrees() - 137.0).abs() < 5.0);
    }

    #[test]
    fn runway_reader_skips_malformed_rows() {
        let text = "LSZH,14,,1416,47.482,8.535,47.463,8.562\nLSZH,x,,1416,47,8,47,8\nLSZB,14,,1674\n";
        let (table, report) = read_runways(Cursor::new(text)).expect("read should succeed");
        assert_eq!(table.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        let lines: Vec<usize> = report.skipped.iter().map(|skip| skip.line).collect();
        assert_eq!(lines, [2, 3]);
    }

    #[test]
    fn runway_fields_may_be_quoted_and_padded() {
        let text = "\"LSZH\", 14 ,\"\",1416,47.482,8.535,47.463,8.562\n   \n";
        let (table, report) = read_runways(Cursor::new(text)).expect("read should succeed");
        assert_eq!(report.accepted, 1);
        assert!(report.skipped.is_empty());

        let mut written = Vec::new();
        write_runways(&mut written, &table).expect("write should succeed");
        assert_eq!(
            String::from_utf8(written).expect("utf-8 output"),
            "LSZH,14,,1416,47.482000,8.535000,47.463000,8.562000\n"
        );
    }
}
