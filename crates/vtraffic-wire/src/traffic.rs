use std::fmt::Write as _;

use vtraffic_core::LatLon;

use crate::TrafficDecodeError;

pub const TRAFFIC_TAG: &str = "RTTFC";
pub const LEGACY_TRAFFIC_TAG: &str = "AITFC";

/// Tag plus the fourteen core fields.
pub const MIN_TRAFFIC_FIELDS: usize = 15;

/// Fields following the core block of an `RTTFC` line.
pub const TRAFFIC_EXTENSION_FIELDS: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficFormat {
    /// `RTTFC`, core plus extension fields.
    RealTraffic,
    /// `AITFC`, core fields only.
    Legacy,
}

impl TrafficFormat {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::RealTraffic => TRAFFIC_TAG,
            Self::Legacy => LEGACY_TRAFFIC_TAG,
        }
    }
}

/// One aircraft as reported on the traffic channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficReport {
    pub hex_id: String,
    pub position: LatLon,
    pub altitude_ft: f64,
    pub vertical_rate_fpm: f64,
    pub airborne: bool,
    pub track_degrees: f64,
    pub ground_speed_kt: f64,
    pub callsign: String,
    pub aircraft_type: String,
    pub tail: String,
    pub origin: String,
    pub destination: String,
    /// UNIX seconds of the position.
    pub timestamp: i64,
}

/// `RTTFC,hexid,lat,lon,alt,vs,airborne,trk,gs,cs,type,tail,from,to,ts,...`
#[must_use]
pub fn encode_traffic(report: &TrafficReport) -> String {
    let mut line = encode_core(TRAFFIC_TAG, report);
    let extension = [
        "vtraffic".to_owned(),              // source
        String::new(),                      // IATA callsign
        "adsb_icao".to_owned(),             // message type
        format!("{:.0}", report.altitude_ft), // geometric altitude
        "-1".to_owned(),                    // IAS
        format!("{:.0}", report.ground_speed_kt), // TAS
        "-1".to_owned(),                    // Mach
        "-1".to_owned(),                    // track rate
        "-1".to_owned(),                    // roll
        "-1".to_owned(),                    // magnetic heading
        format!("{:.1}", report.track_degrees), // true heading
        format!("{:.0}", report.vertical_rate_fpm), // geometric rate
        "none".to_owned(),                  // emergency
        String::new(),                      // category
        "1013.2".to_owned(),                // QNH
        "-1".to_owned(),                    // MCP altitude
        "-1".to_owned(),                    // FMS altitude
        "-1".to_owned(),                    // nav heading
        String::new(),                      // nav modes
        "0".to_owned(),                     // seen
        "-1".to_owned(),                    // RSSI
        "-1".to_owned(),                    // wind direction
        "-1".to_owned(),                    // wind speed
        "-1".to_owned(),                    // OAT
        "-1".to_owned(),                    // TAT
        "1".to_owned(),                     // ICAO hex
        "-1".to_owned(),                    // augmentation status
        String::new(),                      // authentication
    ];
    debug_assert_eq!(extension.len(), TRAFFIC_EXTENSION_FIELDS);
    for field in extension {
        line.push(',');
        line.push_str(&field);
    }
    line
}

/// `AITFC,hexid,lat,lon,alt,vs,airborne,trk,gs,cs,type,tail,from,to,ts`
#[must_use]
pub fn encode_legacy_traffic(report: &TrafficReport) -> String {
    encode_core(LEGACY_TRAFFIC_TAG, report)
}

fn encode_core(tag: &str, report: &TrafficReport) -> String {
    let mut line = String::with_capacity(128);
    // Writing into a String cannot fail.
    let _ = write!(
        line,
        "{tag},{},{:.7},{:.7},{:.0},{:.0},{},{:.1},{:.1},{},{},{},{},{},{}",
        text_field(&report.hex_id),
        report.position.latitude(),
        report.position.longitude(),
        report.altitude_ft,
        report.vertical_rate_fpm,
        u8::from(report.airborne),
        report.track_degrees,
        report.ground_speed_kt,
        text_field(&report.callsign),
        text_field(&report.aircraft_type),
        text_field(&report.tail),
        text_field(&report.origin),
        text_field(&report.destination),
        report.timestamp
    );
    line
}

fn text_field(value: &str) -> String {
    value.replace(',', " ")
}

pub fn decode_traffic(line: &str) -> Result<TrafficReport, TrafficDecodeError> {
    decode_tagged(line, TrafficFormat::RealTraffic)
}

pub fn decode_legacy_traffic(line: &str) -> Result<TrafficReport, TrafficDecodeError> {
    decode_tagged(line, TrafficFormat::Legacy)
}

/// Decodes either format, picked by the line's tag.
pub fn decode_traffic_line(line: &str) -> Result<(TrafficFormat, TrafficReport), TrafficDecodeError> {
    let format = if line.trim_start().starts_with(LEGACY_TRAFFIC_TAG) {
        TrafficFormat::Legacy
    } else {
        TrafficFormat::RealTraffic
    };
    decode_tagged(line, format).map(|report| (format, report))
}

fn decode_tagged(line: &str, format: TrafficFormat) -> Result<TrafficReport, TrafficDecodeError> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields[0] != format.tag() {
        return Err(TrafficDecodeError::UnexpectedTag {
            expected: format.tag(),
            found: fields[0].chars().take(16).collect(),
        });
    }
    if fields.len() < MIN_TRAFFIC_FIELDS {
        return Err(TrafficDecodeError::MissingFields {
            expected: MIN_TRAFFIC_FIELDS,
            found: fields.len(),
        });
    }

    let latitude = number("latitude", fields[2])?;
    let longitude = number("longitude", fields[3])?;
    let altitude_ft = number("altitude", fields[4])?;
    let vertical_rate_fpm = number("vertical rate", fields[5])?;
    let airborne = number("airborne", fields[6])? != 0.0;
    let track_degrees = number("track", fields[7])?;
    let ground_speed_kt = number("ground speed", fields[8])?;
    let timestamp = number("timestamp", fields[14])?.trunc() as i64;

    if timestamp <= 0 {
        return Err(TrafficDecodeError::NonPositiveTimestamp(timestamp));
    }
    if altitude_ft <= 0.0 {
        return Err(TrafficDecodeError::NonPositiveAltitude(altitude_ft));
    }

    Ok(TrafficReport {
        hex_id: fields[1].to_owned(),
        position: LatLon::new(latitude, longitude)?,
        altitude_ft,
        vertical_rate_fpm,
        airborne,
        track_degrees,
        ground_speed_kt,
        callsign: fields[9].to_owned(),
        aircraft_type: fields[10].to_owned(),
        tail: fields[11].to_owned(),
        origin: fields[12].to_owned(),
        destination: fields[13].to_owned(),
        timestamp,
    })
}

fn number(field: &'static str, value: &str) -> Result<f64, TrafficDecodeError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| TrafficDecodeError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}
