use std::fmt;
use std::str::FromStr;

use vtraffic_core::LatLon;
use vtraffic_routes::{AirwaySegment, RunwayRecord};

use crate::DescriptorError;

/// Registration prefix of every virtual aircraft.
pub const TAIL_PREFIX: &str = "VX-";
/// Operator used when a script names none (GA style `YYYnnnn` callsigns).
pub const DEFAULT_OPERATOR: &str = "YYY";
pub const RUNWAY_DESTINATION_LABEL: &str = "VFR->";
pub const AIRWAY_DESTINATION_PENDING: &str = "IFR->";
pub const MESSAGE_START_LABEL: &str = "MSG_SPOS";
pub const MESSAGE_END_LABEL: &str = "MSG_EPOS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightKind {
    /// Ground departure; altitudes are relative to the runway elevation.
    Runway,
    /// Enroute along an airway segment; altitudes are MSL.
    Airway,
    /// Replayed recording anchored at a random runway.
    MsgRelative,
    /// Replayed recording with its own start position.
    MsgAbsolute,
}

impl FlightKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runway => "Runway",
            Self::Airway => "Airway",
            Self::MsgRelative => "MsgRelative",
            Self::MsgAbsolute => "MsgAbsolute",
        }
    }

    /// Whether `Climb` targets are MSL from the start.
    #[must_use]
    pub const fn starts_msl_based(self) -> bool {
        !matches!(self, Self::Runway)
    }
}

impl fmt::Display for FlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightKind {
    type Err = DescriptorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        [
            Self::Runway,
            Self::Airway,
            Self::MsgRelative,
            Self::MsgAbsolute,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| DescriptorError::UnknownFlightKind(trimmed.to_owned()))
    }
}

/// Leading script command: aircraft and route metadata plus the start pose.
///
/// Scripts from disk only carry type, kind and the kind-specific fields; the
/// traffic pool completes the rest (`complete_*`) before a model is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub aircraft_type: String,
    pub flight_kind: FlightKind,
    pub runway_preference: Option<String>,
    pub strict_preference: bool,
    pub start_position: LatLon,
    pub start_altitude_ft: f64,
    pub start_bearing_degrees: f64,
    pub start_speed_kt: f64,
    /// Zero when the flight does not start on a runway.
    pub runway_elevation_ft: f64,
    pub registration_number: u32,
    pub operator: String,
    pub origin: String,
    pub destination: String,
}

impl Descriptor {
    #[must_use]
    pub fn new(aircraft_type: impl AsRef<str>, flight_kind: FlightKind) -> Self {
        Self {
            aircraft_type: aircraft_type.as_ref().trim().to_ascii_uppercase(),
            flight_kind,
            runway_preference: None,
            strict_preference: false,
            start_position: LatLon::default(),
            start_altitude_ft: 0.0,
            start_bearing_degrees: 0.0,
            start_speed_kt: 0.0,
            runway_elevation_ft: 0.0,
            registration_number: 0,
            operator: DEFAULT_OPERATOR.to_owned(),
            origin: String::new(),
            destination: String::new(),
        }
    }

    /// Builds a descriptor from the split fields of an `A=` line, key included.
    pub fn from_fields(fields: &[String]) -> Result<Self, DescriptorError> {
        if fields.len() < 3 {
            return Err(DescriptorError::MissingFields {
                kind: fields.get(2).cloned().unwrap_or_default(),
                expected: 3,
                found: fields.len(),
            });
        }
        if fields[1].trim().is_empty() {
            return Err(DescriptorError::EmptyAircraftType);
        }

        let kind: FlightKind = fields[2].parse()?;
        let mut descriptor = Self::new(&fields[1], kind);
        let require = |expected: usize| {
            if fields.len() < expected {
                Err(DescriptorError::MissingFields {
                    kind: kind.to_string(),
                    expected,
                    found: fields.len(),
                })
            } else {
                Ok(())
            }
        };

        match kind {
            FlightKind::Runway => {
                descriptor.runway_preference = fields
                    .get(3)
                    .map(|preference| preference.trim().to_ascii_uppercase())
                    .filter(|preference| !preference.is_empty());
                descriptor.strict_preference = fields
                    .get(4)
                    .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("S"));
            }
            FlightKind::Airway => {}
            FlightKind::MsgRelative => {
                require(5)?;
                descriptor.start_altitude_ft = parse_field("altitude", &fields[3])?;
                descriptor.start_speed_kt = parse_field("speed", &fields[4])?;
            }
            FlightKind::MsgAbsolute => {
                require(8)?;
                descriptor.start_altitude_ft = parse_field("altitude", &fields[3])?;
                descriptor.start_speed_kt = parse_field("speed", &fields[4])?;
                descriptor.start_position = LatLon::new(
                    parse_field("latitude", &fields[5])?,
                    parse_field("longitude", &fields[6])?,
                )
                .map_err(|error| DescriptorError::InvalidPosition(error.to_string()))?;
                descriptor.start_bearing_degrees = parse_field("heading", &fields[7])?;
            }
        }

        Ok(descriptor)
    }

    #[must_use]
    pub fn is_msl_based(&self) -> bool {
        self.flight_kind.starts_msl_based()
    }

    /// `VX-nnnn`.
    #[must_use]
    pub fn tail_number(&self) -> String {
        format!("{TAIL_PREFIX}{:04}", self.registration_number)
    }

    /// Operator code followed by the zero-padded registration number.
    #[must_use]
    pub fn callsign(&self) -> String {
        format!("{}{:04}", self.operator, self.registration_number)
    }

    /// The registration digits double as the hex transponder code, so
    /// registration 42 transmits `000042`.
    #[must_use]
    pub fn transponder_hex(&self) -> String {
        format!("{:06}", self.registration_number % 1_000_000)
    }

    pub fn set_operator(&mut self, operator: &str) {
        let operator = operator.trim().to_ascii_uppercase();
        if !operator.is_empty() {
            self.operator = operator;
        }
    }

    /// Starts the flight on the runway threshold, at rest, aligned with it.
    pub fn complete_from_runway(&mut self, registration_number: u32, runway: &RunwayRecord) {
        self.registration_number = registration_number;
        self.start_position = runway.threshold();
        self.start_altitude_ft = runway.elevation_ft();
        self.start_bearing_degrees = runway.bearing_degrees();
        self.start_speed_kt = 0.0;
        self.runway_elevation_ft = runway.elevation_ft();
        self.origin = runway.airport().to_owned();
        self.destination = RUNWAY_DESTINATION_LABEL.to_owned();
    }

    /// Starts the flight at the segment start, already airborne.
    pub fn complete_from_airway(
        &mut self,
        registration_number: u32,
        segment: &AirwaySegment,
        altitude_ft: f64,
        speed_kt: f64,
    ) {
        self.registration_number = registration_number;
        self.start_position = segment.start().position();
        self.start_altitude_ft = altitude_ft;
        self.start_bearing_degrees = segment.bearing_degrees();
        self.start_speed_kt = speed_kt;
        self.runway_elevation_ft = 0.0;
        self.origin = segment.start().ident().to_owned();
        self.destination = AIRWAY_DESTINATION_PENDING.to_owned();
    }

    /// Records the final waypoint once the airway route is known.
    pub fn finish_on_airway(&mut self, segment: &AirwaySegment) {
        self.destination = segment.end().ident().to_owned();
    }

    /// Anchors a relative recording at a runway; altitude and speed stay as scripted.
    pub fn complete_message_relative(&mut self, registration_number: u32, runway: &RunwayRecord) {
        self.registration_number = registration_number;
        self.start_position = runway.threshold();
        self.start_bearing_degrees = runway.bearing_degrees();
        self.origin = runway.airport().to_owned();
        self.destination = MESSAGE_END_LABEL.to_owned();
    }

    pub fn complete_message_absolute(&mut self, registration_number: u32) {
        self.registration_number = registration_number;
        self.origin = MESSAGE_START_LABEL.to_owned();
        self.destination = MESSAGE_END_LABEL.to_owned();
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A={};{}", self.aircraft_type, self.flight_kind)?;
        match self.flight_kind {
            FlightKind::Runway => {
                if let Some(preference) = &self.runway_preference {
                    write!(f, ";{preference}")?;
                    if self.strict_preference {
                        f.write_str(";S")?;
                    }
                }
                Ok(())
            }
            FlightKind::Airway => Ok(()),
            FlightKind::MsgRelative => write!(
                f,
                ";{:.0};{:.4}",
                self.start_altitude_ft, self.start_speed_kt
            ),
            FlightKind::MsgAbsolute => write!(
                f,
                ";{:.0};{:.4};{:.6};{:.6};{:.1}",
                self.start_altitude_ft,
                self.start_speed_kt,
                self.start_position.latitude(),
                self.start_position.longitude(),
                self.start_bearing_degrees
            ),
        }
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f64, DescriptorError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| DescriptorError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}
