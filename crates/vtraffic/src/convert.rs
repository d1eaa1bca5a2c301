//! Turns a recorded traffic log of one aircraft into a replayable script.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use vtraffic_core::{LatLon, TimestampUtc};
use vtraffic_geo::{distance_nm, initial_bearing_degrees};
use vtraffic_script::{Command, Descriptor, FlightKind, Script, SCRIPT_EXTENSION};
use vtraffic_sim::{fleet, PerformanceEnvelope};
use vtraffic_wire::{decode_traffic_line, TrafficReport};

use crate::ConvertError;

/// Reports slower than this are treated as standing still.
pub const MIN_MOVING_SPEED_KT: f64 = 5.0;
pub const SPEED_CHANGE_THRESHOLD_KT: f64 = 4.0;
pub const ALTITUDE_CHANGE_THRESHOLD_FT: f64 = 25.0;
/// Climb rate used when the recorded one points the wrong way.
pub const CORRECTIVE_VERTICAL_RATE_FPM: f64 = 1_200.0;
/// Recorded flights above this speed get a jet type.
pub const JET_SPEED_THRESHOLD_KT: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    /// Fly the recorded positions (`MsgAbsolute`) instead of relative legs.
    pub absolute: bool,
    /// Keep reports that claim to be on the ground.
    pub ignore_airborne: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub script: Script,
    /// Lines that decoded as traffic reports.
    pub messages: usize,
    /// Lines that did not.
    pub undecodable: usize,
}

/// Builds a script from AITFC/RTTFC lines, in recording order.
pub fn convert_recording<R: Rng + ?Sized>(
    text: &str,
    options: ConvertOptions,
    rng: &mut R,
) -> Result<Conversion, ConvertError> {
    let mut reports = Vec::new();
    let mut undecodable = 0;
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        match decode_traffic_line(line) {
            Ok((_, report)) => reports.push(report),
            Err(_) => undecodable += 1,
        }
    }

    let [first, second, ..] = reports.as_slice() else {
        return Err(ConvertError::TooFewMessages {
            found: reports.len(),
        });
    };

    let mut speed_kt = first.ground_speed_kt;
    if speed_kt <= 0.0 {
        speed_kt = derived_speed_kt(first.position, first.timestamp, second);
    }
    if !speed_kt.is_finite() || speed_kt <= 0.0 {
        return Err(ConvertError::NoSpeed);
    }

    let max_speed_kt = reports
        .iter()
        .map(|report| report.ground_speed_kt)
        .fold(speed_kt, f64::max);
    let aircraft_type = if max_speed_kt > JET_SPEED_THRESHOLD_KT {
        fleet::random_jet_type(rng)
    } else {
        fleet::random_general_aviation_type(rng)
    };
    let envelope = PerformanceEnvelope::for_aircraft_type(aircraft_type);

    let descriptor = if options.absolute {
        let mut descriptor = Descriptor::new(aircraft_type, FlightKind::MsgAbsolute);
        descriptor.start_position = first.position;
        descriptor.start_bearing_degrees = first.track_degrees;
        descriptor.start_altitude_ft = first.altitude_ft;
        descriptor.start_speed_kt = speed_kt;
        descriptor
    } else {
        let mut descriptor = Descriptor::new(aircraft_type, FlightKind::MsgRelative);
        descriptor.start_altitude_ft = first.altitude_ft;
        descriptor.start_speed_kt = speed_kt;
        descriptor
    };

    let mut state = RecordedState {
        position: first.position,
        altitude_ft: first.altitude_ft,
        speed_kt,
        vertical_rate_fpm: first.vertical_rate_fpm,
        timestamp: first.timestamp,
    };
    let mut body = Vec::new();
    for report in &reports[1..] {
        if !options.ignore_airborne && !report.airborne {
            continue;
        }
        state.follow(report, envelope, options.absolute, &mut body);
    }

    let script = Script::new(descriptor, body)?;
    Ok(Conversion {
        script,
        messages: reports.len(),
        undecodable,
    })
}

/// Converts `path` and writes the script next to it as `<path>.vsc`.
pub fn convert_recording_file<R: Rng + ?Sized>(
    path: &Path,
    options: ConvertOptions,
    rng: &mut R,
) -> Result<(PathBuf, Conversion), ConvertError> {
    let text = fs::read_to_string(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let conversion = convert_recording(&text, options, rng)?;

    let mut output = path.as_os_str().to_owned();
    output.push(".");
    output.push(SCRIPT_EXTENSION);
    let output = PathBuf::from(output);

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let header = format!(
        "# vtraffic recording converter, {} UTC unix seconds\n\
         # Route script created from: {source_name}\n\
         # Converted {} messages into {} script commands\n#\n",
        TimestampUtc::now().unix_seconds(),
        conversion.messages,
        conversion.script.len()
    );
    fs::write(&output, header + &conversion.script.to_text()).map_err(|source| {
        ConvertError::Write {
            path: output.clone(),
            source,
        }
    })?;

    Ok((output, conversion))
}

/// Last state the script was brought to.
struct RecordedState {
    position: LatLon,
    altitude_ft: f64,
    speed_kt: f64,
    vertical_rate_fpm: f64,
    timestamp: i64,
}

impl RecordedState {
    fn follow(
        &mut self,
        report: &TrafficReport,
        envelope: PerformanceEnvelope,
        absolute: bool,
        body: &mut Vec<Command>,
    ) {
        let previous_timestamp = self.timestamp;
        self.timestamp = report.timestamp;

        let mut speed_kt = report.ground_speed_kt;
        if speed_kt <= 0.0 {
            speed_kt = derived_speed_kt(self.position, previous_timestamp, report);
        }
        if speed_kt.is_nan() || speed_kt < MIN_MOVING_SPEED_KT {
            return;
        }

        if (speed_kt - self.speed_kt).abs() > SPEED_CHANGE_THRESHOLD_KT {
            body.push(Command::Speed {
                kt: speed_kt,
                accel_kt_per_sec: envelope.default_acceleration_kt_per_sec,
                immediate: false,
            });
            self.speed_kt = speed_kt;
        }

        let altitude_delta = report.altitude_ft - self.altitude_ft;
        if altitude_delta.abs() > ALTITUDE_CHANGE_THRESHOLD_FT {
            // The recorded rate belongs to the previous report and may point the other way.
            let vertical_rate = if altitude_delta * self.vertical_rate_fpm > 0.0 {
                self.vertical_rate_fpm.abs()
            } else {
                CORRECTIVE_VERTICAL_RATE_FPM
            };
            body.push(Command::Climb {
                vsi_ft_per_min: vertical_rate,
                target_alt_ft: report.altitude_ft,
            });
            self.altitude_ft = report.altitude_ft;
            self.vertical_rate_fpm = report.vertical_rate_fpm;
        }

        let rate = envelope.default_turn_rate_deg_per_sec;
        if absolute {
            body.push(Command::GoTo {
                destination: report.position,
                rate_deg_per_sec: rate,
            });
        } else {
            body.push(Command::Heading {
                target_degrees: initial_bearing_degrees(&self.position, &report.position),
                rate_deg_per_sec: rate,
            });
            body.push(Command::Distance {
                nm: distance_nm(&self.position, &report.position),
            });
        }
        self.position = report.position;
    }
}

/// Speed from the displacement since `from`; zero when no time passed.
fn derived_speed_kt(from: LatLon, from_timestamp: i64, to: &TrafficReport) -> f64 {
    let elapsed = to.timestamp - from_timestamp;
    if elapsed <= 0 {
        return 0.0;
    }
    distance_nm(&from, &to.position) * 3_600.0 / elapsed as f64
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vtraffic_script::{Command, FlightKind};
    use vtraffic_sim::fleet;

    use super::{convert_recording, ConvertOptions};
    use crate::ConvertError;

    fn approx_equal(left: f64, right: f64, tolerance: f64) {
        assert!(
            (left - right).abs() <= tolerance,
            "left={left} right={right} tolerance={tolerance}"
        );
    }

    fn line(lat: f64, lon: f64, alt: f64, vs: f64, airborne: u8, gs: f64, ts: i64) -> String {
        format!(
            "AITFC,4b1806,{lat},{lon},{alt},{vs},{airborne},90.0,{gs},SWR15T,A20N,HB-JDB,LSZH,LSGG,{ts}"
        )
    }

    #[test]
    fn relative_recording_becomes_heading_and_distance_legs() {
        let text = [
            line(47.0, 8.0, 3_000.0, 0.0, 1, 120.0, 1_000),
            line(47.0, 8.05, 3_000.0, 0.0, 1, 121.0, 1_060),
            line(47.0, 8.10, 3_500.0, 0.0, 1, 140.0, 1_120),
        ]
        .join("\n");
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let conversion =
            convert_recording(&text, ConvertOptions::default(), &mut rng).expect("converts");
        let descriptor = conversion.script.descriptor();
        assert_eq!(descriptor.flight_kind, FlightKind::MsgRelative);
        assert_eq!(descriptor.start_altitude_ft, 3_000.0);
        assert!(fleet::GENERAL_AVIATION_TYPES.contains(&descriptor.aircraft_type.as_str()));

        let body = conversion.script.body();
        assert!(matches!(body[0], Command::Heading { .. }));
        let Command::Distance { nm } = body[1] else {
            panic!("expected a distance leg, got {:?}", body[1]);
        };
        approx_equal(nm, 2.04, 0.02);
        assert!(matches!(body[2], Command::Speed { kt, .. } if kt == 140.0));
        assert!(matches!(
            body[3],
            Command::Climb { vsi_ft_per_min, target_alt_ft }
                if vsi_ft_per_min == 1_200.0 && target_alt_ft == 3_500.0
        ));
        assert_eq!(body.len(), 6);
    }

    #[test]
    fn absolute_recording_flies_to_the_recorded_positions() {
        let text = [
            line(47.0, 8.0, 30_000.0, 0.0, 1, 420.0, 1_000),
            line(47.2, 8.0, 30_000.0, 0.0, 1, 420.0, 1_100),
            line(47.4, 8.0, 30_000.0, 0.0, 0, 420.0, 1_200),
        ]
        .join("\n");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let options = ConvertOptions {
            absolute: true,
            ignore_airborne: false,
        };

        let conversion = convert_recording(&text, options, &mut rng).expect("converts");
        let descriptor = conversion.script.descriptor();
        assert_eq!(descriptor.flight_kind, FlightKind::MsgAbsolute);
        assert!(fleet::JET_TYPES.contains(&descriptor.aircraft_type.as_str()));

        let body = conversion.script.body();
        assert_eq!(body.len(), 1, "grounded report is skipped");
        assert!(matches!(
            body[0],
            Command::GoTo { destination, .. } if (destination.latitude() - 47.2).abs() < 1e-9
        ));
    }

    #[test]
    fn missing_speed_is_derived_from_the_next_report() {
        let text = [
            line(47.0, 8.0, 2_000.0, 0.0, 1, 0.0, 1_000),
            line(47.1, 8.0, 2_000.0, 0.0, 1, 0.0, 1_060),
        ]
        .join("\n");
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let conversion =
            convert_recording(&text, ConvertOptions::default(), &mut rng).expect("converts");
        // 6 nm in one minute.
        approx_equal(conversion.script.descriptor().start_speed_kt, 360.0, 1.0);
    }

    #[test]
    fn short_or_motionless_recordings_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let single = line(47.0, 8.0, 2_000.0, 0.0, 1, 100.0, 1_000);
        assert!(matches!(
            convert_recording(&format!("{single}\ngarbage\n"), ConvertOptions::default(), &mut rng),
            Err(ConvertError::TooFewMessages { found: 1 })
        ));

        let standing = [
            line(47.0, 8.0, 2_000.0, 0.0, 1, 0.0, 1_000),
            line(47.0, 8.0, 2_000.0, 0.0, 1, 0.0, 1_060),
        ]
        .join("\n");
        assert!(matches!(
            convert_recording(&standing, ConvertOptions::default(), &mut rng),
            Err(ConvertError::NoSpeed)
        ));
    }
}
