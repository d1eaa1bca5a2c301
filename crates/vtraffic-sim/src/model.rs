use std::collections::VecDeque;

use vtraffic_core::{LatLon, TimestampUtc};
use vtraffic_geo::{
    destination_point, distance_nm, initial_bearing_degrees, normalize_degrees,
    signed_angle_delta,
};
use vtraffic_log::{log_debug, log_trace, SharedLogger};
use vtraffic_script::{Command, Script};

use crate::envelope::{PerformanceEnvelope, MIN_TURN_RATE_DEG_PER_SEC};

/// Turns up to this size before a `GoTo` do not shorten the preceding leg.
pub const LEG_CORRECTION_THRESHOLD_DEGREES: f64 = 3.0;

/// Altitude margin above the runway that counts as airborne.
pub const AIRBORNE_MARGIN_FT: f64 = 10.0;

const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Pose and rates of one model at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub position: LatLon,
    pub altitude_ft: f64,
    pub vertical_rate_fpm: f64,
    pub track_degrees: f64,
    pub ground_speed_kt: f64,
    pub airborne: bool,
    pub out: bool,
    pub timestamp: TimestampUtc,
}

/// Point-kinematic flight model executing one script.
///
/// Path commands (`D`, `T`, `H`, `G`) hold the model until their leg or
/// turn is flown; `S`, `V` and `M` take effect and fall through to the next
/// command. Advancing returns a telemetry snapshot, so readers never touch
/// the ramp state.
pub struct KinematicModel {
    envelope: PerformanceEnvelope,
    tag: String,
    logger: SharedLogger,
    clock: TimestampUtc,

    altitude_msl_based: bool,
    initial_altitude_ft: f64,
    runway_elevation_ft: f64,

    position: LatLon,
    altitude_ft: f64,
    track_degrees: f64,
    ground_speed_kt: f64,

    target_speed_kt: f64,
    target_altitude_ft: f64,
    target_track_degrees: f64,

    acceleration_kt_per_sec: f64,
    vertical_rate_fpm: f64,
    turn_rate_deg_per_sec: f64,
    turn_remaining_degrees: f64,
    leg_remaining_nm: f64,

    pending: VecDeque<Command>,
    current: Command,
}

impl KinematicModel {
    /// Builds the model from its own copy of `script` and activates the first
    /// path command.
    pub fn new(
        script: &Script,
        envelope: PerformanceEnvelope,
        start: TimestampUtc,
        logger: SharedLogger,
    ) -> Self {
        let descriptor = script.descriptor();
        let track = normalize_degrees(descriptor.start_bearing_degrees);

        let mut model = Self {
            envelope,
            tag: descriptor.tail_number(),
            logger,
            clock: start,
            altitude_msl_based: descriptor.is_msl_based(),
            initial_altitude_ft: descriptor.start_altitude_ft,
            runway_elevation_ft: descriptor.runway_elevation_ft,
            position: descriptor.start_position,
            altitude_ft: descriptor.start_altitude_ft,
            track_degrees: track,
            ground_speed_kt: descriptor.start_speed_kt,
            target_speed_kt: descriptor.start_speed_kt,
            target_altitude_ft: descriptor.start_altitude_ft,
            target_track_degrees: track,
            acceleration_kt_per_sec: 0.0,
            vertical_rate_fpm: 0.0,
            turn_rate_deg_per_sec: 0.0,
            turn_remaining_degrees: 0.0,
            leg_remaining_nm: 0.0,
            pending: script.commands().into(),
            current: Command::End,
        };

        log_debug!(
            model.logger,
            "model {} starts at {} alt {:.0} ft trk {:.1}",
            model.tag,
            model.position,
            model.altitude_ft,
            model.track_degrees
        );
        model.next_segment();
        model
    }

    #[must_use]
    pub fn envelope(&self) -> &PerformanceEnvelope {
        &self.envelope
    }

    /// Model clock, the instant of the last advance.
    #[must_use]
    pub fn clock(&self) -> TimestampUtc {
        self.clock
    }

    #[must_use]
    pub fn current_command(&self) -> &Command {
        &self.current
    }

    #[must_use]
    pub fn target_speed_kt(&self) -> f64 {
        self.target_speed_kt
    }

    #[must_use]
    pub fn target_altitude_ft(&self) -> f64 {
        self.target_altitude_ft
    }

    #[must_use]
    pub fn target_track_degrees(&self) -> f64 {
        self.target_track_degrees
    }

    #[must_use]
    pub fn leg_remaining_nm(&self) -> f64 {
        self.leg_remaining_nm
    }

    #[must_use]
    pub fn turn_remaining_degrees(&self) -> f64 {
        self.turn_remaining_degrees
    }

    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.altitude_ft > self.runway_elevation_ft + AIRBORNE_MARGIN_FT
    }

    /// Finished: the script is consumed and no turn or leg remains.
    #[must_use]
    pub fn is_out(&self) -> bool {
        matches!(self.current, Command::End)
            && self.turn_remaining_degrees == 0.0
            && self.leg_remaining_nm <= 0.0
    }

    #[must_use]
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            position: self.position,
            altitude_ft: self.altitude_ft,
            vertical_rate_fpm: self.vertical_rate_fpm,
            track_degrees: self.track_degrees,
            ground_speed_kt: self.ground_speed_kt,
            airborne: self.is_airborne(),
            out: self.is_out(),
            timestamp: self.clock,
        }
    }

    /// Integrates wall-clock time elapsed since the last advance.
    pub fn advance_to(&mut self, now: TimestampUtc) -> Telemetry {
        let dt = now.seconds_since(self.clock);
        self.step(now, dt)
    }

    /// Integrates a simulated step of `dt_seconds`.
    pub fn advance_by(&mut self, dt_seconds: f64) -> Telemetry {
        let now = self.clock.add_seconds(dt_seconds.max(0.0));
        self.step(now, dt_seconds)
    }

    fn step(&mut self, now: TimestampUtc, dt: f64) -> Telemetry {
        if self.is_out() || !dt.is_finite() || dt <= 0.0 {
            return self.telemetry();
        }
        self.clock = now;

        let mut speed = self.ground_speed_kt + self.acceleration_kt_per_sec * dt;
        if (self.acceleration_kt_per_sec > 0.0 && speed > self.target_speed_kt)
            || (self.acceleration_kt_per_sec < 0.0 && speed < self.target_speed_kt)
        {
            speed = self.target_speed_kt;
            self.acceleration_kt_per_sec = 0.0;
        }

        let mut altitude = self.altitude_ft + self.vertical_rate_fpm / SECONDS_PER_MINUTE * dt;
        if (self.vertical_rate_fpm > 0.0 && altitude > self.target_altitude_ft)
            || (self.vertical_rate_fpm < 0.0 && altitude < self.target_altitude_ft)
        {
            altitude = self.target_altitude_ft;
            self.vertical_rate_fpm = 0.0;
        }

        let mut rotation = if self.turn_remaining_degrees < 0.0 {
            -self.turn_rate_deg_per_sec * dt
        } else if self.turn_remaining_degrees > 0.0 {
            self.turn_rate_deg_per_sec * dt
        } else {
            0.0
        };
        self.turn_remaining_degrees -= rotation;
        if (rotation > 0.0 && self.turn_remaining_degrees < 0.0)
            || (rotation < 0.0 && self.turn_remaining_degrees > 0.0)
        {
            rotation += self.turn_remaining_degrees;
            self.turn_remaining_degrees = 0.0;
        }

        let track = if self.turn_remaining_degrees == 0.0 {
            self.target_track_degrees
        } else {
            normalize_degrees(self.track_degrees + rotation)
        };

        let mut distance = speed / SECONDS_PER_HOUR * dt;
        if self.leg_remaining_nm > 0.0 && distance > self.leg_remaining_nm {
            distance = self.leg_remaining_nm;
        }

        // Move along the mean track of the step.
        self.position = destination_point(
            &self.position,
            distance,
            self.track_degrees + rotation / 2.0,
        );
        self.track_degrees = track;
        self.altitude_ft = altitude;
        self.ground_speed_kt = speed;
        self.leg_remaining_nm = (self.leg_remaining_nm - distance).max(0.0);

        let segment_done = match self.current {
            Command::Distance { .. } | Command::GoTo { .. } => self.leg_remaining_nm <= 0.0,
            Command::Turn { .. } | Command::Heading { .. } => self.turn_remaining_degrees == 0.0,
            _ => false,
        };
        if segment_done {
            self.next_segment();
        } else if self.current.is_blocking() && self.ground_speed_kt <= 0.0 {
            self.abandon_segment();
        }

        self.telemetry()
    }

    fn next_segment(&mut self) {
        while let Some(command) = self.pending.pop_front() {
            log_trace!(self.logger, "model {} activates {}", self.tag, command.key());
            match command {
                Command::Descriptor(_) => {}
                Command::Distance { nm } => {
                    self.leg_remaining_nm = nm;
                    self.current = command;
                    self.apply_leg_correction();
                    return;
                }
                Command::Turn {
                    delta_degrees,
                    rate_deg_per_sec,
                } => {
                    self.set_turn(delta_degrees, rate_deg_per_sec);
                    self.current = command;
                    return;
                }
                Command::Heading {
                    target_degrees,
                    rate_deg_per_sec,
                } => {
                    self.set_track(target_degrees, rate_deg_per_sec);
                    self.current = command;
                    return;
                }
                Command::GoTo { destination, .. } => {
                    self.set_destination(&destination);
                    self.current = command;
                    self.apply_leg_correction();
                    return;
                }
                Command::Speed {
                    kt,
                    accel_kt_per_sec,
                    immediate,
                } => self.set_speed(kt, accel_kt_per_sec, immediate),
                Command::Climb {
                    vsi_ft_per_min,
                    target_alt_ft,
                } => self.set_altitude(vsi_ft_per_min, target_alt_ft),
                Command::AltitudeBase {
                    msl_based,
                    absolute_alt_ft,
                } => self.set_altitude_base(msl_based, absolute_alt_ft),
                Command::End => {
                    self.current = command;
                    return;
                }
            }
        }
    }

    /// A standing aircraft would never finish its leg or turn.
    fn abandon_segment(&mut self) {
        log_debug!(
            self.logger,
            "model {} abandons {} at zero speed",
            self.tag,
            self.current.key()
        );
        self.leg_remaining_nm = 0.0;
        self.turn_remaining_degrees = 0.0;
        self.target_track_degrees = self.track_degrees;
        self.next_segment();
    }

    fn set_speed(&mut self, speed_kt: f64, acceleration_kt_per_sec: f64, immediate: bool) {
        let speed = self.envelope.clamp_speed(speed_kt);
        let acceleration = self.envelope.clamp_acceleration(acceleration_kt_per_sec);

        self.target_speed_kt = speed;
        if speed > self.ground_speed_kt {
            self.acceleration_kt_per_sec = acceleration;
        } else if speed < self.ground_speed_kt {
            self.acceleration_kt_per_sec = -acceleration;
        }
        if immediate {
            self.ground_speed_kt = speed;
        }
    }

    fn set_altitude(&mut self, vertical_rate_fpm: f64, altitude_ft: f64) {
        let target = if self.altitude_msl_based {
            altitude_ft
        } else {
            self.initial_altitude_ft + altitude_ft
        };
        let rate = self.envelope.clamp_vertical_rate(vertical_rate_fpm);
        let target = self.envelope.clamp_altitude(target);

        self.target_altitude_ft = target;
        if target > self.altitude_ft {
            self.vertical_rate_fpm = rate;
        } else if target < self.altitude_ft {
            self.vertical_rate_fpm = -rate;
        }
    }

    fn set_altitude_base(&mut self, msl_based: bool, absolute_alt_ft: Option<f64>) {
        self.altitude_msl_based = msl_based;
        if let Some(altitude) = absolute_alt_ft.filter(|altitude| msl_based && *altitude > 0.0) {
            self.target_altitude_ft = altitude;
            self.altitude_ft = altitude;
            self.vertical_rate_fpm = 0.0;
        }
    }

    fn set_turn(&mut self, angle_degrees: f64, rate_deg_per_sec: f64) {
        let angle = if angle_degrees.abs() > 360.0 {
            normalize_degrees(angle_degrees)
        } else {
            angle_degrees
        };
        self.turn_remaining_degrees = angle;
        self.target_track_degrees = normalize_degrees(self.target_track_degrees + angle);
        self.turn_rate_deg_per_sec = self.envelope.clamp_turn_rate(rate_deg_per_sec);
    }

    fn set_track(&mut self, bearing_degrees: f64, rate_deg_per_sec: f64) {
        let bearing = bearing_degrees.clamp(0.0, 360.0);
        self.turn_remaining_degrees = signed_angle_delta(self.track_degrees, bearing);
        self.target_track_degrees = normalize_degrees(bearing);
        self.turn_rate_deg_per_sec = self.envelope.clamp_turn_rate(rate_deg_per_sec);
    }

    /// Aims once at `destination`; the turn onto it uses the fastest rate.
    fn set_destination(&mut self, destination: &LatLon) {
        let bearing = initial_bearing_degrees(&self.position, destination);
        let distance = distance_nm(&self.position, destination);
        self.set_track(bearing, self.envelope.clamp_turn_rate(f64::MAX));
        self.leg_remaining_nm = distance;
    }

    /// Shortens the active leg by the distance flown while turning onto an
    /// upcoming `GoTo`.
    fn apply_leg_correction(&mut self) {
        let Some(Command::GoTo {
            destination,
            rate_deg_per_sec,
        }) = self.pending.front()
        else {
            return;
        };
        if self.leg_remaining_nm <= 0.0 {
            return;
        }

        let leg_end = destination_point(&self.position, self.leg_remaining_nm, self.track_degrees);
        let next_track = initial_bearing_degrees(&leg_end, destination);
        let turn = signed_angle_delta(self.track_degrees, next_track).abs();
        if turn <= LEG_CORRECTION_THRESHOLD_DEGREES {
            return;
        }

        let turn_seconds = turn / rate_deg_per_sec.max(MIN_TURN_RATE_DEG_PER_SEC);
        let cut_nm = turn_seconds * self.ground_speed_kt / SECONDS_PER_HOUR;
        log_trace!(
            self.logger,
            "model {} cuts {:.2} nm before a {:.0} degree turn",
            self.tag,
            cut_nm,
            turn
        );
        self.leg_remaining_nm -= cut_nm;
    }
}
