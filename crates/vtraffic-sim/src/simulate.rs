use rand::Rng;
use vtraffic_core::TimestampUtc;
use vtraffic_log::{log_info, SharedLogger};
use vtraffic_routes::{RunwayRecord, RunwayTable};
use vtraffic_script::{FlightKind, Script};

use crate::model::{KinematicModel, Telemetry};
use crate::{PerformanceEnvelope, SimulationError};

pub const DEFAULT_SIMULATION_STEP_SECONDS: f64 = 2.0;
pub const DEFAULT_MAX_SIMULATION_STEPS: usize = 43_200;

/// Registration given to a script flown on its own.
const SIMULATION_REGISTRATION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub step_seconds: f64,
    pub max_steps: usize,
    pub start: TimestampUtc,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_SIMULATION_STEP_SECONDS,
            max_steps: DEFAULT_MAX_SIMULATION_STEPS,
            start: TimestampUtc::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrack {
    /// Start pose followed by one point per step.
    pub points: Vec<Telemetry>,
    /// False when the step limit cut the flight short.
    pub finished: bool,
}

/// Completes a library script's descriptor so it can be flown on its own.
///
/// `runway` overrides the script's runway preference; either is resolved
/// against `runways` like the traffic pool does.
pub fn anchor_script<R: Rng + ?Sized>(
    script: &Script,
    runways: &RunwayTable,
    runway: Option<&str>,
    rng: &mut R,
) -> Result<Script, SimulationError> {
    let mut anchored = script.clone();
    let kind = script.descriptor().flight_kind;

    match kind {
        FlightKind::Runway => {
            let record = resolve_runway(script, runways, runway, rng)?;
            anchored
                .descriptor_mut()
                .complete_from_runway(SIMULATION_REGISTRATION, record);
        }
        FlightKind::MsgRelative => {
            let record = resolve_runway(script, runways, runway, rng)?;
            anchored
                .descriptor_mut()
                .complete_message_relative(SIMULATION_REGISTRATION, record);
        }
        FlightKind::MsgAbsolute => anchored
            .descriptor_mut()
            .complete_message_absolute(SIMULATION_REGISTRATION),
        FlightKind::Airway => {
            return Err(SimulationError::UnsupportedKind {
                kind: kind.to_string(),
            })
        }
    }

    Ok(anchored)
}

fn resolve_runway<'a, R: Rng + ?Sized>(
    script: &Script,
    runways: &'a RunwayTable,
    runway: Option<&str>,
    rng: &mut R,
) -> Result<&'a RunwayRecord, SimulationError> {
    let preference = runway
        .map(str::to_owned)
        .or_else(|| script.descriptor().runway_preference.clone())
        .ok_or_else(|| SimulationError::MissingRunway {
            kind: script.descriptor().flight_kind.to_string(),
        })?;
    runways
        .resolve(&preference, rng)
        .ok_or(SimulationError::RunwayNotFound { preference })
}

/// Flies an anchored script at a fixed step until it is out or the step
/// limit is reached.
pub fn simulate_script(
    script: &Script,
    envelope: PerformanceEnvelope,
    settings: SimulationSettings,
    logger: SharedLogger,
) -> Result<SimulatedTrack, SimulationError> {
    if !settings.step_seconds.is_finite() || settings.step_seconds <= 0.0 {
        return Err(SimulationError::InvalidStep {
            step_seconds: settings.step_seconds,
        });
    }
    if settings.max_steps == 0 {
        return Err(SimulationError::ZeroStepLimit);
    }

    let mut model = KinematicModel::new(script, envelope, settings.start, logger.clone());
    let mut points = vec![model.telemetry()];
    while !model.is_out() && points.len() <= settings.max_steps {
        points.push(model.advance_by(settings.step_seconds));
    }

    let finished = model.is_out();
    log_info!(
        logger,
        "simulated {} for {} steps of {} s, finished: {finished}",
        script.descriptor().tail_number(),
        points.len() - 1,
        settings.step_seconds
    );
    Ok(SimulatedTrack { points, finished })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vtraffic_core::LatLon;
    use vtraffic_log::noop;
    use vtraffic_routes::{RunwayRecord, RunwayTable};
    use vtraffic_script::Script;

    use super::{anchor_script, simulate_script, SimulationSettings};
    use crate::{PerformanceEnvelope, SimulationError};

    fn runways() -> RunwayTable {
        let mut table = RunwayTable::new();
        table.insert(
            RunwayRecord::new(
                "LSZB",
                32,
                "",
                1_675.0,
                LatLon::new(46.9063, 7.5083).expect("threshold"),
                LatLon::new(46.9159, 7.4938).expect("opposite"),
            )
            .expect("runway"),
        );
        table
    }

    #[test]
    fn circuit_from_runway_finishes_at_two_second_steps() {
        let script = Script::parse(
            "A=C172;Runway;LSZB_RW32\nS=70;4\nD=0.6\nV=700;1000\nD=2\nT=-90\nD=1\nT=-90\nD=2",
        )
        .expect("script parses");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let anchored = anchor_script(&script, &runways(), None, &mut rng).expect("runway found");
        assert_eq!(anchored.descriptor().origin, "LSZB");

        let track = simulate_script(
            &anchored,
            PerformanceEnvelope::GENERAL_AVIATION,
            SimulationSettings::default(),
            noop(),
        )
        .expect("simulation runs");

        assert!(track.finished);
        assert!(track.points.len() > 10);
        assert!(!track.points[0].airborne);
        assert!(track.points.iter().any(|point| point.airborne));
        assert!(track.points.last().is_some_and(|point| point.out));
    }

    #[test]
    fn step_limit_cuts_the_track() {
        let script = Script::parse("A=B738;MsgAbsolute;30000;450;47;8;90\nD=500").expect("parse");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let anchored = anchor_script(&script, &runways(), None, &mut rng).expect("anchored");
        let settings = SimulationSettings {
            max_steps: 5,
            ..SimulationSettings::default()
        };

        let track = simulate_script(&anchored, PerformanceEnvelope::JET, settings, noop())
            .expect("simulation runs");
        assert!(!track.finished);
        assert_eq!(track.points.len(), 6);
    }

    #[test]
    fn unknown_runway_and_bad_step_are_errors() {
        let script = Script::parse("A=C172;Runway;EGLL\nD=1").expect("parse");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            anchor_script(&script, &runways(), None, &mut rng).err(),
            Some(SimulationError::RunwayNotFound {
                preference: "EGLL".to_owned()
            })
        );

        let settings = SimulationSettings {
            step_seconds: 0.0,
            ..SimulationSettings::default()
        };
        let absolute = Script::parse("A=C172;MsgAbsolute;3000;100;47;8;90\nD=1").expect("parse");
        assert_eq!(
            simulate_script(&absolute, PerformanceEnvelope::JET, settings, noop()).err(),
            Some(SimulationError::InvalidStep { step_seconds: 0.0 })
        );
    }
}
