use vtraffic_core::TimestampUtc;
use vtraffic_log::SharedLogger;
use vtraffic_routes::AirwaySegment;
use vtraffic_script::{Command, Descriptor, FlightKind, Script, ScriptError};

use crate::model::{KinematicModel, Telemetry};
use crate::PerformanceEnvelope;

/// Airway-routed enroute traffic or runway/script based traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightRules {
    Ifr,
    Vfr,
}

impl FlightRules {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ifr => "IFR",
            Self::Vfr => "VFR",
        }
    }
}

/// Who the aircraft claims to be on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AircraftIdentity {
    pub registration_number: u32,
    pub tail: String,
    pub hex_id: String,
    pub aircraft_type: String,
    pub operator: String,
    pub callsign: String,
    pub origin: String,
    pub destination: String,
}

impl AircraftIdentity {
    #[must_use]
    pub fn from_descriptor(descriptor: &Descriptor) -> Self {
        Self {
            registration_number: descriptor.registration_number,
            tail: descriptor.tail_number(),
            hex_id: descriptor.transponder_hex(),
            aircraft_type: descriptor.aircraft_type.clone(),
            operator: descriptor.operator.clone(),
            callsign: descriptor.callsign(),
            origin: descriptor.origin.clone(),
            destination: descriptor.destination.clone(),
        }
    }
}

/// One live aircraft: identity, a model flying its script and the latest
/// telemetry.
pub struct VirtualAircraft {
    identity: AircraftIdentity,
    rules: FlightRules,
    route: Option<AirwaySegment>,
    model: KinematicModel,
    telemetry: Telemetry,
}

impl VirtualAircraft {
    /// `script` must carry a completed descriptor.
    pub fn new(
        script: &Script,
        rules: FlightRules,
        route: Option<AirwaySegment>,
        envelope: PerformanceEnvelope,
        start: TimestampUtc,
        logger: SharedLogger,
    ) -> Self {
        let model = KinematicModel::new(script, envelope, start, logger);
        let telemetry = model.telemetry();
        Self {
            identity: AircraftIdentity::from_descriptor(script.descriptor()),
            rules,
            route,
            model,
            telemetry,
        }
    }

    /// Airway flight flying `segment` from its start at the given altitude
    /// and speed.
    pub fn on_airway(
        descriptor: Descriptor,
        segment: &AirwaySegment,
        start: TimestampUtc,
        logger: SharedLogger,
    ) -> Result<Self, ScriptError> {
        let script = Script::new(
            descriptor,
            vec![Command::Distance {
                nm: segment.length_nm(),
            }],
        )?;
        Ok(Self::new(
            &script,
            FlightRules::Ifr,
            Some(segment.clone()),
            PerformanceEnvelope::JET,
            start,
            logger,
        ))
    }

    /// The same aircraft, continuing on `segment` from where it is now.
    pub fn continue_on(
        &self,
        segment: &AirwaySegment,
        start: TimestampUtc,
        logger: SharedLogger,
    ) -> Result<Self, ScriptError> {
        let mut descriptor = Descriptor::new(&self.identity.aircraft_type, FlightKind::Airway);
        descriptor.set_operator(&self.identity.operator);
        descriptor.complete_from_airway(
            self.identity.registration_number,
            segment,
            self.telemetry.altitude_ft,
            self.telemetry.ground_speed_kt,
        );
        descriptor.finish_on_airway(segment);
        Self::on_airway(descriptor, segment, start, logger)
    }

    #[must_use]
    pub fn identity(&self) -> &AircraftIdentity {
        &self.identity
    }

    #[must_use]
    pub fn rules(&self) -> FlightRules {
        self.rules
    }

    #[must_use]
    pub fn route(&self) -> Option<&AirwaySegment> {
        self.route.as_ref()
    }

    #[must_use]
    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn is_out(&self) -> bool {
        self.telemetry.out
    }

    pub fn advance_to(&mut self, now: TimestampUtc) -> &Telemetry {
        self.telemetry = self.model.advance_to(now);
        &self.telemetry
    }

    pub fn advance_by(&mut self, dt_seconds: f64) -> &Telemetry {
        self.telemetry = self.model.advance_by(dt_seconds);
        &self.telemetry
    }
}
