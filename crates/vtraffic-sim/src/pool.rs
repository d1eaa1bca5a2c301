use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use vtraffic_core::{LatLon, TimestampUtc};
use vtraffic_geo::distance_nm;
use vtraffic_log::{log_debug, log_info, log_warn, SharedLogger};
use vtraffic_routes::{AirwayLayer, AirwaySegment, AirwayTable, RouteCatalog, RunwayTable};
use vtraffic_script::{Descriptor, FlightKind, ScriptLibrary};

use crate::aircraft::{FlightRules, VirtualAircraft};
use crate::fleet::{random_jet_type, random_operator};
use crate::{PerformanceEnvelope, PoolError};

pub const MIN_IFR_ALTITUDE_FT: i32 = 3_000;
pub const MAX_IFR_ALTITUDE_FT: i32 = 45_000;
pub const MAX_REGISTRATION_NUMBER: u32 = 9_999;

/// One in this many undecided creations becomes VFR.
const VFR_ODDS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolConfig {
    pub total_aircraft: usize,
    pub vfr_aircraft: usize,
    /// Airways are selected within this radius, runways within half of it.
    pub range_nm: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            total_aircraft: 20,
            vfr_aircraft: 5,
            range_nm: 100.0,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.total_aircraft == 0 {
            return Err(PoolError::ZeroTotalAircraft);
        }
        if self.vfr_aircraft > self.total_aircraft {
            return Err(PoolError::VfrExceedsTotal {
                vfr: self.vfr_aircraft,
                total: self.total_aircraft,
            });
        }
        if !self.range_nm.is_finite() || self.range_nm <= 0.0 {
            return Err(PoolError::InvalidRange {
                range_nm: self.range_nm,
            });
        }
        Ok(())
    }
}

/// The set of live aircraft around a moving reference position.
pub struct TrafficPool<R> {
    config: PoolConfig,
    catalog: Arc<RouteCatalog>,
    library: Arc<ScriptLibrary>,
    reference: LatLon,
    airways: AirwayTable,
    runways: RunwayTable,
    aircraft: Vec<VirtualAircraft>,
    ifr_count: usize,
    vfr_count: usize,
    next_registration: u32,
    rng: R,
    logger: SharedLogger,
}

impl<R: Rng> TrafficPool<R> {
    pub fn new(
        config: PoolConfig,
        catalog: Arc<RouteCatalog>,
        library: Arc<ScriptLibrary>,
        reference: LatLon,
        rng: R,
        logger: SharedLogger,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        let mut pool = Self {
            config,
            catalog,
            library,
            reference,
            airways: AirwayTable::new(),
            runways: RunwayTable::new(),
            aircraft: Vec::new(),
            ifr_count: 0,
            vfr_count: 0,
            next_registration: 1,
            rng,
            logger,
        };
        pool.select_around(reference);
        Ok(pool)
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    #[must_use]
    pub fn reference(&self) -> LatLon {
        self.reference
    }

    #[must_use]
    pub fn aircraft(&self) -> &[VirtualAircraft] {
        &self.aircraft
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    #[must_use]
    pub fn ifr_count(&self) -> usize {
        self.ifr_count
    }

    #[must_use]
    pub fn vfr_count(&self) -> usize {
        self.vfr_count
    }

    #[must_use]
    pub fn selected_airways(&self) -> &AirwayTable {
        &self.airways
    }

    #[must_use]
    pub fn selected_runways(&self) -> &RunwayTable {
        &self.runways
    }

    /// Reselects airways and runways once `position` drifts more than a
    /// quarter of the range from the last reference. Returns whether it did.
    pub fn refresh_selection(&mut self, position: LatLon) -> bool {
        if distance_nm(&self.reference, &position) <= self.config.range_nm / 4.0 {
            return false;
        }
        self.select_around(position);
        true
    }

    /// Retires finished aircraft, continuing airway flights where a next
    /// segment exists, then tops the pool up to its target size.
    pub fn regenerate(&mut self, now: TimestampUtc) {
        self.retire(now);
        self.replenish(now);
    }

    /// Advances every live aircraft to `now`.
    pub fn update(&mut self, now: TimestampUtc) {
        for aircraft in &mut self.aircraft {
            aircraft.advance_to(now);
        }
    }

    fn select_around(&mut self, position: LatLon) {
        self.reference = position;
        self.airways = self
            .catalog
            .airways
            .select_within(&position, self.config.range_nm);
        self.runways = self
            .catalog
            .runways
            .select_within(&position, self.config.range_nm / 2.0);
        log_info!(
            self.logger,
            "selected {} airways and {} runways around {}",
            self.airways.len(),
            self.runways.len(),
            position
        );
    }

    fn retire(&mut self, now: TimestampUtc) {
        for index in (0..self.aircraft.len()).rev() {
            if !self.aircraft[index].is_out() {
                continue;
            }

            let aircraft = &self.aircraft[index];
            let next_segment = match (aircraft.rules(), aircraft.route()) {
                (FlightRules::Ifr, Some(route)) => {
                    self.airways.continuation(route, &mut self.rng).cloned()
                }
                _ => None,
            };

            let continued = next_segment.and_then(|segment| {
                match aircraft.continue_on(&segment, now, self.logger.clone()) {
                    Ok(next) => Some(next),
                    Err(error) => {
                        log_warn!(self.logger, "cannot continue {}: {error}", segment.key());
                        None
                    }
                }
            });

            match continued {
                Some(next) => {
                    log_debug!(
                        self.logger,
                        "{} continues {} -> {}",
                        next.identity().callsign,
                        next.identity().origin,
                        next.identity().destination
                    );
                    self.aircraft[index] = next;
                }
                None => {
                    let retired = self.aircraft.remove(index);
                    match retired.rules() {
                        FlightRules::Ifr => self.ifr_count = self.ifr_count.saturating_sub(1),
                        FlightRules::Vfr => self.vfr_count = self.vfr_count.saturating_sub(1),
                    }
                    log_debug!(
                        self.logger,
                        "retired {} {}",
                        retired.rules().as_str(),
                        retired.identity().callsign
                    );
                }
            }
        }
    }

    fn replenish(&mut self, now: TimestampUtc) {
        while self.aircraft.len() < self.config.total_aircraft {
            let rules = self.choose_rules();
            let created = match rules {
                FlightRules::Ifr => self.create_ifr(now),
                FlightRules::Vfr => self.create_vfr(now),
            };
            let Some(aircraft) = created else {
                log_debug!(
                    self.logger,
                    "no {} flight available this tick, {} of {} live",
                    rules.as_str(),
                    self.aircraft.len(),
                    self.config.total_aircraft
                );
                break;
            };

            match rules {
                FlightRules::Ifr => self.ifr_count += 1,
                FlightRules::Vfr => self.vfr_count += 1,
            }
            log_debug!(
                self.logger,
                "created {} {} ({}) {} -> {}",
                rules.as_str(),
                aircraft.identity().callsign,
                aircraft.identity().aircraft_type,
                aircraft.identity().origin,
                aircraft.identity().destination
            );
            self.aircraft.push(aircraft);
        }
    }

    fn choose_rules(&mut self) -> FlightRules {
        let vfr_quota = self.config.vfr_aircraft;
        let ifr_quota = self.config.total_aircraft.saturating_sub(vfr_quota);
        if self.vfr_count >= vfr_quota {
            FlightRules::Ifr
        } else if self.ifr_count >= ifr_quota {
            FlightRules::Vfr
        } else if self.rng.gen_range(0..VFR_ODDS) > 0 {
            FlightRules::Ifr
        } else {
            FlightRules::Vfr
        }
    }

    /// Hands out registrations in sequence, wrapping within
    /// `1..=MAX_REGISTRATION_NUMBER` and skipping numbers still flying.
    fn registration_number(&mut self) -> u32 {
        for _ in 0..MAX_REGISTRATION_NUMBER {
            let candidate = self.take_registration();
            let in_use = self
                .aircraft
                .iter()
                .any(|aircraft| aircraft.identity().registration_number == candidate);
            if !in_use {
                return candidate;
            }
        }
        // Every number is live; a duplicate beats no aircraft.
        self.take_registration()
    }

    fn take_registration(&mut self) -> u32 {
        let number = self.next_registration;
        self.next_registration = number % MAX_REGISTRATION_NUMBER + 1;
        number
    }

    fn create_ifr(&mut self, now: TimestampUtc) -> Option<VirtualAircraft> {
        let segment = self.airways.random(&mut self.rng)?.clone();
        let altitude_ft = self.ifr_altitude(&segment);
        let speed_kt = self.ifr_speed(segment.layer());
        let registration = self.registration_number();

        let mut descriptor = Descriptor::new(random_jet_type(&mut self.rng), FlightKind::Airway);
        descriptor.set_operator(random_operator(&mut self.rng));
        descriptor.complete_from_airway(registration, &segment, altitude_ft, speed_kt);
        descriptor.finish_on_airway(&segment);

        match VirtualAircraft::on_airway(descriptor, &segment, now, self.logger.clone()) {
            Ok(aircraft) => Some(aircraft),
            Err(error) => {
                log_warn!(self.logger, "cannot fly {}: {error}", segment.key());
                None
            }
        }
    }

    /// Random altitude inside the segment band, capped to 3000..45000 ft and
    /// snapped to 100 ft.
    fn ifr_altitude(&mut self, segment: &AirwaySegment) -> f64 {
        let low = segment.base_ft().max(MIN_IFR_ALTITUDE_FT);
        let high = segment.top_ft().min(MAX_IFR_ALTITUDE_FT);
        let altitude = if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        };
        (f64::from(altitude) / 100.0).round() * 100.0
    }

    fn ifr_speed(&mut self, layer: AirwayLayer) -> f64 {
        let speed: u32 = match layer {
            AirwayLayer::Low => self.rng.gen_range(160..210),
            AirwayLayer::High => self.rng.gen_range(250..420),
            AirwayLayer::Other(_) => 180,
        };
        f64::from(speed)
    }

    fn create_vfr(&mut self, now: TimestampUtc) -> Option<VirtualAircraft> {
        let mut script = self.library.scripts().choose(&mut self.rng)?.clone();
        let registration = self.registration_number();
        let kind = script.descriptor().flight_kind;

        match kind {
            FlightKind::Runway => {
                let preference = script.descriptor().runway_preference.clone();
                let strict = script.descriptor().strict_preference;
                let resolved = preference
                    .as_deref()
                    .and_then(|preference| self.runways.resolve(preference, &mut self.rng));
                let runway = match resolved {
                    Some(runway) => runway,
                    None if strict && preference.is_some() => {
                        log_debug!(
                            self.logger,
                            "strict runway {} not in range",
                            preference.as_deref().unwrap_or_default()
                        );
                        return None;
                    }
                    None => self.runways.random(&mut self.rng)?,
                };
                script
                    .descriptor_mut()
                    .complete_from_runway(registration, runway);
            }
            FlightKind::Airway => {
                log_warn!(
                    self.logger,
                    "airway script for {} cannot fly as VFR",
                    script.descriptor().aircraft_type
                );
                return None;
            }
            FlightKind::MsgRelative => {
                let runway = self.runways.random(&mut self.rng)?;
                script
                    .descriptor_mut()
                    .complete_message_relative(registration, runway);
            }
            FlightKind::MsgAbsolute => {
                let start = script.descriptor().start_position;
                if distance_nm(&self.reference, &start) > self.config.range_nm {
                    return None;
                }
                script
                    .descriptor_mut()
                    .complete_message_absolute(registration);
            }
        }

        let envelope = PerformanceEnvelope::for_aircraft_type(&script.descriptor().aircraft_type);
        Some(VirtualAircraft::new(
            &script,
            FlightRules::Vfr,
            None,
            envelope,
            now,
            self.logger.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vtraffic_core::{LatLon, TimestampUtc};
    use vtraffic_log::noop;
    use vtraffic_routes::{
        AirwayLayer, AirwaySegment, AirwayTable, RouteCatalog, RunwayRecord, RunwayTable, Waypoint,
    };
    use vtraffic_script::{Script, ScriptLibrary};

    use std::collections::HashSet;

    use super::{PoolConfig, TrafficPool, MAX_REGISTRATION_NUMBER};
    use crate::{FlightRules, PoolError};

    fn position(latitude: f64, longitude: f64) -> LatLon {
        LatLon::new(latitude, longitude).expect("valid position")
    }

    fn catalog() -> RouteCatalog {
        let waypoint =
            |ident: &str, lat: f64, lon: f64| Waypoint::new(ident, "LS", position(lat, lon)).expect("waypoint");
        let mut airways = AirwayTable::new();
        airways.insert(
            AirwaySegment::new(
                waypoint("GERSA", 47.0, 8.0),
                waypoint("TRASA", 47.2, 8.4),
                AirwayLayer::Low,
                5_000,
                19_500,
                "L613",
            )
            .expect("segment"),
        );

        let mut runways = RunwayTable::new();
        runways.insert(
            RunwayRecord::new(
                "LSZH",
                14,
                "",
                1_416.0,
                position(47.4819, 8.5368),
                position(47.4603, 8.5617),
            )
            .expect("runway"),
        );
        RouteCatalog::new(airways, runways)
    }

    fn library(text: &str) -> ScriptLibrary {
        ScriptLibrary::from_scripts(vec![Script::parse(text).expect("script parses")])
    }

    fn pool(config: PoolConfig, library: ScriptLibrary, seed: u64) -> TrafficPool<ChaCha8Rng> {
        TrafficPool::new(
            config,
            Arc::new(catalog()),
            Arc::new(library),
            position(47.3, 8.4),
            ChaCha8Rng::seed_from_u64(seed),
            noop(),
        )
        .expect("valid pool")
    }

    #[test]
    fn config_rejects_impossible_quotas() {
        let config = PoolConfig {
            total_aircraft: 2,
            vfr_aircraft: 3,
            range_nm: 50.0,
        };
        assert_eq!(
            config.validate(),
            Err(PoolError::VfrExceedsTotal { vfr: 3, total: 2 })
        );
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn regenerate_fills_to_target_with_ifr_altitudes_on_100ft() {
        let config = PoolConfig {
            total_aircraft: 6,
            vfr_aircraft: 0,
            range_nm: 100.0,
        };
        let mut pool = pool(config, ScriptLibrary::default(), 7);
        pool.regenerate(TimestampUtc::from_unix_seconds(100));

        assert_eq!(pool.len(), 6);
        assert_eq!(pool.ifr_count(), 6);
        for aircraft in pool.aircraft() {
            assert_eq!(aircraft.rules(), FlightRules::Ifr);
            let telemetry = aircraft.telemetry();
            assert!((5_000.0..=19_500.0).contains(&telemetry.altitude_ft));
            assert_eq!(telemetry.altitude_ft % 100.0, 0.0);
            assert!((160.0..210.0).contains(&telemetry.ground_speed_kt));
            assert_eq!(aircraft.identity().origin, "GERSA");
            assert_eq!(aircraft.identity().destination, "TRASA");
        }
    }

    #[test]
    fn live_aircraft_never_share_a_hex_id() {
        let config = PoolConfig {
            total_aircraft: 120,
            vfr_aircraft: 20,
            range_nm: 100.0,
        };
        for seed in 0..20 {
            let mut pool = pool(config, library("A=C172;Runway;LSZH\nS=70;3;1\nD=2"), seed);
            pool.regenerate(TimestampUtc::from_unix_seconds(100));
            assert!(!pool.is_empty());

            let hex_ids: HashSet<&str> = pool
                .aircraft()
                .iter()
                .map(|aircraft| aircraft.identity().hex_id.as_str())
                .collect();
            assert_eq!(hex_ids.len(), pool.len(), "seed {seed}");
        }
    }

    #[test]
    fn registrations_wrap_and_skip_numbers_still_flying() {
        let config = PoolConfig {
            total_aircraft: 3,
            vfr_aircraft: 0,
            range_nm: 100.0,
        };
        let mut pool = pool(config, ScriptLibrary::default(), 3);
        pool.regenerate(TimestampUtc::from_unix_seconds(100));
        let live: Vec<u32> = pool
            .aircraft()
            .iter()
            .map(|aircraft| aircraft.identity().registration_number)
            .collect();
        assert_eq!(live, vec![1, 2, 3]);

        pool.next_registration = MAX_REGISTRATION_NUMBER;
        assert_eq!(pool.registration_number(), MAX_REGISTRATION_NUMBER);
        assert_eq!(pool.registration_number(), 4);
        assert_eq!(pool.aircraft()[1].identity().hex_id, "000002");
    }

    #[test]
    fn strict_preference_outside_selection_creates_nothing() {
        let config = PoolConfig {
            total_aircraft: 3,
            vfr_aircraft: 3,
            range_nm: 100.0,
        };
        let mut pool = pool(config, library("A=C172;Runway;LFSB;S\nD=2"), 11);
        pool.regenerate(TimestampUtc::from_unix_seconds(100));
        assert!(pool.is_empty());
    }

    #[test]
    fn loose_preference_falls_back_to_a_selected_runway() {
        let config = PoolConfig {
            total_aircraft: 2,
            vfr_aircraft: 2,
            range_nm: 100.0,
        };
        let mut pool = pool(config, library("A=C172;Runway;LFSB\nS=70;3;1\nD=2"), 11);
        pool.regenerate(TimestampUtc::from_unix_seconds(100));

        assert_eq!(pool.vfr_count(), 2);
        let aircraft = &pool.aircraft()[0];
        assert_eq!(aircraft.identity().origin, "LSZH");
        assert_eq!(aircraft.identity().destination, "VFR->");
        assert_eq!(
            aircraft.model().envelope(),
            &crate::PerformanceEnvelope::GENERAL_AVIATION
        );
    }

    #[test]
    fn distant_absolute_recording_is_not_flown() {
        let config = PoolConfig {
            total_aircraft: 1,
            vfr_aircraft: 1,
            range_nm: 50.0,
        };
        let mut pool = pool(
            config,
            library("A=PC12;MsgAbsolute;9000;200;51.47;-0.45;270\nD=5"),
            5,
        );
        pool.regenerate(TimestampUtc::from_unix_seconds(100));
        assert!(pool.is_empty());
    }

    #[test]
    fn selection_follows_the_reference_after_a_quarter_range() {
        let mut pool = pool(PoolConfig::default(), ScriptLibrary::default(), 1);
        assert_eq!(pool.selected_runways().len(), 1);

        assert!(!pool.refresh_selection(position(47.5, 8.4)));
        assert!(pool.refresh_selection(position(52.0, 0.0)));
        assert!(pool.selected_airways().is_empty());
        assert!(pool.selected_runways().is_empty());
    }
}
