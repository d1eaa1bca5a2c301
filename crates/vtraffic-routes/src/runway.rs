use std::collections::BTreeMap;

use rand::seq::IteratorRandom;
use rand::Rng;
use vtraffic_core::LatLon;
use vtraffic_geo::{distance_nm, initial_bearing_degrees};

use crate::RecordError;

/// One runway direction, threshold to opposite threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayRecord {
    airport: String,
    number: u8,
    side: String,
    elevation_ft: f64,
    threshold: LatLon,
    opposite: LatLon,
    runway_id: String,
    key: String,
    bearing_degrees: f64,
}

impl RunwayRecord {
    pub fn new(
        airport: impl AsRef<str>,
        number: u8,
        side: impl AsRef<str>,
        elevation_ft: f64,
        threshold: LatLon,
        opposite: LatLon,
    ) -> Result<Self, RecordError> {
        let airport = airport.as_ref().trim().to_ascii_uppercase();
        if airport.is_empty() {
            return Err(RecordError::EmptyField { field: "airport" });
        }
        if !(1..=36).contains(&number) {
            return Err(RecordError::InvalidRunwayNumber { number });
        }
        if !elevation_ft.is_finite() {
            return Err(RecordError::InvalidNumber {
                field: "elevation",
                value: elevation_ft.to_string(),
            });
        }
        if threshold == opposite {
            return Err(RecordError::DegenerateRunway);
        }

        let side = side.as_ref().trim().to_ascii_uppercase();
        let runway_id = format!("RW{number:02}{side}");
        let key = format!("{airport}_{runway_id}");

        Ok(Self {
            bearing_degrees: initial_bearing_degrees(&threshold, &opposite),
            airport,
            number,
            side,
            elevation_ft,
            threshold,
            opposite,
            runway_id,
            key,
        })
    }

    #[must_use]
    pub fn airport(&self) -> &str {
        &self.airport
    }

    #[must_use]
    pub fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub fn side(&self) -> &str {
        &self.side
    }

    #[must_use]
    pub fn elevation_ft(&self) -> f64 {
        self.elevation_ft
    }

    #[must_use]
    pub fn threshold(&self) -> LatLon {
        self.threshold
    }

    #[must_use]
    pub fn opposite(&self) -> LatLon {
        self.opposite
    }

    /// `RWnnS`, e.g. `RW14R`.
    #[must_use]
    pub fn runway_id(&self) -> &str {
        &self.runway_id
    }

    /// `ICAO_RWnnS`, e.g. `LSZH_RW14R`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn bearing_degrees(&self) -> f64 {
        self.bearing_degrees
    }

    #[must_use]
    pub fn length_nm(&self) -> f64 {
        distance_nm(&self.threshold, &self.opposite)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunwayTable {
    runways: BTreeMap<String, RunwayRecord>,
}

impl RunwayTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a runway unless its key is already present.
    pub fn insert(&mut self, runway: RunwayRecord) -> bool {
        if self.runways.contains_key(runway.key()) {
            return false;
        }
        self.runways.insert(runway.key.clone(), runway);
        true
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RunwayRecord> {
        self.runways.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runways.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runways.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunwayRecord> {
        self.runways.values()
    }

    /// Subset of runways whose threshold lies within `radius_nm` of `center`.
    #[must_use]
    pub fn select_within(&self, center: &LatLon, radius_nm: f64) -> Self {
        let runways = self
            .runways
            .iter()
            .filter(|(_, runway)| distance_nm(center, &runway.threshold) <= radius_nm)
            .map(|(key, runway)| (key.clone(), runway.clone()))
            .collect();
        Self { runways }
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&RunwayRecord> {
        self.runways.values().choose(rng)
    }

    /// Resolves a script's runway preference.
    ///
    /// An exact key wins. Otherwise the preference is treated as a key prefix
    /// (`LSZH` or `LSZH_RW14`) and one matching runway is picked at random.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        preference: &str,
        rng: &mut R,
    ) -> Option<&RunwayRecord> {
        let preference = preference.trim().to_ascii_uppercase();
        if preference.is_empty() {
            return None;
        }
        if let Some(exact) = self.runways.get(&preference) {
            return Some(exact);
        }

        self.runways
            .range(preference.clone()..)
            .take_while(|(key, _)| key.starts_with(&preference))
            .map(|(_, runway)| runway)
            .choose(rng)
    }
}
