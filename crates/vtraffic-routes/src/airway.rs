use std::collections::BTreeMap;
use std::fmt;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use vtraffic_core::LatLon;
use vtraffic_geo::{angular_difference, distance_nm, initial_bearing_degrees, midpoint};

use crate::RecordError;

/// Continuation candidates must turn less than this to stay eligible.
const MAX_CONTINUATION_TURN_DEGREES: f64 = 150.0;

/// Named navigation point, identified by ident plus ICAO region.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    ident: String,
    region: String,
    position: LatLon,
}

impl Waypoint {
    pub fn new(
        ident: impl AsRef<str>,
        region: impl AsRef<str>,
        position: LatLon,
    ) -> Result<Self, RecordError> {
        let ident = ident.as_ref().trim().to_ascii_uppercase();
        if ident.is_empty() {
            return Err(RecordError::EmptyField { field: "ident" });
        }
        let region = region.as_ref().trim().to_ascii_uppercase();
        if region.is_empty() {
            return Err(RecordError::EmptyField { field: "region" });
        }

        Ok(Self {
            ident,
            region,
            position,
        })
    }

    #[must_use]
    pub fn ident(&self) -> &str {
        &self.ident
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn position(&self) -> LatLon {
        self.position
    }

    /// `IDENT_REGION`, the waypoint half of a segment key.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}_{}", self.ident, self.region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirwayLayer {
    Low,
    High,
    Other(u8),
}

impl AirwayLayer {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Low,
            2 => Self::High,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::High => 2,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for AirwayLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
            Self::Other(code) => write!(f, "layer-{code}"),
        }
    }
}

/// Directed airway edge between two waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct AirwaySegment {
    start: Waypoint,
    end: Waypoint,
    layer: AirwayLayer,
    base_ft: i32,
    top_ft: i32,
    names: Vec<String>,
    key: String,
    midpoint: LatLon,
    bearing_degrees: f64,
    length_nm: f64,
}

impl AirwaySegment {
    /// Builds a segment; `names` is the `-`-joined designator list, e.g. `UN871-UL612`.
    pub fn new(
        start: Waypoint,
        end: Waypoint,
        layer: AirwayLayer,
        base_ft: i32,
        top_ft: i32,
        names: &str,
    ) -> Result<Self, RecordError> {
        if base_ft >= top_ft {
            return Err(RecordError::InvalidAltitudeBand { base_ft, top_ft });
        }
        if start.id() == end.id() {
            return Err(RecordError::DegenerateSegment { id: start.id() });
        }
        let names: Vec<String> = names
            .split('-')
            .map(|name| name.trim().to_ascii_uppercase())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(RecordError::EmptyField { field: "names" });
        }

        let key = format!("{}_{}", start.id(), end.id());
        let from = start.position();
        let to = end.position();

        Ok(Self {
            key,
            midpoint: midpoint(&from, &to),
            bearing_degrees: initial_bearing_degrees(&from, &to),
            length_nm: distance_nm(&from, &to),
            start,
            end,
            layer,
            base_ft,
            top_ft,
            names,
        })
    }

    #[must_use]
    pub fn start(&self) -> &Waypoint {
        &self.start
    }

    #[must_use]
    pub fn end(&self) -> &Waypoint {
        &self.end
    }

    #[must_use]
    pub fn layer(&self) -> AirwayLayer {
        self.layer
    }

    #[must_use]
    pub fn base_ft(&self) -> i32 {
        self.base_ft
    }

    #[must_use]
    pub fn top_ft(&self) -> i32 {
        self.top_ft
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn midpoint(&self) -> LatLon {
        self.midpoint
    }

    /// Initial true bearing from start to end.
    #[must_use]
    pub fn bearing_degrees(&self) -> f64 {
        self.bearing_degrees
    }

    #[must_use]
    pub fn length_nm(&self) -> f64 {
        self.length_nm
    }

    #[must_use]
    pub fn shares_name_with(&self, other: &Self) -> bool {
        self.names.iter().any(|name| other.names.contains(name))
    }
}

/// Airway segments keyed by `startID_endID`.
#[derive(Debug, Clone, Default)]
pub struct AirwayTable {
    segments: BTreeMap<String, AirwaySegment>,
}

impl AirwayTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a segment unless its key is already present.
    pub fn insert(&mut self, segment: AirwaySegment) -> bool {
        if self.segments.contains_key(segment.key()) {
            return false;
        }
        self.segments.insert(segment.key.clone(), segment);
        true
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AirwaySegment> {
        self.segments.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirwaySegment> {
        self.segments.values()
    }

    /// Subset of segments whose midpoint lies within `radius_nm` of `center`.
    #[must_use]
    pub fn select_within(&self, center: &LatLon, radius_nm: f64) -> Self {
        let segments = self
            .segments
            .iter()
            .filter(|(_, segment)| distance_nm(center, &segment.midpoint) <= radius_nm)
            .map(|(key, segment)| (key.clone(), segment.clone()))
            .collect();
        Self { segments }
    }

    /// Segments leaving the waypoint `waypoint_id` (`IDENT_REGION`).
    pub fn departing_from<'a>(
        &'a self,
        waypoint_id: &str,
    ) -> impl Iterator<Item = &'a AirwaySegment> + 'a {
        let prefix = format!("{waypoint_id}_");
        self.segments
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(_, segment)| segment)
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&AirwaySegment> {
        self.segments.values().choose(rng)
    }

    /// Picks the segment that continues `current` at its end waypoint.
    ///
    /// A candidate that ends where `current` starts is never returned. The
    /// first candidate sharing a designator wins; otherwise one candidate
    /// turning less than 150 degrees is chosen at random.
    pub fn continuation<R: Rng + ?Sized>(
        &self,
        current: &AirwaySegment,
        rng: &mut R,
    ) -> Option<&AirwaySegment> {
        let origin = current.start.id();
        let candidates: Vec<&AirwaySegment> = self
            .departing_from(&current.end.id())
            .filter(|candidate| candidate.end.id() != origin)
            .collect();

        if let Some(same_airway) = candidates
            .iter()
            .find(|candidate| candidate.shares_name_with(current))
        {
            return Some(*same_airway);
        }

        let eligible: Vec<&AirwaySegment> = candidates
            .into_iter()
            .filter(|candidate| {
                angular_difference(candidate.bearing_degrees, current.bearing_degrees)
                    < MAX_CONTINUATION_TURN_DEGREES
            })
            .collect();
        eligible.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use vtraffic_core::LatLon;

    use super::{AirwayLayer, AirwaySegment, AirwayTable, Waypoint};
    use crate::RecordError;

    fn waypoint(ident: &str, latitude: f64, longitude: f64) -> Waypoint {
        Waypoint::new(
            ident,
            "LS",
            LatLon::new(latitude, longitude).expect("valid position"),
        )
        .expect("valid waypoint")
    }

    fn segment(from: &Waypoint, to: &Waypoint, names: &str) -> AirwaySegment {
        AirwaySegment::new(
            from.clone(),
            to.clone(),
            AirwayLayer::High,
            18_000,
            45_000,
            names,
        )
        .expect("valid segment")
    }

    #[test]
    fn segment_key_and_geometry() {
        let start = waypoint("abc", 47.0, 8.0);
        let end = waypoint("DEF", 47.0, 9.0);
        let leg = segment(&start, &end, "un871-ul612");

        assert_eq!(leg.key(), "ABC_LS_DEF_LS");
        assert_eq!(leg.names(), ["UN871".to_owned(), "UL612".to_owned()]);
        assert!((leg.bearing_degrees() - 90.0).abs() < 0.5);
        assert!((leg.length_nm() - 40.9).abs() < 0.5);
        assert!((leg.midpoint().longitude() - 8.5).abs() < 1e-3);
    }

    #[test]
    fn segment_rejects_inverted_band_and_loops() {
        let start = waypoint("ABC", 47.0, 8.0);
        let end = waypoint("DEF", 47.0, 9.0);

        let band = AirwaySegment::new(
            start.clone(),
            end,
            AirwayLayer::Low,
            10_000,
            10_000,
            "A1",
        )
        .expect_err("base must be below top");
        assert_eq!(
            band,
            RecordError::InvalidAltitudeBand {
                base_ft: 10_000,
                top_ft: 10_000
            }
        );

        let looped = AirwaySegment::new(
            start.clone(),
            start,
            AirwayLayer::Low,
            1_000,
            10_000,
            "A1",
        )
        .expect_err("start and end must differ");
        assert!(matches!(looped, RecordError::DegenerateSegment { .. }));
    }

    #[test]
    fn departing_from_does_not_match_longer_idents() {
        let a = waypoint("AB", 47.0, 8.0);
        let ab = waypoint("ABC", 47.1, 8.1);
        let c = waypoint("CD", 47.2, 8.2);

        let mut table = AirwayTable::new();
        assert!(table.insert(segment(&a, &c, "A1")));
        assert!(table.insert(segment(&ab, &c, "A2")));
        assert!(!table.insert(segment(&a, &c, "A9")));

        let keys: Vec<&str> = table
            .departing_from(&a.id())
            .map(AirwaySegment::key)
            .collect();
        assert_eq!(keys, ["AB_LS_CD_LS"]);
    }

    #[test]
    fn continuation_prefers_same_designator() {
        let west = waypoint("WEST", 47.0, 7.0);
        let mid = waypoint("MID", 47.0, 8.0);
        let east = waypoint("EAST", 47.0, 9.0);
        let north = waypoint("NRTH", 47.8, 8.1);

        let current = segment(&west, &mid, "UN871");
        let mut table = AirwayTable::new();
        table.insert(current.clone());
        table.insert(segment(&mid, &north, "UL612"));
        table.insert(segment(&mid, &east, "UN871"));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..16 {
            let next = table
                .continuation(&current, &mut rng)
                .expect("continuation exists");
            assert_eq!(next.end().ident(), "EAST");
        }
    }

    #[test]
    fn continuation_never_doubles_back() {
        let west = waypoint("WEST", 47.0, 7.0);
        let mid = waypoint("MID", 47.0, 8.0);

        let current = segment(&west, &mid, "UN871");
        let mut table = AirwayTable::new();
        table.insert(current.clone());
        table.insert(segment(&mid, &west, "UN871"));

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(table.continuation(&current, &mut rng).is_none());
    }

    #[test]
    fn continuation_skips_sharp_turns() {
        let west = waypoint("WEST", 47.0, 7.0);
        let mid = waypoint("MID", 47.0, 8.0);
        let back = waypoint("BACK", 46.95, 7.2);
        let ahead = waypoint("AHEAD", 47.3, 9.0);

        let current = segment(&west, &mid, "A1");
        let mut table = AirwayTable::new();
        table.insert(current.clone());
        table.insert(segment(&mid, &back, "B2"));
        table.insert(segment(&mid, &ahead, "C3"));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..16 {
            let next = table
                .continuation(&current, &mut rng)
                .expect("one eligible candidate");
            assert_eq!(next.end().ident(), "AHEAD");
        }
    }

    #[test]
    fn select_within_filters_by_midpoint() {
        let near_a = waypoint("NA", 47.0, 8.0);
        let near_b = waypoint("NB", 47.2, 8.2);
        let far_a = waypoint("FA", 52.0, 13.0);
        let far_b = waypoint("FB", 52.2, 13.2);

        let mut table = AirwayTable::new();
        table.insert(segment(&near_a, &near_b, "A1"));
        table.insert(segment(&far_a, &far_b, "A2"));

        let center = LatLon::new(47.1, 8.1).expect("valid center");
        let selected = table.select_within(&center, 50.0);
        assert_eq!(selected.len(), 1);
        assert!(selected.get("NA_LS_NB_LS").is_some());
        assert_eq!(table.len(), 2);
    }
}
