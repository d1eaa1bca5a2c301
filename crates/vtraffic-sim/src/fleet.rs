//! ICAO type designators and operator codes drawn for generated flights.

use rand::seq::SliceRandom;
use rand::Rng;
use vtraffic_script::DEFAULT_OPERATOR;

pub const JET_TYPES: &[&str] = &[
    "B732", "B733", "B734", "B735", "B736", "B737", "B738", "B743", "B753", "B762", "B763",
    "B764", "B772", "B773", "B788", "B789", "A320", "A332", "A333", "A342", "A343", "A345",
    "A346", "A388", "A20N", "A21N", "MC23", "T134", "T144", "MD11", "E120", "AN26", "JS41",
    "C130", "SB20", "C525", "C550", "E50P", "LJ24", "PA47", "PC24", "PC12", "EA50",
];

pub const GENERAL_AVIATION_TYPES: &[&str] = &[
    "PC12", "PC6T", "C172", "C162", "C182", "BE58", "BE88", "CRBN", "DHC6", "VELT", "SF50",
    "BE9L",
];

pub const OPERATORS: &[&str] = &[
    "SWR", "DLH", "BAW", "AFR", "KLM", "UAL", "DAL", "AAL", "EZY", "RYR", "AUA", "SAS", "IBE",
    "THY", "UAE", "QTR", "EDW", "BEL",
];

#[must_use]
pub fn is_general_aviation_type(aircraft_type: &str) -> bool {
    let aircraft_type = aircraft_type.trim();
    GENERAL_AVIATION_TYPES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(aircraft_type))
}

pub fn random_jet_type<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    JET_TYPES.choose(rng).copied().unwrap_or(JET_TYPES[0])
}

pub fn random_general_aviation_type<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GENERAL_AVIATION_TYPES
        .choose(rng)
        .copied()
        .unwrap_or(GENERAL_AVIATION_TYPES[0])
}

pub fn random_operator<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    OPERATORS.choose(rng).copied().unwrap_or(DEFAULT_OPERATOR)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{
        is_general_aviation_type, random_general_aviation_type, random_jet_type, random_operator,
        OPERATORS,
    };

    #[test]
    fn draws_come_from_the_lists() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(is_general_aviation_type(random_general_aviation_type(
                &mut rng
            )));
            assert_eq!(random_jet_type(&mut rng).len(), 4);
            assert!(OPERATORS.contains(&random_operator(&mut rng)));
        }
    }

    #[test]
    fn ga_lookup_ignores_case_and_padding() {
        assert!(is_general_aviation_type(" c182 "));
        assert!(!is_general_aviation_type("A320"));
    }
}
