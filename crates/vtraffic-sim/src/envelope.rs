pub const MIN_VERTICAL_RATE_FPM: f64 = 100.0;
pub const MIN_TURN_RATE_DEG_PER_SEC: f64 = 0.5;
pub const MAX_TURN_RATE_DEG_PER_SEC: f64 = 9.0;
pub const MIN_ACCELERATION_KT_PER_SEC: f64 = 0.5;
pub const MAX_ACCELERATION_KT_PER_SEC: f64 = 10.0;
pub const MIN_ALTITUDE_FT: f64 = 0.0;

/// Ground speed used when a script asks for zero or negative speed.
pub const FALLBACK_SPEED_KT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AircraftCategory {
    GeneralAviation,
    Jet,
}

/// Performance limits of one aircraft category.
///
/// Script inputs beyond these limits are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceEnvelope {
    pub category: AircraftCategory,
    pub max_speed_kt: f64,
    pub max_vertical_rate_fpm: f64,
    pub ceiling_ft: f64,
    pub default_acceleration_kt_per_sec: f64,
    pub default_turn_rate_deg_per_sec: f64,
}

impl PerformanceEnvelope {
    pub const GENERAL_AVIATION: Self = Self {
        category: AircraftCategory::GeneralAviation,
        max_speed_kt: 180.0,
        max_vertical_rate_fpm: 1_500.0,
        ceiling_ft: 10_000.0,
        default_acceleration_kt_per_sec: 2.0,
        default_turn_rate_deg_per_sec: 3.0,
    };

    pub const JET: Self = Self {
        category: AircraftCategory::Jet,
        max_speed_kt: 500.0,
        max_vertical_rate_fpm: 2_500.0,
        ceiling_ft: 45_000.0,
        default_acceleration_kt_per_sec: 5.0,
        default_turn_rate_deg_per_sec: 3.0,
    };

    #[must_use]
    pub const fn for_category(category: AircraftCategory) -> Self {
        match category {
            AircraftCategory::GeneralAviation => Self::GENERAL_AVIATION,
            AircraftCategory::Jet => Self::JET,
        }
    }

    /// GA limits for types on the GA list, jet limits for everything else.
    #[must_use]
    pub fn for_aircraft_type(aircraft_type: &str) -> Self {
        if crate::fleet::is_general_aviation_type(aircraft_type) {
            Self::GENERAL_AVIATION
        } else {
            Self::JET
        }
    }

    #[must_use]
    pub fn clamp_speed(&self, speed_kt: f64) -> f64 {
        if speed_kt > self.max_speed_kt {
            self.max_speed_kt
        } else if speed_kt <= 0.0 {
            FALLBACK_SPEED_KT
        } else {
            speed_kt
        }
    }

    #[must_use]
    pub fn clamp_vertical_rate(&self, rate_fpm: f64) -> f64 {
        rate_fpm.clamp(MIN_VERTICAL_RATE_FPM, self.max_vertical_rate_fpm)
    }

    #[must_use]
    pub fn clamp_altitude(&self, altitude_ft: f64) -> f64 {
        altitude_ft.clamp(MIN_ALTITUDE_FT, self.ceiling_ft)
    }

    #[must_use]
    pub fn clamp_acceleration(&self, acceleration_kt_per_sec: f64) -> f64 {
        acceleration_kt_per_sec.clamp(MIN_ACCELERATION_KT_PER_SEC, MAX_ACCELERATION_KT_PER_SEC)
    }

    #[must_use]
    pub fn clamp_turn_rate(&self, rate_deg_per_sec: f64) -> f64 {
        rate_deg_per_sec.clamp(MIN_TURN_RATE_DEG_PER_SEC, MAX_TURN_RATE_DEG_PER_SEC)
    }
}
