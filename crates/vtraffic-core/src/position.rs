use std::fmt;

/// Geographic position in decimal degrees on a spherical earth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    latitude: f64,
    longitude: f64,
}

impl LatLon {
    /// Validates and builds a position from externally supplied degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        Ok(Self {
            latitude: validate_bounded("latitude", latitude, -90.0, 90.0)?,
            longitude: validate_bounded("longitude", longitude, -180.0, 180.0)?,
        })
    }

    /// Builds a position from computed degrees, clamping latitude and wrapping
    /// longitude into `[-180, 180)`.
    ///
    /// Non-finite inputs collapse to zero so geodesy results never carry NaN.
    #[must_use]
    pub fn normalized(latitude: f64, longitude: f64) -> Self {
        let latitude = if latitude.is_finite() {
            latitude.clamp(-90.0, 90.0)
        } else {
            0.0
        };
        let longitude = if longitude.is_finite() {
            (longitude + 180.0).rem_euclid(360.0) - 180.0
        } else {
            0.0
        };

        Self {
            latitude: canonicalize_zero(latitude),
            longitude: canonicalize_zero(longitude),
        }
    }

    /// Converts radians into a validated position.
    pub fn from_radians(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        Self::new(latitude.to_degrees(), longitude.to_degrees())
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn latitude_radians(&self) -> f64 {
        self.latitude.to_radians()
    }

    #[must_use]
    pub fn longitude_radians(&self) -> f64 {
        self.longitude.to_radians()
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    NonFiniteValue {
        field: &'static str,
        value: f64,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue { field, value } => {
                write!(f, "{field} must be finite, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be in [{min}, {max}], got {value}"),
        }
    }
}

impl std::error::Error for CoreError {}

fn validate_finite(field: &'static str, value: f64) -> Result<f64, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::NonFiniteValue { field, value });
    }

    Ok(canonicalize_zero(value))
}

fn validate_bounded(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, CoreError> {
    let value = validate_finite(field, value)?;
    if value < min || value > max {
        return Err(CoreError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }

    Ok(value)
}

fn canonicalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreError, LatLon};

    #[test]
    fn new_rejects_out_of_range_latitude() {
        let error = LatLon::new(91.0, 0.0).expect_err("latitude above 90 must fail");
        assert!(matches!(
            error,
            CoreError::OutOfRange {
                field: "latitude",
                ..
            }
        ));
    }

    #[test]
    fn new_rejects_non_finite_longitude() {
        let error = LatLon::new(0.0, f64::NAN).expect_err("NaN longitude must fail");
        assert!(matches!(
            error,
            CoreError::NonFiniteValue {
                field: "longitude",
                ..
            }
        ));
    }

    #[test]
    fn normalized_wraps_longitude_across_antimeridian() {
        let position = LatLon::normalized(12.0, 190.0);
        assert_eq!(position.latitude(), 12.0);
        assert!((position.longitude() + 170.0).abs() < 1e-9);

        let clamped = LatLon::normalized(95.0, -540.0);
        assert_eq!(clamped.latitude(), 90.0);
        assert_eq!(clamped.longitude(), -180.0);
    }

    #[test]
    fn from_radians_converts_to_degrees() {
        let position = LatLon::from_radians(std::f64::consts::FRAC_PI_4, -std::f64::consts::FRAC_PI_2)
            .expect("quarter-pi radians are valid");
        assert!((position.latitude() - 45.0).abs() < 1e-12);
        assert!((position.longitude() + 90.0).abs() < 1e-12);
    }
}
