use std::fmt;

use vtraffic_core::LatLon;

use crate::Descriptor;

pub const DEFAULT_TURN_RATE_DEG_PER_SEC: f64 = 3.0;
pub const DEFAULT_ACCELERATION_KT_PER_SEC: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Descriptor(Descriptor),
    /// Fly straight for `nm`.
    Distance { nm: f64 },
    /// Turn by a signed angle; negative is left.
    Turn {
        delta_degrees: f64,
        rate_deg_per_sec: f64,
    },
    /// Turn the short way onto a true track.
    Heading {
        target_degrees: f64,
        rate_deg_per_sec: f64,
    },
    /// Fly to a position, aimed once when the command starts.
    GoTo {
        destination: LatLon,
        rate_deg_per_sec: f64,
    },
    Speed {
        kt: f64,
        accel_kt_per_sec: f64,
        immediate: bool,
    },
    /// Climb or descend at `vsi_ft_per_min` (always positive) to `target_alt_ft`.
    Climb {
        vsi_ft_per_min: f64,
        target_alt_ft: f64,
    },
    AltitudeBase {
        msl_based: bool,
        absolute_alt_ft: Option<f64>,
    },
    End,
}

impl Command {
    /// Script key letter of the command.
    #[must_use]
    pub const fn key(&self) -> char {
        match self {
            Self::Descriptor(_) => 'A',
            Self::Distance { .. } => 'D',
            Self::Turn { .. } => 'T',
            Self::Heading { .. } => 'H',
            Self::GoTo { .. } => 'G',
            Self::Speed { .. } => 'S',
            Self::Climb { .. } => 'V',
            Self::AltitudeBase { .. } => 'M',
            Self::End => 'E',
        }
    }

    /// Commands that hold the model until their leg or turn is flown.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::Distance { .. } | Self::Turn { .. } | Self::Heading { .. } | Self::GoTo { .. }
        )
    }

    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(self, Self::Descriptor(_) | Self::End)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor(descriptor) => fmt::Display::fmt(descriptor, f),
            Self::Distance { nm } => write!(f, "D={nm:.2}"),
            Self::Turn {
                delta_degrees,
                rate_deg_per_sec,
            } => write!(f, "T={delta_degrees:.1};{rate_deg_per_sec:.1}"),
            Self::Heading {
                target_degrees,
                rate_deg_per_sec,
            } => write!(f, "H={target_degrees:.1};{rate_deg_per_sec:.1}"),
            Self::GoTo {
                destination,
                rate_deg_per_sec,
            } => write!(
                f,
                "G={:.6};{:.6};{rate_deg_per_sec:.1}",
                destination.latitude(),
                destination.longitude()
            ),
            Self::Speed {
                kt,
                accel_kt_per_sec,
                immediate,
            } => {
                write!(f, "S={kt:.1};{accel_kt_per_sec:.2}")?;
                if *immediate {
                    f.write_str(";1")?;
                }
                Ok(())
            }
            Self::Climb {
                vsi_ft_per_min,
                target_alt_ft,
            } => write!(f, "V={vsi_ft_per_min:.0};{target_alt_ft:.0}"),
            Self::AltitudeBase {
                msl_based,
                absolute_alt_ft,
            } => write!(
                f,
                "M={};{:.0}",
                u8::from(*msl_based),
                absolute_alt_ft.unwrap_or(-1.0)
            ),
            Self::End => f.write_str("E"),
        }
    }
}
