//! Motion-command scripts.
//!
//! A script is one descriptor line followed by motion commands:
//!
//! ```text
//! A=C172;Runway;LSZH_RW14;S   # aircraft, flight kind, runway preference
//! S=70;4;1                    # speed 70 kt, 4 kt/s, set immediately
//! D=0.5                       # roll half a mile
//! V=700;3000                  # climb 700 ft/min to 3000 ft above the runway
//! T=-90                       # left turn
//! D=6
//! ```

mod command;
mod descriptor;
mod error;
mod library;
mod script;

pub use command::{Command, DEFAULT_ACCELERATION_KT_PER_SEC, DEFAULT_TURN_RATE_DEG_PER_SEC};
pub use descriptor::{
    Descriptor, FlightKind, AIRWAY_DESTINATION_PENDING, DEFAULT_OPERATOR, MESSAGE_END_LABEL,
    MESSAGE_START_LABEL, RUNWAY_DESTINATION_LABEL, TAIL_PREFIX,
};
pub use error::{DescriptorError, ScriptError, ScriptLoadError, ScriptParseError};
pub use library::{RejectedScript, ScriptLibrary, SCRIPT_EXTENSION};
pub use script::{ParsedScript, Script, SkipReason, SkippedLine};
