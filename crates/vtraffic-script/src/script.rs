use std::fmt;

use vtraffic_core::LatLon;

use crate::{
    Command, Descriptor, ScriptError, ScriptParseError, DEFAULT_ACCELERATION_KT_PER_SEC,
    DEFAULT_TURN_RATE_DEG_PER_SEC,
};

const HEADER_LINE: &str = "# Start of script";
const FOOTER_LINE: &str = "# End of script";

/// Why a script line was dropped without rejecting the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownKey,
    MissingField,
    InvalidNumber,
    RepeatedDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: usize,
    pub text: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub script: Script,
    pub skipped: Vec<SkippedLine>,
}

/// A descriptor, the motion commands, and an implicit end marker.
///
/// The body never holds a descriptor or an end marker, so every `Script`
/// value satisfies the structural invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    descriptor: Descriptor,
    body: Vec<Command>,
}

impl Script {
    pub fn new(descriptor: Descriptor, body: Vec<Command>) -> Result<Self, ScriptError> {
        if let Some(index) = body.iter().position(Command::is_marker) {
            return Err(ScriptError::MisplacedMarker { index: index + 1 });
        }
        Ok(Self { descriptor, body })
    }

    /// Accepts a full command sequence: descriptor first, end marker last.
    pub fn from_commands(commands: Vec<Command>) -> Result<Self, ScriptError> {
        if commands.len() < 2 {
            return Err(ScriptError::TooShort {
                len: commands.len(),
            });
        }
        if !matches!(commands.last(), Some(Command::End)) {
            return Err(ScriptError::MissingEnd);
        }

        let mut commands = commands.into_iter();
        let Some(Command::Descriptor(descriptor)) = commands.next() else {
            return Err(ScriptError::MissingDescriptor);
        };
        let mut body: Vec<Command> = commands.collect();
        body.pop();

        Self::new(descriptor, body)
    }

    pub fn parse(text: &str) -> Result<Self, ScriptParseError> {
        Self::parse_with_report(text).map(|parsed| parsed.script)
    }

    /// Parses script text and reports every dropped line.
    pub fn parse_with_report(text: &str) -> Result<ParsedScript, ScriptParseError> {
        let mut descriptor: Option<Descriptor> = None;
        let mut body = Vec::new();
        let mut skipped = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let Some(fields) = tokenize(raw) else {
                continue;
            };
            let key = leading_key(&fields);

            if descriptor.is_none() {
                if key != Some('A') {
                    return Err(ScriptParseError::CommandBeforeDescriptor {
                        line,
                        key: fields[0].clone(),
                    });
                }
                let parsed = Descriptor::from_fields(&fields)
                    .map_err(|source| ScriptParseError::InvalidDescriptor { line, source })?;
                descriptor = Some(parsed);
                continue;
            }

            match parse_motion(key, &fields) {
                Ok(Some(command)) => body.push(command),
                Ok(None) => {}
                Err(reason) => skipped.push(SkippedLine {
                    line,
                    text: raw.trim().to_owned(),
                    reason,
                }),
            }
        }

        let descriptor = descriptor.ok_or(ScriptParseError::MissingDescriptor)?;
        Ok(ParsedScript {
            script: Self { descriptor, body },
            skipped,
        })
    }

    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn descriptor_mut(&mut self) -> &mut Descriptor {
        &mut self.descriptor
    }

    /// Motion commands between the descriptor and the end marker.
    #[must_use]
    pub fn body(&self) -> &[Command] {
        &self.body
    }

    /// Full sequence including the descriptor and the trailing end marker.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.len());
        commands.push(Command::Descriptor(self.descriptor.clone()));
        commands.extend(self.body.iter().cloned());
        commands.push(Command::End);
        commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len() + 2
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn push(&mut self, command: Command) -> Result<(), ScriptError> {
        if command.is_marker() {
            return Err(ScriptError::MisplacedMarker {
                index: self.body.len() + 1,
            });
        }
        self.body.push(command);
        Ok(())
    }

    /// Script text with header and footer comments; the end marker stays implicit.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER_LINE}")?;
        writeln!(f, "{}", self.descriptor)?;
        for command in &self.body {
            writeln!(f, "{command}")?;
        }
        writeln!(f, "{FOOTER_LINE}")
    }
}

fn tokenize(raw: &str) -> Option<Vec<String>> {
    let upper = raw.trim().to_ascii_uppercase();
    let content = upper.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return None;
    }

    let fields: Vec<String> = content
        .split(['=', ';'])
        .map(|field| field.trim().to_owned())
        .collect();
    (fields.len() >= 2).then_some(fields)
}

fn leading_key(fields: &[String]) -> Option<char> {
    fields.first().and_then(|key| key.chars().next())
}

fn parse_motion(key: Option<char>, fields: &[String]) -> Result<Option<Command>, SkipReason> {
    let command = match key {
        Some('A') => return Err(SkipReason::RepeatedDescriptor),
        Some('E') => return Ok(None),
        Some('D') => Command::Distance {
            nm: required(fields, 1)?,
        },
        Some('T') => Command::Turn {
            delta_degrees: required(fields, 1)?,
            rate_deg_per_sec: optional(fields, 2).unwrap_or(DEFAULT_TURN_RATE_DEG_PER_SEC),
        },
        Some('H') => Command::Heading {
            target_degrees: required(fields, 1)?,
            rate_deg_per_sec: optional(fields, 2).unwrap_or(DEFAULT_TURN_RATE_DEG_PER_SEC),
        },
        Some('G') => Command::GoTo {
            destination: LatLon::new(required(fields, 1)?, required(fields, 2)?)
                .map_err(|_| SkipReason::InvalidNumber)?,
            rate_deg_per_sec: optional(fields, 3).unwrap_or(DEFAULT_TURN_RATE_DEG_PER_SEC),
        },
        Some('S') => Command::Speed {
            kt: required(fields, 1)?,
            accel_kt_per_sec: optional(fields, 2).unwrap_or(DEFAULT_ACCELERATION_KT_PER_SEC),
            immediate: optional_integer(fields, 3).is_some_and(|flag| flag > 0),
        },
        Some('V') => Command::Climb {
            vsi_ft_per_min: required::<f64>(fields, 1)?.abs(),
            target_alt_ft: required(fields, 2)?,
        },
        Some('M') => {
            let msl_based = required::<i64>(fields, 1)? > 0;
            Command::AltitudeBase {
                msl_based,
                absolute_alt_ft: optional(fields, 2).filter(|alt| msl_based && *alt > 0.0),
            }
        }
        _ => return Err(SkipReason::UnknownKey),
    };
    Ok(Some(command))
}

fn required<T: std::str::FromStr + IsFinite>(
    fields: &[String],
    index: usize,
) -> Result<T, SkipReason> {
    let field = fields
        .get(index)
        .filter(|field| !field.is_empty())
        .ok_or(SkipReason::MissingField)?;
    field
        .parse::<T>()
        .ok()
        .filter(IsFinite::is_finite_value)
        .ok_or(SkipReason::InvalidNumber)
}

/// Optional numeric fields fall back to their default when absent or unreadable.
fn optional(fields: &[String], index: usize) -> Option<f64> {
    required(fields, index).ok()
}

fn optional_integer(fields: &[String], index: usize) -> Option<i64> {
    required(fields, index).ok()
}

trait IsFinite {
    fn is_finite_value(&self) -> bool;
}

impl IsFinite for f64 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl IsFinite for i64 {
    fn is_finite_value(&self) -> bool {
        true
    }
}
