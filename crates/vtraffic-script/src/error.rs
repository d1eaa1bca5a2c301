use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("descriptor has {found} fields, flight kind `{kind}` needs {expected}")]
    MissingFields {
        kind: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown flight kind `{0}`")]
    UnknownFlightKind(String),

    #[error("aircraft type must not be empty")]
    EmptyAircraftType,

    #[error("descriptor field `{field}` is not a valid number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("descriptor start position is invalid: {0}")]
    InvalidPosition(String),
}

/// Failures that reject a script as a whole.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptParseError {
    #[error("script has no descriptor line")]
    MissingDescriptor,

    #[error("line {line}: `{key}` command appears before the descriptor")]
    CommandBeforeDescriptor { line: usize, key: String },

    #[error("line {line}: {source}")]
    InvalidDescriptor {
        line: usize,
        #[source]
        source: DescriptorError,
    },
}

/// Structural violations when assembling a script from commands.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    #[error("script needs at least a descriptor and an end marker, got {len} commands")]
    TooShort { len: usize },

    #[error("first command must be the descriptor")]
    MissingDescriptor,

    #[error("last command must be the end marker")]
    MissingEnd,

    #[error("command {index} is a descriptor or end marker inside the script body")]
    MisplacedMarker { index: usize },
}

#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("script folder `{path}` does not exist")]
    FolderMissing { path: PathBuf },

    #[error("failed to read script location `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script `{path}` is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ScriptParseError,
    },

    #[error("failed to write script `{path}`: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
