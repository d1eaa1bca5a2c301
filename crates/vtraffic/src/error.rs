use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vtraffic_config::ConfigError;
use vtraffic_net::{BroadcastError, LinkError};
use vtraffic_routes::RouteError;
use vtraffic_script::ScriptError;
use vtraffic_sim::PoolError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("recording holds {found} usable traffic messages, at least 2 are needed")]
    TooFewMessages { found: usize },

    #[error("recording never reports a usable ground speed")]
    NoSpeed,

    #[error("failed to read recording {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write script {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Script(#[from] ScriptError),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("cannot load route tables: {0}")]
    Routes(#[from] RouteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}
