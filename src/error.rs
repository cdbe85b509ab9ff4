//! Error taxonomy for the blueprint compiler.
//!
//! Fetch failures against the design API are *soft*: they are logged at the
//! call site and surface as absent data. Everything in this enum is *hard*
//! for the unit that raised it; a malformed blueprint aborts that file's
//! build only, a missing credential aborts the whole run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing configuration: {0}")]
    Config(String),

    #[error("failed to parse blueprint {path}: {source}")]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("io failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
