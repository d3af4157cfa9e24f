use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A resource descriptor names an operator group with no registered metadata.
    #[error("no metadata registered for operator group {group}")]
    MissingMetadata { group: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render manifest for {group}: {message}")]
    Serialize { group: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    /// Recoverable errors only affect the operator group being written; the
    /// remaining groups can still be generated.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Serialize { .. })
    }
}
