use std::path::PathBuf;

use thiserror::Error;

/// Library error type for frameshow operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A photo file could not be opened or read at load time.
    #[error("cannot read photo {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A photo file was readable but its pixel stream could not be decoded.
    #[error("cannot decode photo {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The catalog produced zero photos; fatal at startup.
    #[error("no photos found in configured albums")]
    EmptyCatalog,

    /// Defensive check; unreachable while the index invariant holds.
    #[error("slide index {index} out of range for {len} slides")]
    InvalidIndex { index: usize, len: usize },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
