use std::path::PathBuf;

use thiserror::Error;

/// The structured error taxonomy for the object store, index, and object
/// builders. Command front-ends wrap these with `eyre::Context` to attach
/// user-facing detail before reporting them.
#[derive(Debug, Error)]
pub enum DircacheError {
    #[error("malformed hex digest {0:?}")]
    MalformedHex(String),

    #[error("object {0} not found in the store")]
    NotFound(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("deflate failed: {0}")]
    Deflate(String),

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("index.lock already exists; another writer is active")]
    LockHeld,

    #[error("invalid path {0:?}")]
    InvalidPath(PathBuf),

    #[error("index is empty")]
    EmptyIndex,
}

impl DircacheError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DircacheError>;
