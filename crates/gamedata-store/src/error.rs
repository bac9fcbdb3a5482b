use std::io;

/// Errors produced by the game-data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error while reading, writing, or removing the backing file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Structured-text encode or decode failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The obscured text could not be reversed.
    #[error("cannot reverse obscured save data: {0}")]
    Obscure(String),

    /// The binary payload is malformed.
    #[error("corrupt save data at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// The configured file name cannot be used as a save file base name.
    #[error("invalid save file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: String },

    /// The platform exposes no per-user data directory.
    #[error("no persistent data directory available on this platform")]
    NoDataDirectory,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
