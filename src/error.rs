use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The backing file could not be opened or inspected
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file could not be memory-mapped
    #[error("Cannot map {}: {source}", path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Insert requested at an offset beyond the end of data
    #[error("Offset {offset} is past the end of data ({len} bytes)")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// IO error while writing or copying
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Open {
            path: path.into(),
            source,
        }
    }

    pub fn map(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Map {
            path: path.into(),
            source,
        }
    }
}
