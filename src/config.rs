use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

/// Tunables shared by every document opened with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo steps kept in history
    pub undo_limit: usize,
    /// Initial change-tracking flag of new documents
    pub track_changes: bool,
    /// Files at or above this size are memory-mapped by `Document::open`
    pub mapped_threshold: u64,
    /// Read-cache chunk size of the streamed backend
    pub stream_chunk_size: usize,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::open(path, e))?;
        Self::from_json_str(&text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_limit: 1000,
            track_changes: false,
            mapped_threshold: 16 * 1024 * 1024,
            stream_chunk_size: 64 * 1024,
        }
    }
}
