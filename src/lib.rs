pub mod buffer;
pub mod changes;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod pattern;
pub mod search;

pub use buffer::{BufferKind, ByteBuffer, MappedFileBuffer, MemoryBuffer, StreamedBuffer};
pub use changes::{ByteRange, ChangeSet, EditKind};
pub use config::EngineConfig;
pub use document::{Document, DocumentEvent};
pub use edit::DataChange;
pub use error::{EngineError, Result};
pub use pattern::{check_pattern, to_hex, CompiledPattern, PatternToken};
pub use search::{
    ByteOrder, CancelToken, FindDirection, FindMode, FindOptions, FindValue, FloatWidth, IntWidth,
    Match,
};
