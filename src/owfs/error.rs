use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;

use thiserror::Error;

/// Errors that abort the whole run before any entry is processed.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No signature on file")]
    SignatureNotFound,

    #[error("Invalid image: size too small ({available} bytes after signature at {offset:#x}, need {needed})")]
    TruncatedHeader {
        offset: usize,
        available: usize,
        needed: usize,
    },

    #[error("Invalid image: bad magic signature at {offset:#x}")]
    BadMagic { offset: usize },

    #[error("Invalid image: entry table of {entry_count} entries does not fit in {available} bytes")]
    TruncatedEntryTable { entry_count: u32, available: usize },
}

/// Errors local to one entry. The walker records them and moves on.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("file name is not valid UTF-8: {0}")]
    InvalidFilename(#[source] Utf8Error),

    #[error("file name {name:?} escapes the destination directory")]
    UnsafePath { name: String },

    #[error("payload at {offset:#x} with size {size} exceeds image length {len}")]
    PayloadOutOfBounds { offset: u64, size: u32, len: usize },

    #[error("decompression failed: {0}")]
    DecompressionFailed(#[source] lzma_rs::error::Error),

    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EntryError {
    /// Short name of the error kind, used in progress lines.
    pub fn kind(&self) -> &'static str {
        match self {
            EntryError::InvalidFilename(_) => "InvalidFilename",
            EntryError::UnsafePath { .. } => "UnsafePath",
            EntryError::PayloadOutOfBounds { .. } => "PayloadOutOfBounds",
            EntryError::DecompressionFailed(_) => "DecompressionFailed",
            EntryError::WriteFailed { .. } => "WriteFailed",
        }
    }
}
