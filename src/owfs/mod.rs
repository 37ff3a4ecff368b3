//! OWFS image parsing and extraction.
//!
//! This module provides functionality for locating OWFS filesystem images
//! inside firmware blobs and extracting the files they contain.
//!
//! ## Architecture
//!
//! The module is organized into these components:
//!
//! - `structures`: On-disk records (header, directory entries) and constants
//! - `parser`: Locating the image and decoding its header and entry table
//! - `decompress`: LZMA/XZ payload decompression
//! - `extractor`: High-level extraction API with per-entry results
//! - `error`: Fatal image errors and per-entry errors
//!
//! ## OWFS Format Overview
//!
//! An OWFS image consists of (all integers big-endian):
//! 1. A 44-byte header: 32-byte magic, version, entry count, reserved word
//! 2. `entry count` directory records of 48 bytes: 40-byte NUL-padded name,
//!    payload size, payload offset relative to the start of the header
//! 3. A pool of independently compressed LZMA/XZ payloads
//!
//! The image may start anywhere in the buffer; the first magic found is
//! used as the base for every payload offset.
//!
//! ## Limitations
//!
//! - Read only, images cannot be written
//! - A single fixed on-disk layout

mod decompress;
mod error;
mod extractor;
mod parser;
mod structures;

pub use error::{EntryError, ImageError};
pub use extractor::{EntryOutcome, ExtractionReport, OwfsExtractor, extract};
pub use parser::{OwfsParser, find_signature};
pub use structures::*;
