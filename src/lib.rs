//! # unowfs
//!
//! Extract files from OWFS filesystem images found in embedded device
//! firmware.
//!
//! An OWFS image is a flat container: a fixed header, a table of fixed-size
//! directory entries, and a pool of LZMA/XZ compressed payloads. The image is
//! usually embedded somewhere inside a larger firmware blob, so the library
//! first scans the buffer for the format's signature.
//!
//! ## Features
//!
//! - Locate an OWFS image anywhere inside a byte buffer
//! - List directory entries without extracting
//! - Decompress XZ and legacy LZMA payloads
//! - Per-entry results: one bad entry never aborts the run
//! - Offsets and names read from the image are never trusted: payload
//!   ranges are bounds-checked and output paths are confined to the
//!   destination directory
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let data = std::fs::read("firmware.bin")?;
//!     let report = unowfs::extract(&data, Path::new("owfs-root"))?;
//!     for outcome in &report.outcomes {
//!         match &outcome.result {
//!             Ok(path) => println!("{} -> {}", outcome.name, path.display()),
//!             Err(e) => eprintln!("{}: {}", outcome.name, e),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod owfs;

pub use cli::Cli;
pub use owfs::{
    DirectoryEntry, EntryError, EntryOutcome, ExtractionReport, ImageError, ImageHeader,
    OwfsExtractor, OwfsParser, extract,
};
