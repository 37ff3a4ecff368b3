use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::decompress::decompress;
use super::error::{EntryError, ImageError};
use super::parser::OwfsParser;
use super::structures::{DirectoryEntry, ImageHeader};

/// Outcome of extracting one table entry
#[derive(Debug)]
pub struct EntryOutcome {
    pub index: u32,
    /// Decoded name, or a lossy rendering when the name is not UTF-8
    pub name: String,
    /// Path written on success
    pub result: Result<PathBuf, EntryError>,
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of a whole extraction run
#[derive(Debug)]
pub struct ExtractionReport {
    pub header: ImageHeader,
    pub base_offset: usize,
    /// One outcome per table entry, in table order
    pub outcomes: Vec<EntryOutcome>,
}

impl ExtractionReport {
    /// Number of entries attempted, always the header's entry count.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }
}

/// OWFS image extractor
pub struct OwfsExtractor<'a> {
    parser: OwfsParser<'a>,
}

impl<'a> OwfsExtractor<'a> {
    /// Locate and validate the image in `data`.
    pub fn new(data: &'a [u8]) -> Result<Self, ImageError> {
        Ok(Self {
            parser: OwfsParser::new(data)?,
        })
    }

    pub fn parser(&self) -> &OwfsParser<'a> {
        &self.parser
    }

    pub fn header(&self) -> &ImageHeader {
        self.parser.header()
    }

    /// List all entries whose names decode.
    pub fn list_entries(&self) -> Vec<DirectoryEntry> {
        self.parser
            .entries()
            .filter_map(|(_, entry)| entry.ok())
            .collect()
    }

    /// Extract entry data to memory
    pub fn extract_to_memory(&self, entry: &DirectoryEntry) -> Result<Vec<u8>, EntryError> {
        let payload = self.parser.payload(entry)?;
        decompress(payload).map_err(EntryError::DecompressionFailed)
    }

    /// Extract entry to `dest_dir`, returning the written path.
    ///
    /// The entry name must stay inside `dest_dir`; intermediate directories
    /// are created as needed and an existing file is overwritten.
    pub fn extract_to_file(
        &self,
        entry: &DirectoryEntry,
        dest_dir: &Path,
    ) -> Result<PathBuf, EntryError> {
        let relative = confined_path(&entry.name)?;
        let data = self.extract_to_memory(entry)?;

        let output_path = dest_dir.join(&relative);
        let write_failed = |source| EntryError::WriteFailed {
            path: output_path.clone(),
            source,
        };

        // Create parent directories if needed, never through a symlink
        if let Some(parent) = relative.parent() {
            create_confined_dirs(dest_dir, parent, &entry.name)?;
        }
        if is_symlink(&output_path).map_err(write_failed)? {
            return Err(EntryError::UnsafePath {
                name: entry.name.clone(),
            });
        }

        fs::write(&output_path, &data).map_err(write_failed)?;
        Ok(output_path)
    }

    /// Extract every entry into `dest_dir`, in table order.
    ///
    /// A failing entry is recorded and never stops the run.
    pub fn extract_all(&self, dest_dir: &Path) -> ExtractionReport {
        let mut outcomes = Vec::with_capacity(self.parser.len());

        for (raw, entry) in self.parser.entries() {
            let (index, name, result) = match entry {
                Ok(entry) => {
                    let result = self.extract_to_file(&entry, dest_dir);
                    (entry.index, entry.name, result)
                }
                Err(e) => (outcomes.len() as u32, raw.display_name(), Err(e)),
            };

            match &result {
                Ok(path) => debug!(index, path = %path.display(), "extracted {}", name),
                Err(e) => debug!(index, kind = e.kind(), "failed to extract {}: {}", name, e),
            }

            outcomes.push(EntryOutcome {
                index,
                name,
                result,
            });
        }

        ExtractionReport {
            header: self.header().clone(),
            base_offset: self.parser.base_offset(),
            outcomes,
        }
    }
}

/// Extract every entry of the image found in `data` into `dest_dir`.
///
/// Fails only when the image itself cannot be located or its header is
/// invalid; per-entry failures are reported in the returned report.
pub fn extract(data: &[u8], dest_dir: &Path) -> Result<ExtractionReport, ImageError> {
    Ok(OwfsExtractor::new(data)?.extract_all(dest_dir))
}

/// Turn an entry name into a relative path that cannot leave the
/// destination directory.
fn confined_path(name: &str) -> Result<PathBuf, EntryError> {
    let unsafe_path = || EntryError::UnsafePath {
        name: name.to_string(),
    };

    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(out)
}

/// Create `relative` under `dest_dir` one component at a time.
///
/// Each existing component must be a real directory; a symlink anywhere
/// below `dest_dir` rejects the entry before anything is created.
fn create_confined_dirs(dest_dir: &Path, relative: &Path, name: &str) -> Result<(), EntryError> {
    let mut current = dest_dir.to_path_buf();
    for component in relative.components() {
        current.push(component);
        let write_failed = |source| EntryError::WriteFailed {
            path: current.clone(),
            source,
        };

        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(EntryError::UnsafePath {
                    name: name.to_string(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir(&current).map_err(write_failed)?;
            }
            Err(e) => return Err(write_failed(e)),
        }
    }
    Ok(())
}

fn is_symlink(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
