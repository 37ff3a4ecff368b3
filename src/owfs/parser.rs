//! Low-level OWFS image parser.
//!
//! This module handles locating an OWFS container inside an arbitrary byte
//! buffer and decoding its header and directory table.
//!
//! ## Parsing Strategy
//!
//! OWFS images are usually embedded in a larger firmware blob:
//! 1. Scan for the earliest occurrence of the 32-byte magic signature
//! 2. Decode the 44-byte header found there (the "base offset")
//! 3. Walk `entry_count` fixed-size records following the header
//! 4. Resolve each payload offset relative to the base offset
//!
//! The parser only borrows the buffer. Nothing decoded from the image is
//! trusted: every range is checked against the buffer length before use.

use std::io::Cursor;

use tracing::debug;

use super::error::{EntryError, ImageError};
use super::structures::*;

/// Low-level OWFS image parser.
///
/// Created with [`OwfsParser::new`], which locates the image and validates
/// the header. Typically used through [`OwfsExtractor`](super::OwfsExtractor)
/// rather than directly.
///
/// ## Example
///
/// ```ignore
/// let parser = OwfsParser::new(&buffer)?;
/// for entry in parser.entries() {
///     let (raw, decoded) = entry;
///     // ...
/// }
/// ```
pub struct OwfsParser<'a> {
    /// The whole source buffer
    data: &'a [u8],
    /// Absolute offset of the magic signature
    base: usize,
    header: ImageHeader,
}

impl<'a> OwfsParser<'a> {
    /// Locate the image in `data` and parse its header.
    ///
    /// # Errors
    ///
    /// Fails with [`ImageError::SignatureNotFound`] when the buffer has no
    /// magic, [`ImageError::TruncatedHeader`] when the header is cut short,
    /// and [`ImageError::TruncatedEntryTable`] when the entry count claims
    /// more records than the buffer holds.
    pub fn new(data: &'a [u8]) -> Result<Self, ImageError> {
        let base = find_signature(data).ok_or(ImageError::SignatureNotFound)?;
        debug!(base, "found OWFS signature");

        let header = ImageHeader::from_bytes(&data[base..], base)?;

        let table_start = base + ImageHeader::SIZE;
        let available = data.len() - table_start;
        if header.table_size() > available as u64 {
            return Err(ImageError::TruncatedEntryTable {
                entry_count: header.entry_count,
                available,
            });
        }

        debug!(
            entries = header.entry_count,
            version = header.version,
            "parsed OWFS header"
        );
        Ok(Self { data, base, header })
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Absolute offset of the image inside the source buffer.
    pub fn base_offset(&self) -> usize {
        self.base
    }

    /// Number of records in the entry table.
    pub fn len(&self) -> usize {
        self.header.entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.entry_count == 0
    }

    /// Read the raw record at `index` of the entry table.
    ///
    /// Returns `None` past the end of the table.
    pub fn raw_entry(&self, index: u32) -> Option<RawEntry> {
        if index >= self.header.entry_count {
            return None;
        }
        let start = self.base + ImageHeader::SIZE + index as usize * RawEntry::SIZE;
        let record = self.data.get(start..start + RawEntry::SIZE)?;
        RawEntry::read_from(&mut Cursor::new(record)).ok()
    }

    /// Decode a raw record into a [`DirectoryEntry`].
    ///
    /// The absolute payload offset is resolved against the base offset.
    pub fn decode_entry(&self, index: u32, raw: &RawEntry) -> Result<DirectoryEntry, EntryError> {
        let name = raw.decode_name()?;
        let entry = DirectoryEntry {
            index,
            name,
            size: raw.size,
            payload_offset: raw.relative_offset,
            data_offset: self.base as u64 + raw.relative_offset as u64,
        };
        debug!(
            index,
            name = %entry.name,
            size = entry.size,
            offset = entry.data_offset,
            "decoded entry"
        );
        Ok(entry)
    }

    /// Iterate over the entry table in table order.
    ///
    /// Each item pairs the raw record with its decoded form, so callers can
    /// still name an entry whose name failed to decode.
    pub fn entries(&self) -> impl Iterator<Item = (RawEntry, Result<DirectoryEntry, EntryError>)> + '_ {
        (0..self.header.entry_count).filter_map(move |index| {
            let raw = self.raw_entry(index)?;
            let decoded = self.decode_entry(index, &raw);
            Some((raw, decoded))
        })
    }

    /// Borrow the compressed payload of `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::PayloadOutOfBounds`] if the payload range does
    /// not lie entirely inside the source buffer.
    pub fn payload(&self, entry: &DirectoryEntry) -> Result<&'a [u8], EntryError> {
        let out_of_bounds = || EntryError::PayloadOutOfBounds {
            offset: entry.data_offset,
            size: entry.size,
            len: self.data.len(),
        };

        let start = usize::try_from(entry.data_offset).map_err(|_| out_of_bounds())?;
        let end = start
            .checked_add(entry.size as usize)
            .ok_or_else(out_of_bounds)?;
        self.data.get(start..end).ok_or_else(out_of_bounds)
    }
}

/// Find the earliest occurrence of the OWFS magic in `data`.
pub fn find_signature(data: &[u8]) -> Option<usize> {
    data.windows(MAGIC_SIZE).position(|window| window == MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(entries: &[(&str, u32, u32)], prefix: usize, tail: usize) -> Vec<u8> {
        let mut data = vec![0xAAu8; prefix];
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        for (name, size, offset) in entries {
            let mut raw = [0u8; FILE_NAME_MAX_SIZE];
            raw[..name.len()].copy_from_slice(name.as_bytes());
            data.extend_from_slice(&raw);
            data.extend_from_slice(&size.to_be_bytes());
            data.extend_from_slice(&offset.to_be_bytes());
        }
        data.extend(std::iter::repeat_n(0u8, tail));
        data
    }

    #[test]
    fn no_signature() {
        let data = b"owowowow but not a real image".to_vec();
        assert!(matches!(
            OwfsParser::new(&data),
            Err(ImageError::SignatureNotFound)
        ));
        assert!(matches!(
            OwfsParser::new(&[]),
            Err(ImageError::SignatureNotFound)
        ));
    }

    #[test]
    fn signature_followed_by_short_header() {
        let mut data = vec![1, 2, 3];
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&[0u8; 11]);
        assert!(matches!(
            OwfsParser::new(&data),
            Err(ImageError::TruncatedHeader {
                offset: 3,
                available: 43,
                ..
            })
        ));
    }

    #[test]
    fn earliest_signature_wins() {
        let mut data = image(&[], 5, 0);
        let second = data.clone();
        data.extend_from_slice(&second);
        let parser = OwfsParser::new(&data).unwrap();
        assert_eq!(parser.base_offset(), 5);
    }

    #[test]
    fn entry_count_larger_than_buffer() {
        let mut data = image(&[("a", 1, 0)], 0, 0);
        // Claim two entries while only one record is present
        data[MAGIC_SIZE + 7] = 2;
        assert!(matches!(
            OwfsParser::new(&data),
            Err(ImageError::TruncatedEntryTable { entry_count: 2, .. })
        ));
    }

    #[test]
    fn offsets_are_relative_to_base() {
        let data = image(&[("a", 4, 140), ("b", 2, 144)], 16, 8);
        let parser = OwfsParser::new(&data).unwrap();
        assert_eq!(parser.header().version, 3);
        assert_eq!(parser.len(), 2);

        let entries: Vec<_> = parser.entries().map(|(_, e)| e.unwrap()).collect();
        assert_eq!(entries[0].name, "a");
        assert_eq!(entries[0].data_offset, 16 + 140);
        assert_eq!(entries[1].data_offset, 16 + 144);
        assert_eq!(parser.payload(&entries[0]).unwrap().len(), 4);
        assert_eq!(parser.payload(&entries[1]).unwrap().len(), 2);
    }

    #[test]
    fn payload_past_end_is_rejected() {
        let data = image(&[("a", 100, 92), ("b", u32::MAX, u32::MAX)], 0, 4);
        let parser = OwfsParser::new(&data).unwrap();
        for (_, entry) in parser.entries() {
            let entry = entry.unwrap();
            assert!(matches!(
                parser.payload(&entry),
                Err(EntryError::PayloadOutOfBounds { .. })
            ));
        }
    }
}
