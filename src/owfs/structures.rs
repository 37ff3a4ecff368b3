use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use super::error::{EntryError, ImageError};

/// OWFS magic signature: "ow" repeated 16 times.
pub const MAGIC: &[u8; MAGIC_SIZE] = b"owowowowowowowowowowowowowowowow";
pub const MAGIC_SIZE: usize = 32;

/// Maximum length of an entry name in raw bytes, including NUL padding.
pub const FILE_NAME_MAX_SIZE: usize = 40;

/// Image header - 44 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: [u8; MAGIC_SIZE],
    pub version: u32,
    pub entry_count: u32,
}

impl ImageHeader {
    pub const SIZE: usize = MAGIC_SIZE + 4 + 4 + 4;

    /// Parse a header from bytes starting at `offset` in the source buffer.
    ///
    /// `offset` is only used for error reporting; `data` must begin with the
    /// header itself.
    pub fn from_bytes(data: &[u8], offset: usize) -> Result<Self, ImageError> {
        if data.len() < Self::SIZE {
            return Err(ImageError::TruncatedHeader {
                offset,
                available: data.len(),
                needed: Self::SIZE,
            });
        }

        let mut magic = [0u8; MAGIC_SIZE];
        magic.copy_from_slice(&data[..MAGIC_SIZE]);
        if &magic != MAGIC {
            return Err(ImageError::BadMagic { offset });
        }

        let mut cursor = Cursor::new(&data[MAGIC_SIZE..Self::SIZE]);
        let truncated = |_| ImageError::TruncatedHeader {
            offset,
            available: data.len(),
            needed: Self::SIZE,
        };

        let version = cursor.read_u32::<BigEndian>().map_err(truncated)?;
        let entry_count = cursor.read_u32::<BigEndian>().map_err(truncated)?;
        // Meaning unknown, parsed and ignored
        let _reserved = cursor.read_u32::<BigEndian>().map_err(truncated)?;

        Ok(Self {
            magic,
            version,
            entry_count,
        })
    }

    /// Total size of the entry table that follows the header.
    pub fn table_size(&self) -> u64 {
        self.entry_count as u64 * RawEntry::SIZE as u64
    }
}

/// One directory table record as stored on disk - 48 bytes
///
/// The name is kept raw so a malformed name only fails its own entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: [u8; FILE_NAME_MAX_SIZE],
    pub size: u32,
    pub relative_offset: u32,
}

impl RawEntry {
    pub const SIZE: usize = FILE_NAME_MAX_SIZE + 4 + 4;

    pub fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut name = [0u8; FILE_NAME_MAX_SIZE];
        reader.read_exact(&mut name)?;
        let size = reader.read_u32::<BigEndian>()?;
        let relative_offset = reader.read_u32::<BigEndian>()?;
        Ok(Self {
            name,
            size,
            relative_offset,
        })
    }

    /// Decode the name: every NUL byte is dropped, the rest must be UTF-8.
    pub fn decode_name(&self) -> Result<String, EntryError> {
        let bytes: Vec<u8> = self.name.iter().copied().filter(|&b| b != 0).collect();
        String::from_utf8(bytes).map_err(|e| EntryError::InvalidFilename(e.utf8_error()))
    }

    /// Best-effort name for progress output, also for undecodable names.
    pub fn display_name(&self) -> String {
        let bytes: Vec<u8> = self.name.iter().copied().filter(|&b| b != 0).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Decoded directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Position of the record in the entry table.
    pub index: u32,
    pub name: String,
    /// Compressed payload length in bytes.
    pub size: u32,
    /// Payload offset relative to the image base offset.
    pub payload_offset: u32,
    /// Absolute payload offset in the source buffer.
    pub data_offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u32, count: u32, reserved: u32) -> Vec<u8> {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&version.to_be_bytes());
        data.extend_from_slice(&count.to_be_bytes());
        data.extend_from_slice(&reserved.to_be_bytes());
        data
    }

    #[test]
    fn header_fields_are_big_endian() {
        let data = header_bytes(0x0102_0304, 7, 0xdead_beef);
        let header = ImageHeader::from_bytes(&data, 0).unwrap();
        assert_eq!(header.version, 0x0102_0304);
        assert_eq!(header.entry_count, 7);
        assert_eq!(header.table_size(), 7 * 48);
    }

    #[test]
    fn header_rejects_wrong_magic() {
        let mut data = header_bytes(1, 1, 0);
        data[5] = b'x';
        assert!(matches!(
            ImageHeader::from_bytes(&data, 16),
            Err(ImageError::BadMagic { offset: 16 })
        ));
    }

    #[test]
    fn header_rejects_short_input() {
        let data = header_bytes(1, 1, 0);
        assert!(matches!(
            ImageHeader::from_bytes(&data[..43], 0),
            Err(ImageError::TruncatedHeader {
                available: 43,
                needed: 44,
                ..
            })
        ));
    }

    #[test]
    fn name_strips_all_nul_bytes() {
        let mut name = [0u8; FILE_NAME_MAX_SIZE];
        name[..3].copy_from_slice(b"etc");
        name[5..9].copy_from_slice(b"/rc\0");
        let entry = RawEntry {
            name,
            size: 0,
            relative_offset: 0,
        };
        assert_eq!(entry.decode_name().unwrap(), "etc/rc");
    }

    #[test]
    fn name_must_be_utf8() {
        let mut name = [0u8; FILE_NAME_MAX_SIZE];
        name[..4].copy_from_slice(&[b'a', 0xff, 0xfe, b'b']);
        let entry = RawEntry {
            name,
            size: 0,
            relative_offset: 0,
        };
        assert!(matches!(
            entry.decode_name(),
            Err(EntryError::InvalidFilename(_))
        ));
        assert_eq!(entry.display_name(), "a\u{fffd}\u{fffd}b");
    }

    #[test]
    fn raw_entry_reads_48_bytes() {
        let mut data = vec![0u8; FILE_NAME_MAX_SIZE];
        data[..4].copy_from_slice(b"init");
        data.extend_from_slice(&17u32.to_be_bytes());
        data.extend_from_slice(&0x100u32.to_be_bytes());
        let entry = RawEntry::read_from(&mut Cursor::new(&data)).unwrap();
        assert_eq!(entry.size, 17);
        assert_eq!(entry.relative_offset, 0x100);
        assert_eq!(entry.decode_name().unwrap(), "init");
    }
}
