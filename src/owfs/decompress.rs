use std::io::BufReader;

use lzma_rs::error::Error as LzmaError;

/// XZ container magic bytes
pub const XZ_MAGIC: &[u8] = &[0xFD, b'7', b'z', b'X', b'Z', 0x00];

/// Payload container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Xz,
    /// Legacy `.lzma` stream (LZMA-alone header)
    LzmaAlone,
}

impl PayloadFormat {
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(XZ_MAGIC) {
            PayloadFormat::Xz
        } else {
            PayloadFormat::LzmaAlone
        }
    }
}

/// Decompress one payload, auto-detecting XZ or LZMA-alone framing.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, LzmaError> {
    let mut reader = BufReader::new(data);
    let mut out = Vec::new();
    match PayloadFormat::detect(data) {
        PayloadFormat::Xz => lzma_rs::xz_decompress(&mut reader, &mut out)?,
        PayloadFormat::LzmaAlone => lzma_rs::lzma_decompress(&mut reader, &mut out)?,
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_xz_magic() {
        let mut xz = Vec::new();
        lzma_rs::xz_compress(&mut &b"payload"[..], &mut xz).unwrap();
        assert_eq!(PayloadFormat::detect(&xz), PayloadFormat::Xz);
        assert_eq!(decompress(&xz).unwrap(), b"payload");
    }

    #[test]
    fn falls_back_to_lzma_alone() {
        let mut lzma = Vec::new();
        lzma_rs::lzma_compress(&mut &b"payload"[..], &mut lzma).unwrap();
        assert_eq!(PayloadFormat::detect(&lzma), PayloadFormat::LzmaAlone);
        assert_eq!(decompress(&lzma).unwrap(), b"payload");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decompress(b"garbage").is_err());
        assert!(decompress(&[]).is_err());
    }
}
