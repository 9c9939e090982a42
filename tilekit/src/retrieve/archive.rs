//! Minimal ZIP reader for archive-packaged tiles.
//!
//! Some tile servers deliver each tile inside a ZIP archive. Only what that
//! needs is supported: locating an entry through the central directory and
//! inflating it when it is stored or deflated. Multi-disk and ZIP64 archives
//! are rejected.

use std::io::Read;

use bytes::Bytes;
use flate2::read::DeflateDecoder;
use flate2::Crc;

use super::error::RetrievalError;

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_SIGNATURE: u32 = 0x0403_4b50;
const EOCD_LEN: usize = 22;
const CENTRAL_HEADER_LEN: usize = 46;
const LOCAL_HEADER_LEN: usize = 30;
const MAX_COMMENT_LEN: usize = u16::MAX as usize;
/// Upper bound on buffer space reserved up front from a header's size field.
const MAX_PREALLOC: usize = 4 * 1024 * 1024;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// Content types treated as ZIP archives.
pub const ARCHIVE_CONTENT_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

/// Whether `content_type` names a ZIP archive. Parameters are ignored.
pub fn is_archive_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    ARCHIVE_CONTENT_TYPES.contains(&essence.as_str())
}

#[derive(Debug, Clone)]
struct CentralEntry {
    name: String,
    method: u16,
    crc32: u32,
    compressed_size: usize,
    uncompressed_size: usize,
    local_offset: usize,
}

/// Names of all entries in the archive, in directory order.
pub fn entry_names(archive: &[u8]) -> Result<Vec<String>, RetrievalError> {
    Ok(central_directory(archive)?
        .into_iter()
        .map(|e| e.name)
        .collect())
}

/// Extract the bytes of the entry called `name`.
pub fn extract_entry(archive: &[u8], name: &str) -> Result<Bytes, RetrievalError> {
    let entry = central_directory(archive)?
        .into_iter()
        .find(|e| e.name == name)
        .ok_or_else(|| RetrievalError::ArchiveEntryNotFound(name.to_string()))?;

    let local = entry.local_offset;
    if read_u32(archive, local)? != LOCAL_SIGNATURE {
        return Err(invalid("bad local header signature"));
    }
    let name_len = read_u16(archive, local + 26)? as usize;
    let extra_len = read_u16(archive, local + 28)? as usize;
    let start = local + LOCAL_HEADER_LEN + name_len + extra_len;
    let compressed = archive
        .get(start..start + entry.compressed_size)
        .ok_or_else(|| invalid("entry data out of bounds"))?;

    let data = match entry.method {
        METHOD_STORED => compressed.to_vec(),
        METHOD_DEFLATED => {
            // One byte past the declared size is enough to detect a lying header
            let limit = entry.uncompressed_size as u64 + 1;
            let mut out = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC));
            DeflateDecoder::new(compressed)
                .take(limit)
                .read_to_end(&mut out)
                .map_err(|e| invalid(&format!("inflate failed: {}", e)))?;
            out
        }
        other => {
            return Err(invalid(&format!("unsupported compression method {}", other)));
        }
    };

    if data.len() != entry.uncompressed_size {
        return Err(invalid("entry size mismatch"));
    }
    let mut crc = Crc::new();
    crc.update(&data);
    if crc.sum() != entry.crc32 {
        return Err(invalid("entry checksum mismatch"));
    }

    Ok(Bytes::from(data))
}

fn central_directory(archive: &[u8]) -> Result<Vec<CentralEntry>, RetrievalError> {
    let eocd = find_eocd(archive)?;
    let disk = read_u16(archive, eocd + 4)?;
    let cd_disk = read_u16(archive, eocd + 6)?;
    if disk != 0 || cd_disk != 0 {
        return Err(invalid("multi-disk archives are not supported"));
    }
    let count = read_u16(archive, eocd + 10)? as usize;
    let cd_offset = read_u32(archive, eocd + 16)? as usize;
    if cd_offset == u32::MAX as usize {
        return Err(invalid("ZIP64 archives are not supported"));
    }

    let mut entries = Vec::with_capacity(count);
    let mut pos = cd_offset;
    for _ in 0..count {
        if read_u32(archive, pos)? != CENTRAL_SIGNATURE {
            return Err(invalid("bad central directory signature"));
        }
        let name_len = read_u16(archive, pos + 28)? as usize;
        let extra_len = read_u16(archive, pos + 30)? as usize;
        let comment_len = read_u16(archive, pos + 32)? as usize;
        let name_start = pos + CENTRAL_HEADER_LEN;
        let name = archive
            .get(name_start..name_start + name_len)
            .ok_or_else(|| invalid("entry name out of bounds"))?;

        entries.push(CentralEntry {
            name: String::from_utf8_lossy(name).into_owned(),
            method: read_u16(archive, pos + 10)?,
            crc32: read_u32(archive, pos + 16)?,
            compressed_size: read_u32(archive, pos + 20)? as usize,
            uncompressed_size: read_u32(archive, pos + 24)? as usize,
            local_offset: read_u32(archive, pos + 42)? as usize,
        });

        pos = name_start + name_len + extra_len + comment_len;
    }

    Ok(entries)
}

fn find_eocd(archive: &[u8]) -> Result<usize, RetrievalError> {
    if archive.len() < EOCD_LEN {
        return Err(invalid("too short"));
    }
    let last = archive.len() - EOCD_LEN;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    (first..=last)
        .rev()
        .find(|&pos| read_u32(archive, pos).ok() == Some(EOCD_SIGNATURE))
        .ok_or_else(|| invalid("end of central directory not found"))
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16, RetrievalError> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| invalid("truncated"))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, RetrievalError> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| invalid("truncated"))
}

fn invalid(reason: &str) -> RetrievalError {
    RetrievalError::Archive(reason.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Build a single-disk ZIP archive.
    pub(crate) fn build_zip(entries: &[(&str, &[u8])], deflate: bool) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for (name, data) in entries {
            let mut crc = Crc::new();
            crc.update(data);
            let (method, payload) = if deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                (METHOD_DEFLATED, encoder.finish().unwrap())
            } else {
                (METHOD_STORED, data.to_vec())
            };

            let offset = out.len() as u32;
            out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&crc.sum().to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&payload);

            central.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&20u16.to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes());
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0; 4]);
            central.extend_from_slice(&crc.sum().to_le_bytes());
            central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0; 12]);
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_extract_stored_entry() {
        let zip = build_zip(&[("a.txt", b"first"), ("tile.png", b"pixels")], false);
        assert_eq!(&extract_entry(&zip, "tile.png").unwrap()[..], b"pixels");
    }

    #[test]
    fn test_extract_deflated_entry() {
        let data = vec![7u8; 4096];
        let zip = build_zip(&[("tile.bin", &data)], true);
        assert_eq!(extract_entry(&zip, "tile.bin").unwrap().to_vec(), data);
    }

    #[test]
    fn test_entry_names() {
        let zip = build_zip(&[("a", b"1"), ("b/c", b"2")], false);
        assert_eq!(entry_names(&zip).unwrap(), vec!["a", "b/c"]);
    }

    #[test]
    fn test_missing_entry() {
        let zip = build_zip(&[("a", b"1")], false);
        assert_eq!(
            extract_entry(&zip, "b"),
            Err(RetrievalError::ArchiveEntryNotFound("b".to_string()))
        );
    }

    #[test]
    fn test_corrupt_checksum() {
        let mut zip = build_zip(&[("a", b"hello")], false);
        // Flip a payload byte: local header (30) + name (1)
        zip[31] ^= 0xff;
        assert!(matches!(extract_entry(&zip, "a"), Err(RetrievalError::Archive(_))));
    }

    /// Overwrite the first central directory entry's uncompressed size.
    fn declare_uncompressed_size(zip: &mut [u8], size: u32) {
        let eocd = zip.len() - EOCD_LEN;
        let cd = read_u32(zip, eocd + 16).unwrap() as usize;
        zip[cd + 24..cd + 28].copy_from_slice(&size.to_le_bytes());
    }

    #[test]
    fn test_oversized_declared_size() {
        let data = vec![3u8; 512];
        let mut zip = build_zip(&[("tile.bin", &data[..])], true);
        declare_uncompressed_size(&mut zip, u32::MAX);
        assert_eq!(
            extract_entry(&zip, "tile.bin"),
            Err(RetrievalError::Archive("entry size mismatch".to_string()))
        );
    }

    #[test]
    fn test_inflate_stops_past_declared_size() {
        let data = vec![3u8; 1 << 20];
        let mut zip = build_zip(&[("tile.bin", &data[..])], true);
        declare_uncompressed_size(&mut zip, 16);
        assert_eq!(
            extract_entry(&zip, "tile.bin"),
            Err(RetrievalError::Archive("entry size mismatch".to_string()))
        );
    }

    #[test]
    fn test_not_an_archive() {
        assert!(matches!(
            extract_entry(b"definitely not a zip file", "a"),
            Err(RetrievalError::Archive(_))
        ));
    }

    #[test]
    fn test_archive_content_types() {
        assert!(is_archive_content_type("application/zip"));
        assert!(is_archive_content_type("Application/X-Zip-Compressed; charset=binary"));
        assert!(!is_archive_content_type("image/png"));
    }
}
