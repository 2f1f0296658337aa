//! Binary Emitter - Wire Format and Atomic Writes
//!
//! Artifact layout, all fields little-endian:
//!
//! ```text
//! u32 content_size
//! u32 layout_count
//! byte[content_size] content          // normalized UTF-8 text
//! byte[pad] zero-fill to 4-byte boundary
//! layout_count x descriptor:
//!     u32 id_hash
//!     u32 offset
//!     u32 size
//!     u32 area_count
//!     u32 placeholder_count
//!     placeholder_count x placeholder:
//!         u32 name_length
//!         byte[name_length] name      // UTF-8, no terminator
//!         u32 offset
//!         u32 length
//! ```
//!
//! The firmware reads this blob directly; field order, width and
//! endianness are the compatibility contract. Files are written to a
//! temporary in the destination directory and renamed into place, so a
//! failed compile never leaves a truncated artifact behind.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{CompileError, Result};
use crate::placeholder::Placeholder;
use crate::table::LayoutDescriptor;

/// Header: `content_size` + `layout_count`.
pub const HEADER_SIZE: usize = 8;
/// Content is zero-padded to this boundary before the table begins.
pub const CONTENT_ALIGN: usize = 4;

/// A decoded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: Vec<u8>,
    pub table: Vec<LayoutDescriptor>,
}

/// Serialize content and descriptor table into the artifact blob.
pub fn encode(content: &[u8], table: &[LayoutDescriptor]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + content.len() + 64 * table.len());
    buf.extend_from_slice(&(content.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(table.len() as u32).to_le_bytes());
    buf.extend_from_slice(content);
    while buf.len() % CONTENT_ALIGN != 0 {
        buf.push(0);
    }
    for entry in table {
        buf.extend_from_slice(&entry.id_hash.to_le_bytes());
        buf.extend_from_slice(&entry.offset.to_le_bytes());
        buf.extend_from_slice(&entry.size.to_le_bytes());
        buf.extend_from_slice(&entry.area_count.to_le_bytes());
        buf.extend_from_slice(&(entry.placeholders.len() as u32).to_le_bytes());
        for ph in &entry.placeholders {
            buf.extend_from_slice(&(ph.name.len() as u32).to_le_bytes());
            buf.extend_from_slice(ph.name.as_bytes());
            buf.extend_from_slice(&ph.offset.to_le_bytes());
            buf.extend_from_slice(&ph.length.to_le_bytes());
        }
    }
    buf
}

/// Decode an artifact blob back into content and descriptor table.
///
/// Performs the same bounds checks the firmware does before trusting the
/// table; trailing bytes after the table (linker alignment) are ignored.
pub fn decode(bytes: &[u8]) -> Result<Artifact> {
    let mut r = Reader::new(bytes);
    let content_size = r.u32()? as usize;
    let layout_count = r.u32()? as usize;
    let content = r.take(content_size, "content")?.to_vec();
    let padding = (CONTENT_ALIGN - content_size % CONTENT_ALIGN) % CONTENT_ALIGN;
    r.take(padding, "alignment padding")?;

    let mut table = Vec::with_capacity(layout_count);
    for _ in 0..layout_count {
        let id_hash = r.u32()?;
        let offset = r.u32()?;
        let size = r.u32()?;
        if (offset as usize) > content_size || (offset as usize) + (size as usize) > content_size {
            return Err(CompileError::MalformedArtifact(format!(
                "descriptor range {}..{} outside content of {} bytes",
                offset,
                u64::from(offset) + u64::from(size),
                content_size
            )));
        }
        let area_count = r.u32()?;
        let placeholder_count = r.u32()? as usize;
        let mut placeholders = Vec::with_capacity(placeholder_count);
        for _ in 0..placeholder_count {
            let name_length = r.u32()? as usize;
            let name_bytes = r.take(name_length, "placeholder name")?;
            let name = String::from_utf8(name_bytes.to_vec()).map_err(|_| {
                CompileError::MalformedArtifact("placeholder name is not UTF-8".to_string())
            })?;
            placeholders.push(Placeholder {
                name,
                offset: r.u32()?,
                length: r.u32()?,
            });
        }
        table.push(LayoutDescriptor {
            id_hash,
            offset,
            size,
            area_count,
            placeholders,
        });
    }

    Ok(Artifact { content, table })
}

/// Write the artifact atomically: temp file in the destination
/// directory, then rename over the final path.
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|source| CompileError::Serialization { source })?;
    tmp.write_all(bytes)
        .map_err(|source| CompileError::Serialization { source })?;
    tmp.persist(path)
        .map_err(|e| CompileError::Serialization { source: e.error })?;
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(CompileError::MalformedArtifact(format!(
                "truncated while reading {what} at byte {}",
                self.pos
            ))),
        }
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4, "u32 field")?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Vec<LayoutDescriptor> {
        vec![
            LayoutDescriptor {
                id_hash: 0xDEAD_BEEF,
                offset: 0,
                size: 10,
                area_count: 0,
                placeholders: vec![],
            },
            LayoutDescriptor {
                id_hash: 1,
                offset: 10,
                size: 7,
                area_count: 2,
                placeholders: vec![Placeholder {
                    name: "name".to_string(),
                    offset: 12,
                    length: 5,
                }],
            },
        ]
    }

    #[test]
    fn test_header_layout() {
        let blob = encode(b"0123456789abcdefg", &sample_table());
        assert_eq!(&blob[0..4], &17u32.to_le_bytes());
        assert_eq!(&blob[4..8], &2u32.to_le_bytes());
        // 17 content bytes pad to 20; table starts 4-byte aligned.
        assert_eq!(&blob[8 + 17..8 + 20], &[0, 0, 0]);
        assert_eq!(&blob[28..32], &0xDEAD_BEEFu32.to_le_bytes());
    }

    #[test]
    fn test_aligned_content_gets_no_padding() {
        let blob = encode(b"12345678", &[]);
        assert_eq!(blob.len(), HEADER_SIZE + 8);
    }

    #[test]
    fn test_round_trip() {
        let content = b"0123456789ab $name xx";
        let table = vec![LayoutDescriptor {
            id_hash: 42,
            offset: 0,
            size: content.len() as u32,
            area_count: 1,
            placeholders: vec![Placeholder {
                name: "name".to_string(),
                offset: 13,
                length: 5,
            }],
        }];
        let decoded = decode(&encode(content, &table)).unwrap();
        assert_eq!(decoded.content, content);
        assert_eq!(decoded.table, table);
    }

    #[test]
    fn test_truncated_rejected() {
        let blob = encode(b"0123456789abcdefg", &sample_table());
        let err = decode(&blob[..blob.len() - 2]).unwrap_err();
        assert!(matches!(err, CompileError::MalformedArtifact(_)));
    }

    #[test]
    fn test_out_of_range_descriptor_rejected() {
        let table = vec![LayoutDescriptor {
            id_hash: 1,
            offset: 4,
            size: 10,
            area_count: 0,
            placeholders: vec![],
        }];
        let err = decode(&encode(b"short", &table)).unwrap_err();
        assert!(matches!(err, CompileError::MalformedArtifact(_)));
    }

    #[test]
    fn test_huge_descriptor_range_rejected() {
        // offset + size near u32::MAX must not wrap while reporting.
        let table = vec![LayoutDescriptor {
            id_hash: 1,
            offset: u32::MAX,
            size: u32::MAX,
            area_count: 0,
            placeholders: vec![],
        }];
        let err = decode(&encode(b"abcd", &table)).unwrap_err();
        assert!(matches!(err, CompileError::MalformedArtifact(_)));
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let mut blob = encode(b"0123", &[]);
        blob.extend_from_slice(&[0, 0, 0]);
        assert!(decode(&blob).is_ok());
    }
}
