//! Texture table (72 bytes per entry) and embedded texture blobs
//!
//! # Layout
//! ```text
//! entry:
//!   0x00: name [u8; 64] (UTF-8, NUL-padded, at most 63 bytes of text)
//!   0x40: size u32   (blob length in bytes)
//!   0x44: offset u32 (file-relative blob position)
//! ```
//!
//! The table is followed by the blobs in table order. Blob contents are opaque
//! (typically PNG or KTX2 bytes) and are read on demand by the decoders.

use crate::bytes::{get_name, get_u32, put_name, put_u32, truncate_name};
use crate::error::{FormatError, Result, Section};
use crate::format::{TEXTURE_ENTRY_SIZE, TEXTURE_NAME_SIZE};
use crate::layout::Span;
use crate::serialization::read_records;

const OFF_NAME: usize = 0;
const OFF_SIZE: usize = 64;
const OFF_OFFSET: usize = 68;

/// One texture table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureTableEntry {
    pub name: String,
    /// Blob length in bytes
    pub size: u32,
    /// File-relative blob offset
    pub offset: u32,
}

impl TextureTableEntry {
    pub const SIZE: usize = TEXTURE_ENTRY_SIZE;

    pub fn new(name: &str, size: u32, offset: u32) -> Self {
        Self {
            name: truncate_name(name, TEXTURE_NAME_SIZE - 1).to_string(),
            size,
            offset,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.offset as u64, self.size as u64)
    }

    /// Write entry to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        put_name(&mut bytes, OFF_NAME, TEXTURE_NAME_SIZE, &self.name);
        put_u32(&mut bytes, OFF_SIZE, self.size);
        put_u32(&mut bytes, OFF_OFFSET, self.offset);
        bytes
    }

    /// Read entry from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::TruncatedSection {
                section: Section::TextureTable,
                offset: 0,
                size: Self::SIZE as u64,
                available: bytes.len() as u64,
            });
        }
        Ok(Self {
            name: get_name(bytes, OFF_NAME, TEXTURE_NAME_SIZE),
            size: get_u32(bytes, OFF_SIZE),
            offset: get_u32(bytes, OFF_OFFSET),
        })
    }
}

/// An embedded texture: a name plus its opaque blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub data: Vec<u8>,
}

impl Texture {
    /// The name is truncated to what a table entry can hold.
    pub fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: truncate_name(name, TEXTURE_NAME_SIZE - 1).to_string(),
            data,
        }
    }
}

/// Encode the texture table followed by the blobs it references.
///
/// `table_offset` is where the table will land in the file. Entries must
/// describe the blobs in order and place them contiguously right after the
/// table; anything else is rejected before a byte is produced.
pub fn encode_table(
    entries: &[TextureTableEntry],
    blobs: &[&[u8]],
    table_offset: u32,
) -> Result<Vec<u8>> {
    if entries.len() != blobs.len() {
        return Err(FormatError::InvalidTextureTable(format!(
            "{} entries for {} blobs",
            entries.len(),
            blobs.len()
        )));
    }

    let mut expected_offset = table_offset as u64 + (entries.len() * TEXTURE_ENTRY_SIZE) as u64;
    for (index, (entry, blob)) in entries.iter().zip(blobs).enumerate() {
        if entry.size as usize != blob.len() {
            return Err(FormatError::InvalidTextureTable(format!(
                "entry #{index} '{}' declares {} bytes but blob has {}",
                entry.name,
                entry.size,
                blob.len()
            )));
        }
        if entry.offset as u64 != expected_offset {
            return Err(FormatError::InvalidTextureTable(format!(
                "entry #{index} '{}' at offset {}, expected {expected_offset}",
                entry.name, entry.offset
            )));
        }
        expected_offset += entry.size as u64;
    }

    let total = expected_offset - table_offset as u64;
    let mut out = Vec::with_capacity(total as usize);
    for entry in entries {
        out.extend_from_slice(&entry.to_bytes());
    }
    for blob in blobs {
        out.extend_from_slice(blob);
    }
    Ok(out)
}

/// Decode `count` table entries and check each blob lies within `file_len`.
///
/// Blob bytes are not touched; callers read them lazily by entry.
pub fn decode_table(
    table_bytes: &[u8],
    count: u32,
    table_offset: u64,
    file_len: u64,
) -> Result<Vec<TextureTableEntry>> {
    let entries: Vec<TextureTableEntry> =
        read_records(table_bytes, count as usize, table_offset)?;

    for (index, entry) in entries.iter().enumerate() {
        if !entry.span().fits_within(file_len) {
            return Err(FormatError::InvalidTextureTable(format!(
                "entry #{index} '{}' spans {}..{} past end of file ({file_len} bytes)",
                entry.name,
                entry.offset,
                entry.span().end()
            )));
        }
    }
    Ok(entries)
}
