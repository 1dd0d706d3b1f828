//! Binary serialization trait for fixed-size NTSM records.
//!
//! The header, particle emitter records and texture table entries all have a
//! fixed on-disk size. `BinarySerializable` gives generic code a single way to
//! size, write and parse them, while each type keeps its own `to_bytes()`
//! returning a fixed-size array.

use crate::error::{FormatError, Result, Section};
use crate::header::NtsmHeader;
use crate::particle::ParticleEmitter;
use crate::texture::TextureTableEntry;

/// Trait for fixed-size binary records.
///
/// # Example
///
/// ```
/// use ntsm_format::{BinarySerializable, TextureTableEntry};
///
/// let entry = TextureTableEntry::new("spark", 256, 4096);
/// let bytes = entry.serialize();
/// assert_eq!(bytes.len(), <TextureTableEntry as BinarySerializable>::SIZE);
///
/// let parsed = TextureTableEntry::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, entry);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Section reported when a sequence of these records is cut short.
    const SECTION: Section;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from the first `SIZE` bytes of `bytes`.
    fn deserialize(bytes: &[u8]) -> Result<Self>;
}

impl BinarySerializable for NtsmHeader {
    const SIZE: usize = Self::SIZE;
    const SECTION: Section = Section::Header;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for ParticleEmitter {
    const SIZE: usize = Self::SIZE;
    const SECTION: Section = Section::Particles;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for TextureTableEntry {
    const SIZE: usize = Self::SIZE;
    const SECTION: Section = Section::TextureTable;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

/// Concatenate records in order.
pub fn write_records<T: BinarySerializable>(records: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * T::SIZE);
    for record in records {
        out.extend_from_slice(&record.serialize());
    }
    out
}

/// Parse exactly `count` consecutive records from the start of `bytes`.
///
/// `offset` is the file position of `bytes`, used only for error reporting.
pub fn read_records<T: BinarySerializable>(
    bytes: &[u8],
    count: usize,
    offset: u64,
) -> Result<Vec<T>> {
    let needed = count as u64 * T::SIZE as u64;
    if (bytes.len() as u64) < needed {
        return Err(FormatError::TruncatedSection {
            section: T::SECTION,
            offset,
            size: needed,
            available: bytes.len() as u64,
        });
    }
    bytes
        .chunks_exact(T::SIZE)
        .take(count)
        .map(T::deserialize)
        .collect()
}
