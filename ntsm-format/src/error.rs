//! Error types for NTSM encoding and decoding.

use std::fmt;

use thiserror::Error;

/// A region of an NTSM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Glb,
    Particles,
    TextureTable,
    /// Blob referenced by the texture table entry at this index
    TextureBlob(usize),
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => f.write_str("header"),
            Section::Glb => f.write_str("GLB section"),
            Section::Particles => f.write_str("particle section"),
            Section::TextureTable => f.write_str("texture table"),
            Section::TextureBlob(index) => write!(f, "texture blob #{index}"),
        }
    }
}

/// Every way an NTSM file (or the inputs to build one) can be rejected.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Short header or wrong magic bytes
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Unsupported NTSM version: {0} (only version 1 is supported)")]
    UnsupportedVersion(u32),

    /// The has_particles flag disagrees with the particle section
    #[error("Inconsistent flags {flags:#04x} (particle size {particle_size}): {reason}")]
    InconsistentFlags {
        flags: u8,
        particle_size: u32,
        reason: &'static str,
    },

    #[error("Invalid GLB section: {0}")]
    InvalidGlbSection(String),

    #[error("Invalid texture table: {0}")]
    InvalidTextureTable(String),

    /// A section's declared size runs past the bytes that are actually available
    #[error(
        "Truncated {section}: {size} bytes declared at offset {offset}, only {available} available"
    )]
    TruncatedSection {
        section: Section,
        offset: u64,
        size: u64,
        available: u64,
    },

    #[error("Section overlap: {first} overlaps {second}")]
    SectionOverlap { first: Section, second: Section },

    /// A section would end beyond what a u32 offset can address
    #[error("{section} does not fit in a 32-bit file ({size} bytes)")]
    SizeOverflow { section: Section, size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless discriminant of [`FormatError`], for matching on the violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedHeader,
    UnsupportedVersion,
    InconsistentFlags,
    InvalidGlbSection,
    InvalidTextureTable,
    TruncatedSection,
    SectionOverlap,
    SizeOverflow,
    Io,
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::MalformedHeader(_) => ErrorKind::MalformedHeader,
            FormatError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            FormatError::InconsistentFlags { .. } => ErrorKind::InconsistentFlags,
            FormatError::InvalidGlbSection(_) => ErrorKind::InvalidGlbSection,
            FormatError::InvalidTextureTable(_) => ErrorKind::InvalidTextureTable,
            FormatError::TruncatedSection { .. } => ErrorKind::TruncatedSection,
            FormatError::SectionOverlap { .. } => ErrorKind::SectionOverlap,
            FormatError::SizeOverflow { .. } => ErrorKind::SizeOverflow,
            FormatError::Io(_) => ErrorKind::Io,
        }
    }

    /// Map an I/O failure while reading `section` to the format error it stands for.
    ///
    /// Running out of input is a truncated section, anything else stays an I/O error.
    pub(crate) fn from_read(
        err: std::io::Error,
        section: Section,
        offset: u64,
        size: u64,
        available: u64,
    ) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            FormatError::TruncatedSection {
                section,
                offset,
                size,
                available,
            }
        } else {
            FormatError::Io(err)
        }
    }
}

/// Convenience `Result` alias using [`FormatError`].
pub type Result<T> = std::result::Result<T, FormatError>;
