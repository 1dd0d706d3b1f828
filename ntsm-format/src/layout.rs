//! Section layout planning.
//!
//! Sections are packed back-to-back after the header with no alignment
//! padding:
//!
//! ```text
//! ┌──────────────┬──────────────┬────────────────┬───────────────┬─────────────┐
//! │ Header (192) │ GLB blob     │ Particles      │ Texture table │ Texture     │
//! │              │              │ (n × 128)      │ (m × 72)      │ blobs       │
//! └──────────────┴──────────────┴────────────────┴───────────────┴─────────────┘
//! ```
//!
//! Texture blob offsets are file-relative.

use crate::error::{FormatError, Result, Section};
use crate::format::{HEADER_SIZE, PARTICLE_RECORD_SIZE, TEXTURE_ENTRY_SIZE};

/// A byte range within a file. Computed in 64-bit so end positions never wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: u64,
    pub len: u64,
}

impl Span {
    pub const fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    pub const fn end(&self) -> u64 {
        self.offset + self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether two spans share at least one byte. Empty spans overlap nothing.
    pub fn overlaps(&self, other: &Span) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.offset < other.end()
            && other.offset < self.end()
    }

    /// Whether the span lies entirely within the first `file_len` bytes
    pub fn fits_within(&self, file_len: u64) -> bool {
        self.end() <= file_len
    }
}

/// Planned positions of every section in an NTSM file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    pub glb: Span,
    /// Always positioned right after the GLB, with zero length when absent
    pub particles: Span,
    /// `None` when the file carries no textures
    pub texture_table: Option<Span>,
    /// One span per texture blob, in table order
    pub texture_blobs: Vec<Span>,
    /// Total file length
    pub total_len: u64,
}

impl SectionLayout {
    /// Plan a layout for the given payload sizes.
    ///
    /// Fails with [`FormatError::SizeOverflow`] when any section would end
    /// beyond what a u32 offset can address.
    pub fn plan(glb_size: usize, particle_count: usize, texture_sizes: &[usize]) -> Result<Self> {
        let glb = Span::new(HEADER_SIZE as u64, glb_size as u64);
        check_u32(Section::Glb, glb)?;

        let particles = Span::new(glb.end(), (particle_count * PARTICLE_RECORD_SIZE) as u64);
        check_u32(Section::Particles, particles)?;

        let (texture_table, texture_blobs, total_len) = if texture_sizes.is_empty() {
            (None, Vec::new(), particles.end())
        } else {
            let table = Span::new(
                particles.end(),
                (texture_sizes.len() * TEXTURE_ENTRY_SIZE) as u64,
            );
            check_u32(Section::TextureTable, table)?;

            let mut cursor = table.end();
            let mut blobs = Vec::with_capacity(texture_sizes.len());
            for (index, &size) in texture_sizes.iter().enumerate() {
                let blob = Span::new(cursor, size as u64);
                check_u32(Section::TextureBlob(index), blob)?;
                blobs.push(blob);
                cursor = blob.end();
            }
            (Some(table), blobs, cursor)
        };

        let layout = Self {
            glb,
            particles,
            texture_table,
            texture_blobs,
            total_len,
        };
        tracing::trace!(?layout, "planned NTSM layout");
        Ok(layout)
    }

    pub fn texture_count(&self) -> u32 {
        self.texture_blobs.len() as u32
    }

    pub fn texture_table_offset(&self) -> u32 {
        self.texture_table.map_or(0, |t| t.offset as u32)
    }
}

fn check_u32(section: Section, span: Span) -> Result<()> {
    if span.end() > u32::MAX as u64 {
        return Err(FormatError::SizeOverflow {
            section,
            size: span.len,
        });
    }
    Ok(())
}
