//! Structural validation shared by the encoder and the decoders.
//!
//! Checks, in order:
//! 1. Magic bytes are `NTSM`
//! 2. Version is 1
//! 3. The has_particles flag agrees with the particle size
//! 4. The GLB blob holds at least a glTF binary header (and its magic, when checked)
//! 5. A non-empty texture table has a non-zero offset inside the file, and
//!    every entry's blob lies inside the file
//! 6. Header, GLB, particles and texture table (plus blobs) do not overlap and
//!    lie within the file
//! 7. Reserved flag bits are zero (encode only; decode ignores them)

use crate::error::{FormatError, Result, Section};
use crate::format::{
    FLAG_HAS_PARTICLES, FLAG_RESERVED_MASK, GLB_HEADER_SIZE, GLB_MAGIC, HEADER_SIZE, NTSM_MAGIC,
    NTSM_VERSION, PARTICLE_RECORD_SIZE,
};
use crate::header::NtsmHeader;
use crate::layout::Span;
use crate::particle::ParticleEmitter;
use crate::texture::{Texture, TextureTableEntry};

const HEADER_SPAN: Span = Span::new(0, HEADER_SIZE as u64);

/// Checks that need nothing but the header itself.
pub fn check_header_fields(header: &NtsmHeader) -> Result<()> {
    if &header.magic != NTSM_MAGIC {
        return Err(FormatError::MalformedHeader(format!(
            "bad magic {:?} (expected \"NTSM\")",
            String::from_utf8_lossy(&header.magic)
        )));
    }

    if header.version != NTSM_VERSION {
        return Err(FormatError::UnsupportedVersion(header.version));
    }

    if header.has_particles() {
        if header.particle_size == 0 {
            return Err(inconsistent(
                header,
                "has_particles is set but the particle section is empty",
            ));
        }
        if header.particle_size as usize % PARTICLE_RECORD_SIZE != 0 {
            return Err(inconsistent(
                header,
                "particle size is not a multiple of the 128-byte record size",
            ));
        }
    }

    if (header.glb_size as usize) < GLB_HEADER_SIZE {
        return Err(FormatError::InvalidGlbSection(format!(
            "{} bytes is smaller than the {GLB_HEADER_SIZE}-byte glTF binary header",
            header.glb_size
        )));
    }

    if header.texture_count > 0 && header.texture_table_offset == 0 {
        return Err(FormatError::InvalidTextureTable(format!(
            "{} textures declared with a zero table offset",
            header.texture_count
        )));
    }

    Ok(())
}

/// Full header check against the total file length.
///
/// A clear has_particles flag means the particle fields are ignored entirely,
/// whatever size they declare.
pub fn check_header(header: &NtsmHeader, file_len: u64) -> Result<()> {
    check_header_fields(header)?;

    let mut placed: Vec<(Section, Span)> = Vec::with_capacity(4);
    placed.push((Section::Header, HEADER_SPAN));

    place(&mut placed, Section::Glb, header.glb_span(), file_len)?;

    if header.has_particles() {
        place(&mut placed, Section::Particles, header.particle_span(), file_len)?;
    }

    if header.texture_count > 0 {
        let table = header.texture_table_span();
        if table.offset >= file_len {
            return Err(FormatError::InvalidTextureTable(format!(
                "table offset {} is outside the file ({file_len} bytes)",
                table.offset
            )));
        }
        place(&mut placed, Section::TextureTable, table, file_len)?;
    }

    Ok(())
}

/// Check a GLB blob. The size minimum always applies; the magic only when asked.
pub fn check_glb(glb: &[u8], check_magic: bool) -> Result<()> {
    if glb.len() < GLB_HEADER_SIZE {
        return Err(FormatError::InvalidGlbSection(format!(
            "{} bytes is smaller than the {GLB_HEADER_SIZE}-byte glTF binary header",
            glb.len()
        )));
    }
    if check_magic && &glb[0..4] != GLB_MAGIC {
        return Err(FormatError::InvalidGlbSection(format!(
            "bad magic {:?} (expected \"glTF\")",
            String::from_utf8_lossy(&glb[0..4])
        )));
    }
    Ok(())
}

/// Check that every texture blob stays clear of the other sections.
///
/// Entries are assumed to have passed [`crate::texture::decode_table`], so they
/// already fit inside the file. Blobs may overlap each other.
pub fn check_texture_blobs(header: &NtsmHeader, entries: &[TextureTableEntry]) -> Result<()> {
    let mut others = vec![
        (Section::Header, HEADER_SPAN),
        (Section::Glb, header.glb_span()),
        (Section::TextureTable, header.texture_table_span()),
    ];
    if header.has_particles() {
        others.push((Section::Particles, header.particle_span()));
    }

    for (index, entry) in entries.iter().enumerate() {
        let blob = entry.span();
        if let Some((section, _)) = others.iter().find(|(_, span)| span.overlaps(&blob)) {
            return Err(FormatError::SectionOverlap {
                first: Section::TextureBlob(index),
                second: *section,
            });
        }
    }
    Ok(())
}

/// Reject inconsistent encoder inputs before any layout is planned.
pub fn check_encode_inputs(
    header: &NtsmHeader,
    glb: &[u8],
    emitters: &[ParticleEmitter],
    textures: &[Texture],
) -> Result<()> {
    if &header.magic != NTSM_MAGIC {
        return Err(FormatError::MalformedHeader(format!(
            "bad magic {:?} (expected \"NTSM\")",
            String::from_utf8_lossy(&header.magic)
        )));
    }
    if header.version != NTSM_VERSION {
        return Err(FormatError::UnsupportedVersion(header.version));
    }
    if header.flags & FLAG_RESERVED_MASK != 0 {
        return Err(inconsistent(header, "reserved flag bits 4-7 must be zero"));
    }

    let has_particles = header.flags & FLAG_HAS_PARTICLES != 0;
    if has_particles && emitters.is_empty() {
        return Err(inconsistent(header, "has_particles is set but no emitters were supplied"));
    }
    if !has_particles && !emitters.is_empty() {
        return Err(inconsistent(
            header,
            "emitters were supplied but has_particles is clear",
        ));
    }

    if header.name.contains('\0') {
        return Err(FormatError::MalformedHeader(format!(
            "name {:?} contains a NUL byte",
            header.name
        )));
    }

    check_glb(glb, true)?;

    for (index, texture) in textures.iter().enumerate() {
        if texture.name.contains('\0') {
            return Err(FormatError::InvalidTextureTable(format!(
                "texture #{index} name {:?} contains a NUL byte",
                texture.name
            )));
        }
    }
    if textures.len() > u32::MAX as usize {
        return Err(FormatError::InvalidTextureTable(format!(
            "{} textures exceed the u32 texture count",
            textures.len()
        )));
    }

    Ok(())
}

fn inconsistent(header: &NtsmHeader, reason: &'static str) -> FormatError {
    FormatError::InconsistentFlags {
        flags: header.flags,
        particle_size: header.particle_size,
        reason,
    }
}

/// Record `span` as `section` after checking it fits the file and overlaps
/// nothing placed before it.
fn place(
    placed: &mut Vec<(Section, Span)>,
    section: Section,
    span: Span,
    file_len: u64,
) -> Result<()> {
    if let Some((other, _)) = placed.iter().find(|(_, s)| s.overlaps(&span)) {
        return Err(FormatError::SectionOverlap {
            first: *other,
            second: section,
        });
    }
    if !span.fits_within(file_len) {
        return Err(FormatError::TruncatedSection {
            section,
            offset: span.offset,
            size: span.len,
            available: file_len.saturating_sub(span.offset),
        });
    }
    placed.push((section, span));
    Ok(())
}
