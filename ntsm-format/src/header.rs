//! NTSM header (192 bytes, fixed)
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 4] = "NTSM"
//! 0x04: version u32 (must be 1)
//! 0x08: name [u8; 128] (UTF-8, NUL-padded, at most 127 bytes of text)
//! 0x88: flags u8
//! 0x89: reserved (3 bytes, zero)
//! 0x8C: glb_offset u32
//! 0x90: glb_size u32
//! 0x94: particle_offset u32
//! 0x98: particle_size u32
//! 0x9C: texture_count u32
//! 0xA0: texture_table_offset u32
//! 0xA4: reserved (28 bytes, zero)
//! ```
//!
//! Parsing here is purely structural. Magic, version and flag consistency are
//! checked by [`crate::validate`].

use crate::bytes::{get_name, get_u32, put_name, put_u32, truncate_name};
use crate::error::{FormatError, Result};
use crate::format::{
    FLAG_ANIMATE_UV, FLAG_COLLISION, FLAG_HAS_PARTICLES, FLAG_WORLD_SPACE, HEADER_NAME_SIZE,
    HEADER_SIZE, NTSM_MAGIC, NTSM_VERSION, PARTICLE_RECORD_SIZE,
};
use crate::layout::{SectionLayout, Span};

const OFF_MAGIC: usize = 0;
const OFF_VERSION: usize = 4;
const OFF_NAME: usize = 8;
const OFF_FLAGS: usize = 136;
const OFF_GLB_OFFSET: usize = 140;
const OFF_GLB_SIZE: usize = 144;
const OFF_PARTICLE_OFFSET: usize = 148;
const OFF_PARTICLE_SIZE: usize = 152;
const OFF_TEXTURE_COUNT: usize = 156;
const OFF_TEXTURE_TABLE_OFFSET: usize = 160;

/// Decoded NTSM header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtsmHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Asset identifier (at most 127 bytes once written)
    pub name: String,
    /// Bitfield of `FLAG_*` values
    pub flags: u8,
    pub glb_offset: u32,
    pub glb_size: u32,
    pub particle_offset: u32,
    pub particle_size: u32,
    pub texture_count: u32,
    /// File-relative offset of the texture table (0 when there are no textures)
    pub texture_table_offset: u32,
}

impl NtsmHeader {
    pub const SIZE: usize = HEADER_SIZE;

    /// Create a header with the current magic/version and no sections.
    ///
    /// The name is truncated to what the 128-byte slot can hold.
    pub fn new(name: &str, flags: u8) -> Self {
        Self {
            magic: *NTSM_MAGIC,
            version: NTSM_VERSION,
            name: truncate_name(name, HEADER_NAME_SIZE - 1).to_string(),
            flags,
            glb_offset: 0,
            glb_size: 0,
            particle_offset: 0,
            particle_size: 0,
            texture_count: 0,
            texture_table_offset: 0,
        }
    }

    /// Copy section offsets and sizes from a planned layout
    pub fn apply_layout(&mut self, layout: &SectionLayout) {
        self.glb_offset = layout.glb.offset as u32;
        self.glb_size = layout.glb.len as u32;
        self.particle_offset = layout.particles.offset as u32;
        self.particle_size = layout.particles.len as u32;
        self.texture_count = layout.texture_count();
        self.texture_table_offset = layout.texture_table_offset();
    }

    pub fn has_particles(&self) -> bool {
        self.flags & FLAG_HAS_PARTICLES != 0
    }

    pub fn world_space(&self) -> bool {
        self.flags & FLAG_WORLD_SPACE != 0
    }

    pub fn animate_uv(&self) -> bool {
        self.flags & FLAG_ANIMATE_UV != 0
    }

    pub fn collision(&self) -> bool {
        self.flags & FLAG_COLLISION != 0
    }

    /// Number of whole emitter records the particle section declares
    pub fn particle_count(&self) -> usize {
        self.particle_size as usize / PARTICLE_RECORD_SIZE
    }

    pub fn glb_span(&self) -> Span {
        Span::new(self.glb_offset as u64, self.glb_size as u64)
    }

    pub fn particle_span(&self) -> Span {
        Span::new(self.particle_offset as u64, self.particle_size as u64)
    }

    /// Span of the texture table entries (blobs excluded)
    pub fn texture_table_span(&self) -> Span {
        Span::new(
            self.texture_table_offset as u64,
            self.texture_count as u64 * crate::format::TEXTURE_ENTRY_SIZE as u64,
        )
    }

    /// Write header to bytes. Reserved bytes are always zero.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[OFF_MAGIC..OFF_MAGIC + 4].copy_from_slice(&self.magic);
        put_u32(&mut bytes, OFF_VERSION, self.version);
        put_name(&mut bytes, OFF_NAME, HEADER_NAME_SIZE, &self.name);
        bytes[OFF_FLAGS] = self.flags;
        put_u32(&mut bytes, OFF_GLB_OFFSET, self.glb_offset);
        put_u32(&mut bytes, OFF_GLB_SIZE, self.glb_size);
        put_u32(&mut bytes, OFF_PARTICLE_OFFSET, self.particle_offset);
        put_u32(&mut bytes, OFF_PARTICLE_SIZE, self.particle_size);
        put_u32(&mut bytes, OFF_TEXTURE_COUNT, self.texture_count);
        put_u32(&mut bytes, OFF_TEXTURE_TABLE_OFFSET, self.texture_table_offset);
        bytes
    }

    /// Read header from bytes.
    ///
    /// Fails only when fewer than 192 bytes are available. Reserved bytes are
    /// skipped without being interpreted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(FormatError::MalformedHeader(format!(
                "need {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }
        Ok(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: get_u32(bytes, OFF_VERSION),
            name: get_name(bytes, OFF_NAME, HEADER_NAME_SIZE),
            flags: bytes[OFF_FLAGS],
            glb_offset: get_u32(bytes, OFF_GLB_OFFSET),
            glb_size: get_u32(bytes, OFF_GLB_SIZE),
            particle_offset: get_u32(bytes, OFF_PARTICLE_OFFSET),
            particle_size: get_u32(bytes, OFF_PARTICLE_SIZE),
            texture_count: get_u32(bytes, OFF_TEXTURE_COUNT),
            texture_table_offset: get_u32(bytes, OFF_TEXTURE_TABLE_OFFSET),
        })
    }
}
