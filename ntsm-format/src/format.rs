//! NTSM format constants.
//!
//! Single source of truth for magic bytes, record sizes and flag bits.
//! Every multi-byte value in the format is little-endian.

/// File extension for NTSM containers (without dot)
pub const NTSM_EXT: &str = "ntsm";

/// Magic bytes at offset 0 of every NTSM file
pub const NTSM_MAGIC: &[u8; 4] = b"NTSM";

/// The only format version this crate reads and writes
pub const NTSM_VERSION: u32 = 1;

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 192;

/// Size of the name slot in the header (including the terminating NUL)
pub const HEADER_NAME_SIZE: usize = 128;

/// Size of one particle emitter record
pub const PARTICLE_RECORD_SIZE: usize = 128;

/// Size of one texture table entry (name[64] + size u32 + offset u32)
pub const TEXTURE_ENTRY_SIZE: usize = 72;

/// Size of the name slot in a texture table entry (including the terminating NUL)
pub const TEXTURE_NAME_SIZE: usize = 64;

/// Minimum size of a GLB blob (the 12-byte glTF binary header)
pub const GLB_HEADER_SIZE: usize = 12;

/// Magic bytes at the start of a GLB blob
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

// =============================================================================
// Header Flags
// =============================================================================

/// Flag: particle emitter section is present
pub const FLAG_HAS_PARTICLES: u8 = 1;
/// Flag: emitters are positioned in world space (clear = local space)
pub const FLAG_WORLD_SPACE: u8 = 2;
/// Flag: mesh UVs are animated
pub const FLAG_ANIMATE_UV: u8 = 4;
/// Flag: mesh participates in collision
pub const FLAG_COLLISION: u8 = 8;

/// All defined flags combined
pub const FLAG_ALL: u8 = FLAG_HAS_PARTICLES | FLAG_WORLD_SPACE | FLAG_ANIMATE_UV | FLAG_COLLISION;

/// Bits 4-7 are reserved and must be zero when writing
pub const FLAG_RESERVED_MASK: u8 = !FLAG_ALL;

/// Look up a flag bit by its manifest name.
///
/// `has_particles` is deliberately absent: it is derived from the emitter list.
pub fn flag_from_name(name: &str) -> Option<u8> {
    match name {
        "world_space" => Some(FLAG_WORLD_SPACE),
        "animate_uv" => Some(FLAG_ANIMATE_UV),
        "collision" => Some(FLAG_COLLISION),
        _ => None,
    }
}

/// Human-readable names of the flags set in `flags` (reserved bits are skipped)
pub fn flag_names(flags: u8) -> Vec<&'static str> {
    [
        (FLAG_HAS_PARTICLES, "has_particles"),
        (FLAG_WORLD_SPACE, "world_space"),
        (FLAG_ANIMATE_UV, "animate_uv"),
        (FLAG_COLLISION, "collision"),
    ]
    .into_iter()
    .filter(|(bit, _)| flags & bit != 0)
    .map(|(_, name)| name)
    .collect()
}
