//! The NTSM container: one header, one GLB blob, optional particle emitters
//! and optional embedded textures.
//!
//! Encoding validates every input and plans the full layout before the first
//! byte is written. Decoding validates the whole file and either returns a
//! complete [`Container`] or an error, never a partial result.

use std::io::Write;

use crate::error::Result;
use crate::format::NTSM_EXT;
use crate::header::NtsmHeader;
use crate::layout::SectionLayout;
use crate::particle::{self, ParticleEmitter};
use crate::texture::{Texture, TextureTableEntry, encode_table};
use crate::validate;
use crate::view::NtsmView;

/// Knobs for decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Require the GLB blob to start with `glTF` (its 12-byte minimum size is always required)
    pub check_glb_magic: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            check_glb_magic: true,
        }
    }
}

/// A complete, owned NTSM file
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        .ntsm file                           │
/// ├─────────────────────────────────────────────────────────────┤
/// │  Header (192 bytes)                                         │
/// │  ├── magic "NTSM", version 1, name[128], flags              │
/// │  └── GLB / particle / texture table offsets and sizes       │
/// ├─────────────────────────────────────────────────────────────┤
/// │  GLB blob (opaque, starts with "glTF")                      │
/// ├─────────────────────────────────────────────────────────────┤
/// │  Particle emitters (n × 128 bytes), if has_particles        │
/// ├─────────────────────────────────────────────────────────────┤
/// │  Texture table (m × 72 bytes), if texture_count > 0         │
/// │  Texture blobs, in table order                              │
/// └─────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Section offsets/sizes are recomputed on every encode
    pub header: NtsmHeader,
    pub glb: Vec<u8>,
    pub emitters: Vec<ParticleEmitter>,
    pub textures: Vec<Texture>,
}

impl Container {
    /// Build a container and plan its header.
    ///
    /// `flags` must include `FLAG_HAS_PARTICLES` exactly when `emitters` is
    /// non-empty. Names are truncated to what their slots can hold.
    pub fn new(
        name: &str,
        flags: u8,
        glb: Vec<u8>,
        emitters: Vec<ParticleEmitter>,
        textures: Vec<Texture>,
    ) -> Result<Self> {
        let mut container = Self {
            header: NtsmHeader::new(name, flags),
            glb,
            emitters,
            textures: textures
                .into_iter()
                .map(|t| Texture::new(&t.name, t.data))
                .collect(),
        };
        let (header, _) = container.plan()?;
        container.header = header;
        Ok(container)
    }

    /// Validate the inputs and compute the header and layout they encode to.
    pub fn plan(&self) -> Result<(NtsmHeader, SectionLayout)> {
        validate::check_encode_inputs(&self.header, &self.glb, &self.emitters, &self.textures)?;

        let texture_sizes: Vec<usize> = self.textures.iter().map(|t| t.data.len()).collect();
        let layout = SectionLayout::plan(self.glb.len(), self.emitters.len(), &texture_sizes)?;

        let mut header = self.header.clone();
        header.apply_layout(&layout);
        validate::check_header(&header, layout.total_len)?;
        Ok((header, layout))
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn has_particles(&self) -> bool {
        self.header.has_particles()
    }

    pub fn find_texture(&self, name: &str) -> Option<&Texture> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// Suggested file name for this container
    pub fn file_name(&self) -> String {
        format!("{}.{NTSM_EXT}", self.header.name)
    }

    /// Encode to a new byte vector
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Encode into `writer`.
    ///
    /// All validation and table encoding happens first, so an invalid
    /// container never produces partial output.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let (header, layout) = self.plan()?;

        let texture_section = if self.textures.is_empty() {
            Vec::new()
        } else {
            let entries: Vec<TextureTableEntry> = self
                .textures
                .iter()
                .zip(&layout.texture_blobs)
                .map(|(t, span)| {
                    TextureTableEntry::new(&t.name, span.len as u32, span.offset as u32)
                })
                .collect();
            let blobs: Vec<&[u8]> = self.textures.iter().map(|t| t.data.as_slice()).collect();
            encode_table(&entries, &blobs, header.texture_table_offset)?
        };
        let particle_section = particle::encode_all(&self.emitters);

        writer.write_all(&header.to_bytes())?;
        writer.write_all(&self.glb)?;
        writer.write_all(&particle_section)?;
        writer.write_all(&texture_section)?;

        tracing::debug!(
            name = %header.name,
            bytes = layout.total_len,
            glb = self.glb.len(),
            emitters = self.emitters.len(),
            textures = self.textures.len(),
            "encoded NTSM container"
        );
        Ok(())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, DecodeOptions::default())
    }

    pub fn decode_with(bytes: &[u8], options: DecodeOptions) -> Result<Self> {
        Ok(NtsmView::parse_with(bytes, options)?.to_container())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{FLAG_ANIMATE_UV, FLAG_HAS_PARTICLES};

    fn glb(len: usize) -> Vec<u8> {
        let mut data: Vec<u8> = (0..len).map(|i| i as u8).collect();
        data[0..4].copy_from_slice(b"glTF");
        data
    }

    #[test]
    fn test_new_plans_header() {
        let container = Container::new(
            "sword",
            FLAG_HAS_PARTICLES,
            glb(1024),
            vec![ParticleEmitter::default()],
            vec![],
        )
        .unwrap();

        let h = &container.header;
        assert_eq!(h.glb_offset, 192);
        assert_eq!(h.glb_size, 1024);
        assert_eq!(h.particle_offset, 1216);
        assert_eq!(h.particle_size, 128);
        assert_eq!(h.texture_count, 0);
        assert_eq!(h.texture_table_offset, 0);
    }

    #[test]
    fn test_roundtrip_all_sections() {
        let emitters = vec![
            ParticleEmitter::default(),
            ParticleEmitter {
                texture_index: 0,
                gravity: -9.81,
                ..ParticleEmitter::default()
            },
        ];
        let textures = vec![
            Texture::new("spark", vec![9; 33]),
            Texture::new("empty", vec![]),
            Texture::new("smoke", vec![7; 5]),
        ];
        let container = Container::new(
            "brazier",
            FLAG_HAS_PARTICLES | FLAG_ANIMATE_UV,
            glb(200),
            emitters,
            textures,
        )
        .unwrap();

        let bytes = container.encode().unwrap();
        assert_eq!(bytes.len(), 192 + 200 + 256 + 3 * 72 + 38);
        assert_eq!(Container::decode(&bytes).unwrap(), container);
    }

    #[test]
    fn test_roundtrip_glb_only() {
        let container = Container::new("rock", 0, glb(12), vec![], vec![]).unwrap();
        let bytes = container.encode().unwrap();
        assert_eq!(bytes.len(), 204);
        assert_eq!(Container::decode(&bytes).unwrap(), container);
    }

    #[test]
    fn test_encode_rejects_claimed_particles_without_emitters() {
        let err = Container::new("x", FLAG_HAS_PARTICLES, glb(64), vec![], vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentFlags);
    }

    #[test]
    fn test_encode_rejects_bad_glb() {
        let err = Container::new("x", 0, b"not a glb at all".to_vec(), vec![], vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidGlbSection);
    }

    #[test]
    fn test_failed_write_produces_no_output() {
        let mut container = Container::new("x", 0, glb(64), vec![], vec![]).unwrap();
        container.emitters.push(ParticleEmitter::default());

        let mut out = Vec::new();
        let err = container.write_to(&mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentFlags);
        assert!(out.is_empty());
    }

    #[test]
    fn test_encode_recomputes_stale_offsets() {
        let mut container = Container::new("x", 0, glb(64), vec![], vec![]).unwrap();
        container.glb = glb(100);
        let decoded = Container::decode(&container.encode().unwrap()).unwrap();
        assert_eq!(decoded.header.glb_size, 100);
        assert_eq!(decoded.header.particle_offset, 292);
    }

    #[test]
    fn test_long_names_truncated() {
        let container = Container::new(
            &"n".repeat(200),
            0,
            glb(16),
            vec![],
            vec![Texture {
                name: "t".repeat(100),
                data: vec![1],
            }],
        )
        .unwrap();
        assert_eq!(container.name().len(), 127);
        assert_eq!(container.textures[0].name.len(), 63);

        let decoded = Container::decode(&container.encode().unwrap()).unwrap();
        assert_eq!(decoded, container);
    }

    #[test]
    fn test_names_cut_at_nul() {
        let container = Container::new(
            "a\0b",
            0,
            glb(12),
            vec![],
            vec![Texture::new("t\0x", vec![1])],
        )
        .unwrap();
        assert_eq!(container.name(), "a");
        assert_eq!(container.textures[0].name, "t");

        let decoded = Container::decode(&container.encode().unwrap()).unwrap();
        assert_eq!(decoded, container);
    }

    #[test]
    fn test_encode_rejects_nul_in_assigned_names() {
        let mut container = Container::new("a", 0, glb(12), vec![], vec![]).unwrap();
        container.header.name = "a\0b".to_string();
        let err = container.encode().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedHeader);

        container.header.name = "a".to_string();
        container.textures.push(Texture {
            name: "t\0x".to_string(),
            data: vec![1],
        });
        let mut out = Vec::new();
        let err = container.write_to(&mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTextureTable);
        assert!(out.is_empty());
    }

    #[test]
    fn test_find_texture() {
        let container = Container::new(
            "x",
            0,
            glb(16),
            vec![],
            vec![Texture::new("a", vec![1]), Texture::new("b", vec![2])],
        )
        .unwrap();
        assert_eq!(container.find_texture("b").unwrap().data, vec![2]);
        assert!(container.find_texture("c").is_none());
        assert_eq!(container.file_name(), "x.ntsm");
    }

    #[test]
    fn test_decode_without_glb_magic_check() {
        let mut bytes = Container::new("x", 0, glb(16), vec![], vec![])
            .unwrap()
            .encode()
            .unwrap();
        bytes[192..196].copy_from_slice(b"XXXX");

        assert_eq!(
            Container::decode(&bytes).unwrap_err().kind(),
            ErrorKind::InvalidGlbSection
        );
        let lenient = DecodeOptions {
            check_glb_magic: false,
        };
        let decoded = Container::decode_with(&bytes, lenient).unwrap();
        assert_eq!(&decoded.glb[0..4], b"XXXX");
    }
}
