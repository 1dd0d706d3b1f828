//! Zero-copy decoding of an in-memory NTSM file.
//!
//! [`NtsmView::parse`] validates the whole file up front, then hands out
//! borrowed slices. Emitters and texture blobs are only decoded or sliced when
//! asked for.

use std::iter::FusedIterator;

use crate::container::{Container, DecodeOptions};
use crate::error::Result;
use crate::format::PARTICLE_RECORD_SIZE;
use crate::header::NtsmHeader;
use crate::layout::Span;
use crate::particle::ParticleEmitter;
use crate::texture::{Texture, TextureTableEntry, decode_table};
use crate::validate;

/// A validated NTSM file borrowed from a byte slice
#[derive(Debug, Clone)]
pub struct NtsmView<'a> {
    bytes: &'a [u8],
    header: NtsmHeader,
    texture_entries: Vec<TextureTableEntry>,
}

impl<'a> NtsmView<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        Self::parse_with(bytes, DecodeOptions::default())
    }

    /// Parse and validate every section; nothing is returned on failure.
    pub fn parse_with(bytes: &'a [u8], options: DecodeOptions) -> Result<Self> {
        let file_len = bytes.len() as u64;
        let header = NtsmHeader::from_bytes(bytes)?;
        validate::check_header(&header, file_len)?;
        validate::check_glb(slice(bytes, header.glb_span()), options.check_glb_magic)?;

        let texture_entries = if header.texture_count > 0 {
            let table_span = header.texture_table_span();
            let entries = decode_table(
                slice(bytes, table_span),
                header.texture_count,
                table_span.offset,
                file_len,
            )?;
            validate::check_texture_blobs(&header, &entries)?;
            entries
        } else {
            Vec::new()
        };

        tracing::debug!(
            name = %header.name,
            flags = header.flags,
            glb_size = header.glb_size,
            emitters = if header.has_particles() { header.particle_count() } else { 0 },
            textures = texture_entries.len(),
            "parsed NTSM file"
        );

        Ok(Self {
            bytes,
            header,
            texture_entries,
        })
    }

    pub fn header(&self) -> &NtsmHeader {
        &self.header
    }

    pub fn glb(&self) -> &'a [u8] {
        slice(self.bytes, self.header.glb_span())
    }

    /// Number of emitter records (0 whenever has_particles is clear)
    pub fn emitter_count(&self) -> usize {
        if self.header.has_particles() {
            self.header.particle_count()
        } else {
            0
        }
    }

    /// Decode emitters lazily, in file order.
    pub fn emitters(&self) -> impl ExactSizeIterator<Item = ParticleEmitter> + 'a {
        let region = if self.header.has_particles() {
            slice(self.bytes, self.header.particle_span())
        } else {
            &[]
        };
        region
            .chunks_exact(PARTICLE_RECORD_SIZE)
            .map(ParticleEmitter::from_record)
    }

    pub fn texture_entries(&self) -> &[TextureTableEntry] {
        &self.texture_entries
    }

    /// Blob for the texture at `index` in table order
    pub fn texture(&self, index: usize) -> Option<&'a [u8]> {
        self.texture_entries
            .get(index)
            .map(|entry| slice(self.bytes, entry.span()))
    }

    /// First texture whose name matches
    pub fn find_texture(&self, name: &str) -> Option<(&TextureTableEntry, &'a [u8])> {
        self.textures().find(|(entry, _)| entry.name == name)
    }

    /// Iterate `(entry, blob)` pairs in table order. Call again to restart.
    pub fn textures(&self) -> Textures<'_, 'a> {
        Textures {
            view: self,
            index: 0,
        }
    }

    /// Copy every section into an owning [`Container`]
    pub fn to_container(&self) -> Container {
        Container {
            header: self.header.clone(),
            glb: self.glb().to_vec(),
            emitters: self.emitters().collect(),
            textures: self
                .textures()
                .map(|(entry, blob)| Texture {
                    name: entry.name.clone(),
                    data: blob.to_vec(),
                })
                .collect(),
        }
    }
}

/// Lazy iterator over texture table entries and their blobs
#[derive(Debug, Clone)]
pub struct Textures<'v, 'a> {
    view: &'v NtsmView<'a>,
    index: usize,
}

impl<'v, 'a> Iterator for Textures<'v, 'a> {
    type Item = (&'v TextureTableEntry, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.view.texture_entries.get(self.index)?;
        self.index += 1;
        Some((entry, slice(self.view.bytes, entry.span())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.texture_entries.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Textures<'_, '_> {}

impl FusedIterator for Textures<'_, '_> {}

/// Slice a span that validation has already proven to be in bounds
fn slice(bytes: &[u8], span: Span) -> &[u8] {
    &bytes[span.offset as usize..span.end() as usize]
}
